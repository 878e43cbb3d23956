use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use silvertree_settings::client::{ConfigService, HttpConfigService};
use silvertree_settings::config::{self, ClientConfig, ServiceSettings};
use silvertree_settings::editor::Editor;
use silvertree_settings::session::ESCALATION_THRESHOLD;
use silvertree_settings::{Error, Result};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Client config TOML
    #[arg(long, global = true, env = "SILVERTREE_CONFIG")]
    config: Option<PathBuf>,
    /// Configuration service base URL (overrides the config file)
    #[arg(long, global = true, env = "SILVERTREE_SERVER")]
    server: Option<String>,
    /// Installation identifier used for this device's own values
    #[arg(long, global = true, env = "SILVERTREE_INSTALLATION")]
    installation: Option<String>,
    /// Append logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive terminal editor
    Tui,
    /// Unlock, render the current tree and print its outline
    Dump {
        #[arg(long, env = "SILVERTREE_PASSWORD")]
        password: String,
        /// Apply the hidden elevation gesture before unlocking
        #[arg(long)]
        escalate: bool,
    },
    /// Print one stored value as JSON
    Get {
        module: String,
        base: String,
        key: String,
        #[arg(long, env = "SILVERTREE_PASSWORD")]
        password: Option<String>,
    },
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let cfg = config::load_or_default(args.config.as_deref())?;

    let log_file = args
        .log_file
        .clone()
        .or_else(|| cfg.logging.file.as_ref().map(PathBuf::from));
    let log_json = args.log_json || cfg.logging.json;
    // The TUI owns the terminal: without a log file its logs are dropped.
    let to_stderr = !matches!(args.cmd, Command::Tui);
    init_logging(&cfg.logging.filter, log_json, log_file.as_deref(), to_stderr)?;

    let settings = service_settings(&cfg, &args)?;
    match args.cmd {
        Command::Tui => silvertree_settings::ui::run_tui(&settings),
        Command::Dump { password, escalate } => cmd_dump(&settings, &password, escalate),
        Command::Get {
            module,
            base,
            key,
            password,
        } => cmd_get(&settings, &module, &base, &key, password.as_deref()),
    }
}

fn service_settings(cfg: &ClientConfig, args: &Args) -> Result<ServiceSettings> {
    let mut settings = cfg.service.resolve()?;
    if let Some(server) = args.server.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        settings.base_url = server.to_string();
    }
    if let Some(inst) = args
        .installation
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        settings.installation = inst.to_string();
    }
    Ok(settings)
}

fn init_logging(filter: &str, json: bool, file: Option<&Path>, to_stderr: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    match file {
        Some(path) => {
            let f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| Error::msg(format!("open log file {}: {e}", path.display())))?;
            let writer = Mutex::new(f);
            if json {
                builder.json().with_writer(writer).init();
            } else {
                builder.with_ansi(false).with_writer(writer).init();
            }
        }
        None if !to_stderr => {}
        None => {
            if json {
                builder.json().with_writer(io::stderr).init();
            } else {
                builder.with_writer(io::stderr).init();
            }
        }
    }
    Ok(())
}

fn cmd_dump(settings: &ServiceSettings, password: &str, escalate: bool) -> Result<()> {
    let mut editor = Editor::new(HttpConfigService::new(settings)?);
    if escalate {
        for _ in 0..ESCALATION_THRESHOLD {
            editor.escalation_gesture();
        }
    }
    if !editor.submit_password(password) {
        return Err(first_failure(&mut editor).unwrap_or_else(|| Error::msg("password rejected")));
    }
    if let Some(e) = first_failure(&mut editor) {
        return Err(e);
    }
    print!("{}", editor.view().outline());
    Ok(())
}

fn cmd_get(
    settings: &ServiceSettings,
    module: &str,
    base: &str,
    key: &str,
    password: Option<&str>,
) -> Result<()> {
    let mut service = HttpConfigService::new(settings)?;
    if let Some(pw) = password {
        service.authorize(pw);
    }
    let value = service.get_value(module, base, key)?;
    println!("{}", value.to_wire());
    Ok(())
}

fn first_failure<S: ConfigService>(editor: &mut Editor<S>) -> Option<Error> {
    editor
        .take_failures()
        .into_iter()
        .next()
        .map(|f| Error::msg(format!("{}: {}", f.operation, f.error)))
}
