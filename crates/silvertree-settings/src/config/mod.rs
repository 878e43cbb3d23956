use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:1337";
pub const DEFAULT_INSTALLATION: &str = "settings";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_installation() -> String {
    DEFAULT_INSTALLATION.into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_log_filter() -> String {
    "info".into()
}

/// `[service]` table of the client config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub base_url_env: Option<String>,
    #[serde(default = "default_installation")]
    pub installation: String,
    pub installation_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            base_url_env: None,
            installation: default_installation(),
            installation_env: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    pub json: bool,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

/// Service endpoint after env references are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub base_url: String,
    pub installation: String,
    pub timeout: Duration,
}

impl ServiceConfig {
    pub fn resolve(&self) -> Result<ServiceSettings> {
        let base_url = resolve_required_string_field(
            "service.base_url",
            Some(self.base_url.as_str()),
            self.base_url_env.as_deref(),
        )?;
        let installation = resolve_required_string_field(
            "service.installation",
            Some(self.installation.as_str()),
            self.installation_env.as_deref(),
        )?;
        if self.timeout_secs == 0 {
            return Err(Error::msg("service.timeout_secs must be greater than 0"));
        }
        Ok(ServiceSettings {
            base_url,
            installation,
            timeout: Duration::from_secs(self.timeout_secs),
        })
    }
}

pub fn load(path: &Path) -> Result<ClientConfig> {
    let data = fs::read_to_string(path)
        .map_err(|e| Error::msg(format!("failed to read config {}: {e}", path.display())))?;
    parse(&data).map_err(|e| Error::msg(format!("{} ({})", e, path.display())))
}

pub fn parse(data: &str) -> Result<ClientConfig> {
    toml::from_str(data).map_err(|e| Error::msg(format!("TOML parse error: {e}")))
}

/// Missing path means defaults; a path that was given must load.
pub fn load_or_default(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(p) => load(p),
        None => Ok(ClientConfig::default()),
    }
}

fn resolve_env_ref(env_key: Option<&str>) -> Option<String> {
    let key = env_key?.trim();
    if key.is_empty() {
        return None;
    }
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// An env reference wins over the literal when it is set and non-empty.
fn resolve_string_field(literal: Option<&str>, env_key: Option<&str>) -> Option<String> {
    resolve_env_ref(env_key).or_else(|| {
        literal
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

fn resolve_required_string_field(
    cfg_path: &str,
    literal: Option<&str>,
    env_key: Option<&str>,
) -> Result<String> {
    resolve_string_field(literal, env_key).ok_or_else(|| {
        if let Some(k) = env_key {
            Error::msg(format!("{cfg_path} is empty and env '{k}' is not set"))
        } else {
            Error::msg(format!("{cfg_path} is empty"))
        }
    })
}
