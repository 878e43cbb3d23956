use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use silvertree_settings::client::{ConfigService, HttpConfigService};
use silvertree_settings::config::ServiceSettings;
use silvertree_settings::tree::Value;

#[derive(Debug, Clone)]
struct Seen {
    target: String,
    auth: Option<String>,
}

struct Fixture {
    base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Fixture {
    fn targets(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.target.clone())
            .collect()
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().expect("a request")
    }

    fn client(&self) -> HttpConfigService {
        HttpConfigService::new(&ServiceSettings {
            base_url: format!("{}/", self.base_url),
            installation: "settings".into(),
            timeout: Duration::from_secs(5),
        })
        .expect("client")
    }
}

fn route(target: &str) -> (u16, String) {
    let path = target.split('?').next().unwrap_or_default();
    match path {
        "/config_all" => (
            200,
            r#"{"wifi":{"home":{"name":"home"}},"clock":{"face":{"size":3,"on":true}}}"#.into(),
        ),
        "/config_get" => (200, "\"Europe/Berlin\"".into()),
        "/check_password" if target.ends_with("password=good") => (200, "true".into()),
        "/check_password" => (200, "false".into()),
        "/config_delete_base" => (500, "boom".into()),
        _ => (200, String::new()),
    }
}

fn serve() -> Fixture {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind fixture");
    let addr = listener.local_addr().expect("local addr");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            handle(stream, &log);
        }
    });
    Fixture {
        base_url: format!("http://{addr}"),
        seen,
    }
}

fn handle(mut stream: TcpStream, log: &Mutex<Vec<Seen>>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let target = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or_default()
        .to_string();
    let mut auth = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("authorization") {
                auth = Some(value.trim().to_string());
            }
        }
    }

    let (status, body) = route(&target);
    log.lock().unwrap().push(Seen { target, auth });
    let reason = if status == 200 { "OK" } else { "Internal Server Error" };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[test]
fn fetch_tree_keeps_order_and_sends_no_token_before_unlock() {
    let fx = serve();
    let client = fx.client();
    let tree = client.fetch_tree().expect("tree");
    let modules: Vec<_> = tree.keys().cloned().collect();
    assert_eq!(modules, vec!["wifi", "clock"]);
    assert_eq!(tree["clock"]["face"]["size"], Value::Int(3));
    assert_eq!(tree["clock"]["face"]["on"], Value::Bool(true));

    let seen = fx.last();
    assert_eq!(seen.target, "/config_all");
    assert!(seen.auth.is_none());
}

#[test]
fn set_value_encodes_query_and_sends_bearer_token() {
    let fx = serve();
    let mut client = fx.client();
    client.authorize("s3cret");
    client
        .set_value("wifi", "My Net", "name", &Value::from("My Net").to_wire())
        .expect("set");
    let seen = fx.last();
    assert_eq!(
        seen.target,
        "/config_set?uuid=wifi&base=My+Net&key=name&value=%22My+Net%22"
    );
    assert_eq!(seen.auth.as_deref(), Some("Bearer s3cret"));
}

#[test]
fn non_success_status_is_an_error() {
    let fx = serve();
    let err = fx
        .client()
        .delete_base("wifi", "home")
        .expect_err("500 must fail");
    assert!(err.message().contains("config_delete_base failed with status 500"));
}

#[test]
fn password_check_reads_json_bool() {
    let fx = serve();
    let client = fx.client();
    assert!(client.check_password("good").expect("check"));
    assert!(!client.check_password("bad").expect("check"));
    assert_eq!(
        fx.targets(),
        vec!["/check_password?password=good", "/check_password?password=bad"]
    );
}

#[test]
fn own_value_uses_installation_id() {
    let fx = serve();
    let v = fx.client().get_own_value("clock", "tz").expect("value");
    assert_eq!(v, Value::from("Europe/Berlin"));
    assert_eq!(fx.last().target, "/config_get?uuid=settings&base=clock&key=tz");
}

#[test]
fn triggers_hit_their_routes() {
    let fx = serve();
    let client = fx.client();
    client.reconnect_network().expect("reconnect");
    client.reload_system().expect("system");
    client.reload_dashboard().expect("dashboard");
    client.create_base("widgets", "clock2").expect("create");
    assert_eq!(
        fx.targets(),
        vec![
            "/trigger_reconnect_network",
            "/trigger_reload_system",
            "/trigger_reload_dashboard",
            "/config_create_base?uuid=widgets&base=clock2",
        ]
    );
}

#[test]
fn unreachable_service_is_an_error() {
    let port = TcpListener::bind("127.0.0.1:0")
        .expect("bind free port")
        .local_addr()
        .expect("local addr")
        .port();
    let client = HttpConfigService::new(&ServiceSettings {
        base_url: format!("http://127.0.0.1:{port}"),
        installation: "settings".into(),
        timeout: Duration::from_secs(2),
    })
    .expect("client");
    let err = client.fetch_tree().expect_err("connection refused");
    assert!(err.message().starts_with("config_all request failed"));
}
