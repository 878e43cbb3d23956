use reqwest::Url;
use reqwest::blocking::{Client, Response};
use tracing::debug;

use crate::config::ServiceSettings;
use crate::error::{Error, Result};
use crate::tree::{self, ConfigurationTree, Value};

use super::ConfigService;

/// Blocking HTTP client for the Silvertree configuration endpoints.
pub struct HttpConfigService {
    client: Client,
    base_url: String,
    installation: String,
    token: Option<String>,
}

impl HttpConfigService {
    pub fn new(settings: &ServiceSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::msg(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            installation: settings.installation.clone(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn installation(&self) -> &str {
        &self.installation
    }

    /// Looks up a key of this installation's own module.
    pub fn get_own_value(&self, base: &str, key: &str) -> Result<Value> {
        self.get_value(&self.installation, base, key)
    }

    fn url(&self, route: &str, params: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, route);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| Error::msg(format!("invalid service URL '{raw}': {e}")))
    }

    fn get(&self, route: &str, params: &[(&str, &str)]) -> Result<Response> {
        let url = self.url(route, params)?;
        debug!(route, "service request");
        let mut req = self.client.get(url);
        if let Some(t) = self.token.as_deref() {
            req = req.bearer_auth(t);
        }
        let res = req
            .send()
            .map_err(|e| Error::msg(format!("{route} request failed: {e}")))?;
        if res.status().is_success() {
            return Ok(res);
        }
        Err(Error::msg(format!(
            "{route} failed with status {}",
            res.status()
        )))
    }

    fn get_text(&self, route: &str, params: &[(&str, &str)]) -> Result<String> {
        self.get(route, params)?
            .text()
            .map_err(|e| Error::msg(format!("{route} body read failed: {e}")))
    }
}

impl ConfigService for HttpConfigService {
    fn authorize(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn fetch_tree(&self) -> Result<ConfigurationTree> {
        let body = self.get_text("config_all", &[])?;
        tree::parse_tree(&body)
    }

    fn get_value(&self, module: &str, base: &str, key: &str) -> Result<Value> {
        let body = self.get_text(
            "config_get",
            &[("uuid", module), ("base", base), ("key", key)],
        )?;
        serde_json::from_str(&body)
            .map_err(|e| Error::msg(format!("invalid value for {module}/{base}/{key}: {e}")))
    }

    fn set_value(&self, module: &str, base: &str, key: &str, value_json: &str) -> Result<()> {
        self.get(
            "config_set",
            &[
                ("uuid", module),
                ("base", base),
                ("key", key),
                ("value", value_json),
            ],
        )?;
        Ok(())
    }

    fn create_base(&self, module: &str, base: &str) -> Result<()> {
        self.get("config_create_base", &[("uuid", module), ("base", base)])?;
        Ok(())
    }

    fn delete_base(&self, module: &str, base: &str) -> Result<()> {
        self.get("config_delete_base", &[("uuid", module), ("base", base)])?;
        Ok(())
    }

    fn check_password(&self, password: &str) -> Result<bool> {
        let body = self.get_text("check_password", &[("password", password)])?;
        let ok: serde_json::Value = serde_json::from_str(body.trim())?;
        Ok(ok.as_bool().unwrap_or(false))
    }

    fn reload_dashboard(&self) -> Result<()> {
        self.get("trigger_reload_dashboard", &[])?;
        Ok(())
    }

    fn reload_system(&self) -> Result<()> {
        self.get("trigger_reload_system", &[])?;
        Ok(())
    }

    fn reconnect_network(&self) -> Result<()> {
        self.get("trigger_reconnect_network", &[])?;
        Ok(())
    }
}
