//! Boundary to the remote configuration service.
//!
//! Every call blocks until the service answers. Failures come back as `Err`;
//! the editor decides what (if anything) to do with them.

use crate::error::Result;
use crate::tree::{ConfigurationTree, Value};

pub mod http;

pub use http::HttpConfigService;

pub trait ConfigService {
    /// Token attached to every later call once the session is unlocked.
    fn authorize(&mut self, _token: &str) {}

    fn fetch_tree(&self) -> Result<ConfigurationTree>;

    fn get_value(&self, module: &str, base: &str, key: &str) -> Result<Value>;

    /// `value_json` is the JSON encoding of the value to store.
    fn set_value(&self, module: &str, base: &str, key: &str, value_json: &str) -> Result<()>;

    fn create_base(&self, module: &str, base: &str) -> Result<()>;

    fn delete_base(&self, module: &str, base: &str) -> Result<()>;

    fn check_password(&self, password: &str) -> Result<bool>;

    fn reload_dashboard(&self) -> Result<()>;

    fn reload_system(&self) -> Result<()>;

    fn reconnect_network(&self) -> Result<()>;
}
