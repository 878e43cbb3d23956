//! Configuration tree as served by the remote store.
//!
//! All three levels are insertion-ordered maps: the order the service sends is
//! the order the editor shows, with no re-sorting anywhere in between.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved base name holding a module's structural metadata.
pub const BUNDLE_BASE: &str = "bundle";

/// Modules whose bases end users may add and delete.
pub const USER_CUSTOMIZABLE_MODULES: [&str; 2] = ["widgets", "wifi"];

pub const WIDGETS_MODULE: &str = "widgets";
pub const WIFI_MODULE: &str = "wifi";

pub type BaseConfig = IndexMap<String, Value>;
pub type ModuleConfig = IndexMap<String, BaseConfig>;
pub type ConfigurationTree = IndexMap<String, ModuleConfig>;

pub fn is_user_customizable(module: &str) -> bool {
    USER_CUSTOMIZABLE_MODULES.contains(&module)
}

/// A single configuration value.
///
/// The store is TOML-backed, so besides the three editable shapes it can hand
/// back floats, arrays or tables; those travel as `Raw` and are shown as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    Raw(serde_json::Value),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Raw(v) => v.clone(),
        }
    }

    /// JSON text sent to the store, so `"42"` and `42` stay distinguishable.
    pub fn to_wire(&self) -> String {
        self.to_json().to_string()
    }

    /// Text placed in an editable field.
    pub fn display_text(&self) -> String {
        match self {
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Str(s) => s.clone(),
            Value::Raw(v) => v.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

pub fn parse_tree(body: &str) -> crate::Result<ConfigurationTree> {
    serde_json::from_str(body)
        .map_err(|e| crate::Error::msg(format!("invalid configuration tree: {e}")))
}
