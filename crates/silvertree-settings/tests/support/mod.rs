#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;

use silvertree_settings::client::ConfigService;
use silvertree_settings::error::Error;
use silvertree_settings::tree::{self, BaseConfig, ConfigurationTree, Value};
use silvertree_settings::view::{Section, SettingsTable, UiNode, View};
use silvertree_settings::Result;

pub const PASSWORD: &str = "letmein";

/// In-memory store that records every call in order.
pub struct RecordingService {
    pub tree: RefCell<ConfigurationTree>,
    pub calls: RefCell<Vec<String>>,
    pub failing: RefCell<HashSet<&'static str>>,
    pub token: Option<String>,
}

impl RecordingService {
    pub fn new(json: &str) -> Self {
        Self {
            tree: RefCell::new(tree::parse_tree(json).expect("fixture tree")),
            calls: RefCell::new(Vec::new()),
            failing: RefCell::new(HashSet::new()),
            token: None,
        }
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.borrow_mut().insert(op);
    }

    pub fn heal(&self, op: &'static str) {
        self.failing.borrow_mut().remove(op);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn log(&self, op: &'static str, detail: String) -> Result<()> {
        let line = if detail.is_empty() {
            op.to_string()
        } else {
            format!("{op} {detail}")
        };
        self.calls.borrow_mut().push(line);
        if self.failing.borrow().contains(op) {
            return Err(Error::msg(format!("{op} unavailable")));
        }
        Ok(())
    }
}

impl ConfigService for RecordingService {
    fn authorize(&mut self, token: &str) {
        self.token = Some(token.to_string());
    }

    fn fetch_tree(&self) -> Result<ConfigurationTree> {
        self.log("fetch_tree", String::new())?;
        Ok(self.tree.borrow().clone())
    }

    fn get_value(&self, module: &str, base: &str, key: &str) -> Result<Value> {
        self.log("get_value", format!("{module}/{base}/{key}"))?;
        self.tree
            .borrow()
            .get(module)
            .and_then(|m| m.get(base))
            .and_then(|b| b.get(key))
            .cloned()
            .ok_or_else(|| Error::msg("no such key"))
    }

    fn set_value(&self, module: &str, base: &str, key: &str, value_json: &str) -> Result<()> {
        self.log("set_value", format!("{module}/{base}/{key}={value_json}"))?;
        let value: Value = serde_json::from_str(value_json)?;
        self.tree
            .borrow_mut()
            .entry(module.to_string())
            .or_default()
            .entry(base.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    fn create_base(&self, module: &str, base: &str) -> Result<()> {
        self.log("create_base", format!("{module}/{base}"))?;
        self.tree
            .borrow_mut()
            .entry(module.to_string())
            .or_default()
            .insert(base.to_string(), BaseConfig::new());
        Ok(())
    }

    fn delete_base(&self, module: &str, base: &str) -> Result<()> {
        self.log("delete_base", format!("{module}/{base}"))?;
        if let Some(m) = self.tree.borrow_mut().get_mut(module) {
            m.shift_remove(base);
        }
        Ok(())
    }

    fn check_password(&self, password: &str) -> Result<bool> {
        self.log("check_password", String::new())?;
        Ok(password == PASSWORD)
    }

    fn reload_dashboard(&self) -> Result<()> {
        self.log("reload_dashboard", String::new())
    }

    fn reload_system(&self) -> Result<()> {
        self.log("reload_system", String::new())
    }

    fn reconnect_network(&self) -> Result<()> {
        self.log("reconnect_network", String::new())
    }
}

pub fn find_section<'a>(nodes: &'a [UiNode], title: &str) -> Option<&'a Section> {
    for n in nodes {
        if let UiNode::Section(s) = n {
            if s.title == title {
                return Some(s);
            }
            if let Some(found) = find_section(&s.content, title) {
                return Some(found);
            }
        }
    }
    None
}

pub fn section<'a>(view: &'a View, title: &str) -> &'a Section {
    find_section(&view.nodes, title).unwrap_or_else(|| panic!("section {title} not rendered"))
}

pub fn table_in(s: &Section) -> &SettingsTable {
    s.content
        .iter()
        .find_map(|n| match n {
            UiNode::Table(t) => Some(t),
            _ => None,
        })
        .expect("section holds a table")
}
