//! Platform-neutral render tree.
//!
//! Every render pass produces a fresh [`View`]. Controls carry [`Action`]
//! values instead of callbacks; an adapter shows the nodes and hands the
//! action of whatever the user activated back to the editor.

use std::fmt::Write as _;

use crate::coerce::FieldKind;
use crate::ids::NodeId;

pub mod section;
pub mod table;
pub mod wizard;

pub use section::{AddControl, Section};
pub use table::{SettingRow, SettingsTable};
pub use wizard::Wizard;

pub const FIELD_PLACEHOLDER: &str = "type here...";
pub const LOGIN_TITLE: &str = "Enter password to unlock";
pub const LOGIN_FIELD: &str = "password_box";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Unlock,
    ToggleSection(NodeId),
    AddRow { table: NodeId },
    DeleteBase { module: String, base: String },
    OpenWizard { section: NodeId, template: String },
    SaveTable(NodeId),
    ConfirmWizard(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub text: String,
    pub read_only: bool,
    pub placeholder: &'static str,
}

impl Field {
    pub fn editable(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            text: String::new(),
            read_only: false,
            placeholder: FIELD_PLACEHOLDER,
        }
    }

    pub fn fixed(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
            text: text.into(),
            read_only: true,
            placeholder: FIELD_PLACEHOLDER,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Text as an adapter should show it.
    pub fn shown_text(&self) -> String {
        match self.kind {
            FieldKind::Text => self.text.clone(),
            FieldKind::Masked => "*".repeat(self.text.chars().count()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UiNode {
    Label(String),
    Field(Field),
    Button(Button),
    Section(Section),
    Table(SettingsTable),
    Wizard(Wizard),
}

/// Addresses one editable field of the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRef {
    Login,
    RowKey { table: NodeId, row: usize },
    RowValue { table: NodeId, row: usize },
    WizardName(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Configuration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub screen: Screen,
    pub nodes: Vec<UiNode>,
    pub admin_indicator: bool,
}

impl View {
    pub fn section_mut(&mut self, id: NodeId) -> Option<&mut Section> {
        find_section(&mut self.nodes, id)
    }

    /// Section that directly holds the given table.
    pub fn table_owner_mut(&mut self, table: NodeId) -> Option<&mut Section> {
        find_table_owner(&mut self.nodes, table)
    }

    pub fn table(&self, id: NodeId) -> Option<&SettingsTable> {
        let mut out = None;
        walk(&self.nodes, &mut |n| {
            if let UiNode::Table(t) = n {
                if t.id == id {
                    out = Some(t);
                }
            }
        });
        out
    }

    pub fn table_mut(&mut self, id: NodeId) -> Option<&mut SettingsTable> {
        find_table(&mut self.nodes, id)
    }

    pub fn wizard(&self, id: NodeId) -> Option<&Wizard> {
        let mut out = None;
        walk(&self.nodes, &mut |n| {
            if let UiNode::Wizard(w) = n {
                if w.id == id {
                    out = Some(w);
                }
            }
        });
        out
    }

    pub fn field(&self, at: FieldRef) -> Option<&Field> {
        match at {
            FieldRef::Login => self.nodes.iter().find_map(|n| match n {
                UiNode::Field(f) if f.name == LOGIN_FIELD => Some(f),
                _ => None,
            }),
            FieldRef::RowKey { table, row } => self.table(table)?.rows.get(row).map(|r| &r.key),
            FieldRef::RowValue { table, row } => {
                self.table(table)?.rows.get(row).map(|r| &r.value)
            }
            FieldRef::WizardName(id) => self.wizard(id).map(|w| &w.name),
        }
    }

    /// Replaces the text of an editable field. Read-only or missing fields are
    /// left alone and `false` is returned.
    pub fn set_field_text(&mut self, at: FieldRef, text: &str) -> bool {
        match at {
            FieldRef::Login => {
                for n in &mut self.nodes {
                    if let UiNode::Field(f) = n {
                        if f.name == LOGIN_FIELD {
                            f.text = text.to_string();
                            return true;
                        }
                    }
                }
                false
            }
            FieldRef::RowKey { table, row } => self
                .table_mut(table)
                .is_some_and(|t| t.set_key_text(row, text)),
            FieldRef::RowValue { table, row } => self
                .table_mut(table)
                .is_some_and(|t| t.set_value_text(row, text)),
            FieldRef::WizardName(id) => match find_wizard(&mut self.nodes, id) {
                Some(w) => {
                    w.name.text = text.to_string();
                    true
                }
                None => false,
            },
        }
    }

    /// Structural rendering without node ids: two views built from the same
    /// tree and session produce the same outline.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        if self.admin_indicator {
            out.push_str("[admin]\n");
        }
        for n in &self.nodes {
            outline_node(n, 0, &mut out);
        }
        out
    }
}

fn walk<'a>(nodes: &'a [UiNode], f: &mut impl FnMut(&'a UiNode)) {
    for n in nodes {
        f(n);
        if let UiNode::Section(s) = n {
            walk(&s.content, f);
        }
    }
}

fn find_section(nodes: &mut [UiNode], id: NodeId) -> Option<&mut Section> {
    for n in nodes {
        if let UiNode::Section(s) = n {
            if s.id == id {
                return Some(s);
            }
            if let Some(found) = find_section(&mut s.content, id) {
                return Some(found);
            }
        }
    }
    None
}

fn find_table(nodes: &mut [UiNode], id: NodeId) -> Option<&mut SettingsTable> {
    for n in nodes {
        match n {
            UiNode::Table(t) if t.id == id => return Some(t),
            UiNode::Section(s) => {
                if let Some(found) = find_table(&mut s.content, id) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

fn find_table_owner(nodes: &mut [UiNode], table: NodeId) -> Option<&mut Section> {
    for n in nodes {
        if let UiNode::Section(s) = n {
            let holds = s
                .content
                .iter()
                .any(|c| matches!(c, UiNode::Table(t) if t.id == table));
            if holds {
                return Some(s);
            }
            if let Some(found) = find_table_owner(&mut s.content, table) {
                return Some(found);
            }
        }
    }
    None
}

fn find_wizard(nodes: &mut [UiNode], id: NodeId) -> Option<&mut Wizard> {
    for n in nodes {
        match n {
            UiNode::Wizard(w) if w.id == id => return Some(w),
            UiNode::Section(s) => {
                if let Some(found) = find_wizard(&mut s.content, id) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

fn outline_node(node: &UiNode, depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth);
    match node {
        UiNode::Label(text) => {
            let _ = writeln!(out, "{pad}label {text:?}");
        }
        UiNode::Field(f) => {
            let _ = writeln!(out, "{pad}field {} {:?}", f.name, f.kind);
        }
        UiNode::Button(b) => {
            let _ = writeln!(out, "{pad}button {:?}", b.label);
        }
        UiNode::Section(s) => {
            let mut controls = String::new();
            if let Some(add) = &s.add {
                controls.push_str(match add {
                    Action::OpenWizard { .. } => " [+wizard]",
                    _ => " [+row]",
                });
            }
            if s.delete.is_some() {
                controls.push_str(" [delete]");
            }
            let _ = writeln!(out, "{pad}section {:?}{controls}", s.title);
            for c in &s.content {
                outline_node(c, depth + 1, out);
            }
        }
        UiNode::Table(t) => {
            let _ = writeln!(out, "{pad}table {}/{}", t.module, t.base);
            for r in &t.rows {
                let key = if r.key.read_only {
                    r.key.text.clone()
                } else {
                    format!("<new:{}>", r.key.text)
                };
                let value = match r.value.kind {
                    FieldKind::Masked => "<masked>".to_string(),
                    FieldKind::Text => format!("{:?}", r.value.text),
                };
                let _ = writeln!(out, "{pad}  {key} = {value}");
            }
            let _ = writeln!(out, "{pad}  button {:?}", t.save.label);
        }
        UiNode::Wizard(w) => {
            let _ = writeln!(out, "{pad}wizard {}", w.template);
        }
    }
}
