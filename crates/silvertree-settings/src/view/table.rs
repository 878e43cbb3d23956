use crate::coerce::{self, FieldKind};
use crate::ids::NodeId;
use crate::tree::{BaseConfig, Value};

use super::{Action, Button, Field};

pub const SAVE_LABEL: &str = "Save";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingRow {
    pub key: Field,
    pub value: Field,
}

/// Key/value form for one base. Module and base are fixed at construction;
/// saving always targets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsTable {
    pub id: NodeId,
    pub module: String,
    pub base: String,
    pub rows: Vec<SettingRow>,
    pub save: Button,
}

impl SettingsTable {
    pub fn from_base(id: NodeId, module: &str, base: &str, config: &BaseConfig) -> Self {
        let rows = config
            .iter()
            .enumerate()
            .map(|(i, (key, value))| SettingRow {
                key: Field::fixed(format!("key_{i}"), key.clone()),
                value: Field::editable(format!("value_{i}"), coerce::field_kind_for_key(key))
                    .with_text(value.display_text()),
            })
            .collect();
        Self {
            id,
            module: module.to_string(),
            base: base.to_string(),
            rows,
            save: Button::new(SAVE_LABEL, Action::SaveTable(id)),
        }
    }

    /// Appends an empty row with an editable key. Returns its index.
    pub fn add_blank_row(&mut self) -> usize {
        let i = self.rows.len();
        self.rows.push(SettingRow {
            key: Field::editable(format!("key_{i}"), FieldKind::Text),
            value: Field::editable(format!("value_{i}"), FieldKind::Text),
        });
        i
    }

    pub fn set_key_text(&mut self, row: usize, text: &str) -> bool {
        let Some(r) = self.rows.get_mut(row) else {
            return false;
        };
        if r.key.read_only {
            return false;
        }
        r.key.text = text.to_string();
        r.value.kind = coerce::field_kind_for_key(text);
        true
    }

    pub fn set_value_text(&mut self, row: usize, text: &str) -> bool {
        let Some(r) = self.rows.get_mut(row) else {
            return false;
        };
        if r.value.read_only {
            return false;
        }
        r.value.text = text.to_string();
        true
    }

    /// Coerced key/value pairs in row order. Rows without a key are skipped.
    pub fn collect(&self) -> Vec<(String, Value)> {
        self.rows
            .iter()
            .filter(|r| !r.key.text.is_empty())
            .map(|r| (r.key.text.clone(), coerce::parse_form_value(&r.value.text)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdAllocator;

    fn base() -> BaseConfig {
        let mut b = BaseConfig::new();
        b.insert("name".into(), Value::from("home"));
        b.insert("password".into(), Value::from("hunter2"));
        b.insert("retries".into(), Value::Int(3));
        b
    }

    #[test]
    fn rows_follow_base_order_with_read_only_keys() {
        let mut ids = IdAllocator::new();
        let t = SettingsTable::from_base(ids.next_id(), "wifi", "home", &base());
        let keys: Vec<_> = t.rows.iter().map(|r| r.key.text.as_str()).collect();
        assert_eq!(keys, vec!["name", "password", "retries"]);
        assert!(t.rows.iter().all(|r| r.key.read_only));
        assert_eq!(t.rows[1].value.kind, FieldKind::Masked);
        assert_eq!(t.rows[2].value.text, "3");
        assert_eq!(t.save.action, Action::SaveTable(t.id));
    }

    #[test]
    fn collect_coerces_and_skips_blank_keys() {
        let mut ids = IdAllocator::new();
        let mut t = SettingsTable::from_base(ids.next_id(), "wifi", "home", &base());
        t.set_value_text(2, "4.8");
        let blank = t.add_blank_row();
        t.set_value_text(blank, "orphan");
        let extra = t.add_blank_row();
        t.set_key_text(extra, "password_guest");
        t.set_value_text(extra, "true");
        assert_eq!(t.rows[extra].value.kind, FieldKind::Masked);

        let pairs = t.collect();
        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), Value::from("home")),
                ("password".to_string(), Value::from("hunter2")),
                ("retries".to_string(), Value::Int(4)),
                ("password_guest".to_string(), Value::Bool(true)),
            ]
        );
    }

    #[test]
    fn existing_keys_cannot_be_renamed() {
        let mut ids = IdAllocator::new();
        let mut t = SettingsTable::from_base(ids.next_id(), "wifi", "home", &base());
        assert!(!t.set_key_text(0, "other"));
        assert_eq!(t.rows[0].key.text, "name");
    }
}
