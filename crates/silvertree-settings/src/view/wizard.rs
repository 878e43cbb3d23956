use crate::coerce::FieldKind;
use crate::ids::NodeId;
use crate::tree::{Value, WIDGETS_MODULE, WIFI_MODULE};

use super::{Action, Button, Field};

pub const WIZARD_PLACEHOLDER: &str = "enter name...";

/// Inline "new base" header: one name field and a confirm control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    pub id: NodeId,
    pub template: String,
    pub name: Field,
    pub confirm: Button,
}

impl Wizard {
    pub fn new(id: NodeId, template: impl Into<String>) -> Self {
        Self {
            id,
            template: template.into(),
            name: Field::editable(format!("wizard_input_{}", id.get()), FieldKind::Text)
                .with_placeholder(WIZARD_PLACEHOLDER),
            confirm: Button::new("+", Action::ConfirmWizard(id)),
        }
    }

    pub fn entered_name(&self) -> &str {
        &self.name.text
    }
}

/// Default keys written into a freshly created base, in write order.
pub fn template_seeds(template: &str, base_name: &str) -> Vec<(&'static str, Value)> {
    match template {
        WIDGETS_MODULE => vec![
            ("position_x", Value::Int(100)),
            ("position_y", Value::Int(100)),
            ("width", Value::Int(100)),
            ("height", Value::Int(100)),
            ("uuid", Value::from("clock")),
        ],
        WIFI_MODULE => vec![
            ("name", Value::from(base_name)),
            ("password", Value::from("")),
        ],
        _ => Vec::new(),
    }
}
