use crate::ids::NodeId;

use super::{Action, UiNode};

/// How a section's add control is wired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddControl {
    None,
    Explicit(Action),
    /// Opens the base-creation wizard for the template named by the title.
    BaseWizard,
}

/// Collapsible section. Starts collapsed; toggling one section never touches
/// another.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: NodeId,
    pub title: String,
    pub add: Option<Action>,
    pub delete: Option<Action>,
    pub content: Vec<UiNode>,
    expanded: bool,
}

impl Section {
    pub fn new(
        id: NodeId,
        title: impl Into<String>,
        add: AddControl,
        delete: Option<Action>,
        content: Vec<UiNode>,
    ) -> Self {
        let title = title.into();
        let add = match add {
            AddControl::None => None,
            AddControl::Explicit(a) => Some(a),
            AddControl::BaseWizard => Some(Action::OpenWizard {
                section: id,
                template: title.clone(),
            }),
        };
        Self {
            id,
            title,
            add,
            delete,
            content,
            expanded: false,
        }
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    pub fn expand(&mut self) {
        self.expanded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdAllocator;

    #[test]
    fn sections_toggle_independently() {
        let mut ids = IdAllocator::new();
        let mut a = Section::new(ids.next_id(), "a", AddControl::None, None, vec![]);
        let b = Section::new(ids.next_id(), "b", AddControl::None, None, vec![]);
        assert!(!a.is_expanded());
        a.toggle();
        assert!(a.is_expanded());
        assert!(!b.is_expanded());
        a.toggle();
        assert!(!a.is_expanded());
    }

    #[test]
    fn implicit_add_opens_wizard_for_title() {
        let mut ids = IdAllocator::new();
        let id = ids.next_id();
        let s = Section::new(id, "wifi", AddControl::BaseWizard, None, vec![]);
        assert_eq!(
            s.add,
            Some(Action::OpenWizard {
                section: id,
                template: "wifi".into()
            })
        );
    }
}
