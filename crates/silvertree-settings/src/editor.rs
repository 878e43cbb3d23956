//! Editor controller: owns the session, the last fetched tree and the current
//! view, and turns activated [`Action`]s into service calls.
//!
//! Service calls inside one action run strictly in order and the re-fetch is
//! always last. Failures never abort the program; they are logged and queued
//! in [`Editor::take_failures`].

use tracing::{debug, info, warn};

use crate::client::ConfigService;
use crate::error::{Error, Result};
use crate::ids::{IdAllocator, NodeId};
use crate::render;
use crate::session::{Escalation, SessionState};
use crate::tree::{self, ConfigurationTree, WIFI_MODULE};
use crate::view::wizard::template_seeds;
use crate::view::{Action, FieldRef, UiNode, View, Wizard};

/// A service call that failed and was swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub operation: &'static str,
    pub error: Error,
}

pub struct Editor<S: ConfigService> {
    service: S,
    session: SessionState,
    ids: IdAllocator,
    tree: ConfigurationTree,
    view: View,
    admin_indicator: bool,
    failures: Vec<Failure>,
}

impl<S: ConfigService> Editor<S> {
    /// Starts locked, showing the login screen.
    pub fn new(service: S) -> Self {
        let session = SessionState::new();
        let mut ids = IdAllocator::new();
        let tree = ConfigurationTree::new();
        let view = render::render(&tree, &session, &mut ids, false);
        Self {
            service,
            session,
            ids,
            tree,
            view,
            admin_indicator: false,
            failures: Vec::new(),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut S {
        &mut self.service
    }

    /// Tree behind the current view.
    pub fn tree(&self) -> &ConfigurationTree {
        &self.tree
    }

    pub fn take_failures(&mut self) -> Vec<Failure> {
        std::mem::take(&mut self.failures)
    }

    pub fn set_field_text(&mut self, at: FieldRef, text: &str) -> bool {
        self.view.set_field_text(at, text)
    }

    pub fn toggle_section(&mut self, id: NodeId) -> bool {
        match self.view.section_mut(id) {
            Some(s) => {
                s.toggle();
                true
            }
            None => false,
        }
    }

    /// Verifies `password` with the service. On success the session unlocks,
    /// the password becomes the auth token and the tree is fetched.
    pub fn submit_password(&mut self, password: &str) -> bool {
        let checked = self.service.check_password(password);
        match self.record("check_password", checked) {
            Some(true) => {}
            Some(false) => {
                debug!("password rejected");
                return false;
            }
            None => return false,
        }
        self.session.unlock(password);
        self.service.authorize(password);
        self.refresh();
        true
    }

    /// One hidden gesture. Reaching the threshold turns the admin indicator on
    /// and re-renders right away.
    pub fn escalation_gesture(&mut self) -> Escalation {
        let step = self.session.bump_escalation();
        if step == Escalation::Elevated {
            self.admin_indicator = true;
            self.refresh();
        }
        step
    }

    /// Re-fetches the tree and rebuilds the view. While locked only the login
    /// screen is rebuilt. A failed fetch keeps the current view.
    pub fn refresh(&mut self) {
        if !self.session.is_unlocked() {
            self.rerender();
            return;
        }
        let fetched = self.service.fetch_tree();
        if let Some(tree) = self.record("fetch_tree", fetched) {
            self.tree = tree;
            self.rerender();
        }
    }

    fn rerender(&mut self) {
        self.view = render::render(
            &self.tree,
            &self.session,
            &mut self.ids,
            self.admin_indicator,
        );
    }

    pub fn dispatch(&mut self, action: Action) {
        if action == Action::Unlock {
            let password = self
                .view
                .field(FieldRef::Login)
                .map(|f| f.text.clone())
                .unwrap_or_default();
            self.submit_password(&password);
            return;
        }
        if !self.session.is_unlocked() {
            debug!(?action, "ignored while locked");
            return;
        }
        match action {
            Action::Unlock => {}
            Action::ToggleSection(id) => {
                self.toggle_section(id);
            }
            Action::AddRow { table } => self.add_row(table),
            Action::DeleteBase { module, base } => self.delete_base(&module, &base),
            Action::OpenWizard { section, template } => self.open_wizard(section, template),
            Action::SaveTable(table) => self.save_table(table),
            Action::ConfirmWizard(id) => self.confirm_wizard(id),
        }
    }

    fn may_manage_bases(&self, module: &str) -> bool {
        tree::is_user_customizable(module) || self.session.is_elevated()
    }

    fn add_row(&mut self, table: NodeId) {
        if !self.session.is_elevated() {
            debug!(%table, "add row needs elevated mode");
            return;
        }
        let Some(t) = self.view.table_mut(table) else {
            debug!(%table, "stale table");
            return;
        };
        t.add_blank_row();
        if let Some(s) = self.view.table_owner_mut(table) {
            s.expand();
        }
    }

    fn delete_base(&mut self, module: &str, base: &str) {
        if !self.may_manage_bases(module) {
            debug!(module, base, "delete not permitted");
            return;
        }
        info!(module, base, "deleting base");
        let deleted = self.service.delete_base(module, base);
        if self.record("delete_base", deleted).is_none() {
            return;
        }
        if module == WIFI_MODULE {
            let r = self.service.reconnect_network();
            self.record("reconnect_network", r);
        }
        if tree::is_user_customizable(module) {
            let r = self.service.reload_system();
            self.record("reload_system", r);
        }
        let r = self.service.reload_dashboard();
        self.record("reload_dashboard", r);
        self.refresh();
    }

    fn open_wizard(&mut self, section: NodeId, template: String) {
        if !self.may_manage_bases(&template) {
            debug!(template = %template, "wizard not permitted");
            return;
        }
        let id = self.ids.next_id();
        let Some(s) = self.view.section_mut(section) else {
            debug!(%section, "stale section");
            return;
        };
        let open = matches!(s.content.first(), Some(UiNode::Wizard(_)));
        if !open {
            s.content.insert(0, UiNode::Wizard(Wizard::new(id, template)));
        }
        s.expand();
    }

    fn confirm_wizard(&mut self, id: NodeId) {
        let Some(w) = self.view.wizard(id) else {
            debug!(%id, "stale wizard");
            return;
        };
        let module = w.template.clone();
        let name = w.entered_name().to_string();
        if name.trim().is_empty() {
            debug!(module = %module, "empty base name not submitted");
            return;
        }
        if !self.may_manage_bases(&module) {
            debug!(module = %module, "create not permitted");
            return;
        }
        info!(module = %module, base = %name, "creating base");
        let created = self.service.create_base(&module, &name);
        if self.record("create_base", created).is_none() {
            return;
        }
        for (key, value) in template_seeds(&module, &name) {
            let r = self.service.set_value(&module, &name, key, &value.to_wire());
            self.record("set_value", r);
        }
        self.refresh();
    }

    fn save_table(&mut self, table: NodeId) {
        let Some(t) = self.view.table(table) else {
            debug!(%table, "stale table");
            return;
        };
        let module = t.module.clone();
        let base = t.base.clone();
        let pairs = t.collect();
        info!(module = %module, base = %base, keys = pairs.len(), "saving base");
        for (key, value) in &pairs {
            let r = self.service.set_value(&module, &base, key, &value.to_wire());
            self.record("set_value", r);
        }
        if module == WIFI_MODULE {
            let r = self.service.reconnect_network();
            self.record("reconnect_network", r);
            let r = self.service.reload_system();
            self.record("reload_system", r);
        }
        let r = self.service.reload_dashboard();
        self.record("reload_dashboard", r);
        self.refresh();
    }

    fn record<T>(&mut self, operation: &'static str, res: Result<T>) -> Option<T> {
        match res {
            Ok(v) => Some(v),
            Err(error) => {
                warn!(operation, error = %error, "service call failed");
                self.failures.push(Failure { operation, error });
                None
            }
        }
    }
}
