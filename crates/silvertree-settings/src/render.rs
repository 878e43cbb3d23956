//! Builds the render tree from a configuration tree and the session's
//! permission level.

use tracing::debug;

use crate::coerce::FieldKind;
use crate::ids::{IdAllocator, NodeId};
use crate::session::SessionState;
use crate::tree::{self, BUNDLE_BASE, ConfigurationTree, ModuleConfig};
use crate::view::{
    Action, AddControl, Button, Field, LOGIN_FIELD, LOGIN_TITLE, Screen, Section, SettingsTable,
    UiNode, View,
};

/// State for one render pass. Built fresh for every pass and dropped after.
pub struct RenderContext<'a> {
    ids: &'a mut IdAllocator,
    session: &'a SessionState,
}

impl<'a> RenderContext<'a> {
    pub fn new(ids: &'a mut IdAllocator, session: &'a SessionState) -> Self {
        Self { ids, session }
    }

    fn next_id(&mut self) -> NodeId {
        self.ids.next_id()
    }

    fn elevated(&self) -> bool {
        self.session.is_elevated()
    }
}

/// Renders the login screen while locked, otherwise the configuration view.
/// The admin indicator never shows on the login screen.
pub fn render(
    tree: &ConfigurationTree,
    session: &SessionState,
    ids: &mut IdAllocator,
    admin_indicator: bool,
) -> View {
    let mut ctx = RenderContext::new(ids, session);
    if !session.is_unlocked() {
        return View {
            screen: Screen::Login,
            nodes: render_login(),
            admin_indicator: false,
        };
    }
    View {
        screen: Screen::Configuration,
        nodes: render_configuration(tree, &mut ctx),
        admin_indicator,
    }
}

pub fn render_login() -> Vec<UiNode> {
    vec![
        UiNode::Label(LOGIN_TITLE.to_string()),
        UiNode::Field(Field::editable(LOGIN_FIELD, FieldKind::Masked).with_placeholder("password...")),
        UiNode::Button(Button::new("Unlock", Action::Unlock)),
    ]
}

pub fn render_configuration(tree: &ConfigurationTree, ctx: &mut RenderContext<'_>) -> Vec<UiNode> {
    let mut out = Vec::new();
    for (module, bases) in tree {
        render_module(module, bases, ctx, &mut out);
    }
    out
}

fn render_module(
    module: &str,
    bases: &ModuleConfig,
    ctx: &mut RenderContext<'_>,
    out: &mut Vec<UiNode>,
) {
    let elevated = ctx.elevated();
    let customizable = tree::is_user_customizable(module);

    let mut sections = Vec::new();
    let mut last_base = "";
    for (base, config) in bases {
        if base == BUNDLE_BASE && !elevated {
            continue;
        }
        last_base = base.as_str();

        let table = SettingsTable::from_base(ctx.next_id(), module, base, config);
        let add = if elevated {
            AddControl::Explicit(Action::AddRow { table: table.id })
        } else {
            AddControl::None
        };
        let delete = (customizable || elevated).then(|| Action::DeleteBase {
            module: module.to_string(),
            base: base.clone(),
        });
        let id = ctx.next_id();
        sections.push(UiNode::Section(Section::new(
            id,
            base.clone(),
            add,
            delete,
            vec![UiNode::Table(table)],
        )));
    }

    if sections.is_empty() && !elevated {
        debug!(module, "module has no visible bases");
        return;
    }

    if sections.len() > 2 || elevated || customizable || last_base != module {
        let add = if customizable || elevated {
            AddControl::BaseWizard
        } else {
            AddControl::None
        };
        let id = ctx.next_id();
        out.push(UiNode::Section(Section::new(id, module, add, None, sections)));
    } else {
        // One or two bases ending in the module's own name sit at top level.
        out.extend(sections);
    }
}
