mod support;

use silvertree_settings::editor::Editor;
use silvertree_settings::ids::IdAllocator;
use silvertree_settings::render::render;
use silvertree_settings::session::SessionState;
use silvertree_settings::tree::parse_tree;
use silvertree_settings::view::{Action, Screen, UiNode};

use support::{PASSWORD, RecordingService, section, table_in};

fn unlocked() -> SessionState {
    let mut s = SessionState::new();
    s.unlock(PASSWORD);
    s
}

#[test]
fn widgets_base_is_deletable_and_editable_for_normal_users() {
    let svc = RecordingService::new(
        r#"{"widgets":{"clock1":{"uuid":"\"clock\"","position_x":100}}}"#,
    );
    let mut editor = Editor::new(svc);
    assert!(editor.submit_password(PASSWORD));
    let view = editor.view();
    assert_eq!(view.screen, Screen::Configuration);
    assert!(!view.admin_indicator);

    assert_eq!(view.nodes.len(), 1);
    let UiNode::Section(module) = &view.nodes[0] else {
        panic!("expected widgets section");
    };
    assert_eq!(module.title, "widgets");
    assert!(matches!(&module.add, Some(Action::OpenWizard { template, .. }) if template == "widgets"));
    assert_eq!(module.content.len(), 1);

    let base = section(view, "clock1");
    assert_eq!(
        base.delete,
        Some(Action::DeleteBase {
            module: "widgets".into(),
            base: "clock1".into()
        })
    );
    assert!(base.add.is_none());

    let table = table_in(base);
    let keys: Vec<_> = table.rows.iter().map(|r| r.key.text.as_str()).collect();
    assert_eq!(keys, vec!["uuid", "position_x"]);
    assert!(table.rows.iter().all(|r| !r.value.read_only));
    assert_eq!(table.rows[1].value.text, "100");
}

#[test]
fn same_tree_and_session_render_the_same_outline() {
    let tree = parse_tree(
        r#"{"clock":{"bundle":{"uuid":"clock"},"face":{"color":"red"},"clock":{"size":3}},
            "wifi":{"home":{"name":"home","password":"pw"}},
            "weather":{"a":{},"b":{},"c":{"unit":"C"}}}"#,
    )
    .unwrap();
    let session = unlocked();
    let mut ids = IdAllocator::new();
    let first = render(&tree, &session, &mut ids, false);
    let second = render(&tree, &session, &mut ids, false);
    assert_eq!(first.outline(), second.outline());
    // Fresh ids per pass.
    assert_ne!(first, second);

    let outline = first.outline();
    assert!(!outline.contains("bundle"));
    assert!(outline.contains("password = <masked>"));
    assert!(outline.starts_with("section \"face\""));
}

#[test]
fn elevation_reveals_bundle_and_row_controls() {
    let tree = parse_tree(r#"{"clock":{"bundle":{"uuid":"clock"},"clock":{"size":3}}}"#).unwrap();
    let mut ids = IdAllocator::new();
    let normal = render(&tree, &unlocked(), &mut ids, false);
    assert_eq!(
        normal.outline(),
        "section \"clock\"\n\
         \x20 table clock/clock\n\
         \x20   size = \"3\"\n\
         \x20   button \"Save\"\n"
    );

    let mut session = unlocked();
    for _ in 0..10 {
        session.bump_escalation();
    }
    let elevated = render(&tree, &session, &mut ids, true);
    assert_eq!(
        elevated.outline(),
        "[admin]\n\
         section \"clock\" [+wizard]\n\
         \x20 section \"bundle\" [+row] [delete]\n\
         \x20   table clock/bundle\n\
         \x20     uuid = \"clock\"\n\
         \x20     button \"Save\"\n\
         \x20 section \"clock\" [+row] [delete]\n\
         \x20   table clock/clock\n\
         \x20     size = \"3\"\n\
         \x20     button \"Save\"\n"
    );
}

#[test]
fn module_with_one_self_named_base_stays_visible() {
    let svc = RecordingService::new(r#"{"weather":{"weather":{"city":"Oslo","units":"metric"}}}"#);
    let mut editor = Editor::new(svc);
    assert!(editor.submit_password(PASSWORD));
    let base = section(editor.view(), "weather");
    assert!(base.delete.is_none());
    let table = table_in(base);
    assert_eq!(table.module, "weather");
    let values: Vec<_> = table.rows.iter().map(|r| r.value.text.as_str()).collect();
    assert_eq!(values, vec!["Oslo", "metric"]);
}
