//! Integration tests: pointer gestures, tools, and shortcuts driving the
//! scene store through the editor.

use planar_core::model::*;
use planar_core::{EditingMode, FlatGraph, NodeId, SceneStore};
use planar_editor::{Editor, EditorConfig, Feedback, InputEvent, Modifiers, ToolKind};
use pretty_assertions::assert_eq;

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn editor_with(roots: Vec<TreeNode>) -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut store = SceneStore::default();
    store.set_nodes(FlatGraph::from_tree(roots).unwrap()).unwrap();
    store.clear_history();
    Editor::new(store, EditorConfig::default())
}

fn rect(name: &str, x: f32, y: f32) -> TreeNode {
    TreeNode::leaf(SceneNode::rect(id(name)).at(x, y).sized(20.0, 20.0))
}

fn pos(ed: &Editor, name: &str) -> Option<(f32, f32)> {
    ed.store().get_node(id(name)).map(|n| (n.x, n.y))
}

fn down(ed: &mut Editor, x: f32, y: f32) -> bool {
    ed.handle_event(InputEvent::pointer_down(x, y, Modifiers::NONE))
}

fn drag_to(ed: &mut Editor, x: f32, y: f32) -> bool {
    ed.handle_event(InputEvent::pointer_move(x, y, Modifiers::NONE));
    ed.animation_frame()
}

fn up(ed: &mut Editor, x: f32, y: f32) -> bool {
    ed.handle_event(InputEvent::pointer_up(x, y, Modifiers::NONE))
}

fn key(ed: &mut Editor, k: &str, modifiers: Modifiers) -> bool {
    ed.handle_event(InputEvent::key(k, modifiers))
}

fn selected(ed: &Editor) -> Vec<NodeId> {
    ed.store().selection().selected_ids.clone()
}

// ─── Dragging ────────────────────────────────────────────────────────────

#[test]
fn drag_gesture_is_one_undo_step() {
    let mut ed = editor_with(vec![rect("ei_drag", 0.0, 0.0)]);
    down(&mut ed, 5.0, 5.0);
    drag_to(&mut ed, 15.0, 5.0);
    drag_to(&mut ed, 25.0, 10.0);
    up(&mut ed, 25.0, 10.0);
    assert_eq!(pos(&ed, "ei_drag"), Some((20.0, 5.0)));
    assert_eq!(selected(&ed), vec![id("ei_drag")]);

    assert!(ed.store_mut().undo());
    assert_eq!(pos(&ed, "ei_drag"), Some((0.0, 0.0)));
    assert!(!ed.store().can_undo());
}

#[test]
fn escape_mid_drag_restores_start() {
    let mut ed = editor_with(vec![rect("ei_esc", 0.0, 0.0)]);
    down(&mut ed, 5.0, 5.0);
    drag_to(&mut ed, 45.0, 45.0);
    assert_eq!(pos(&ed, "ei_esc"), Some((40.0, 40.0)));

    assert!(key(&mut ed, "Escape", Modifiers::NONE));
    assert_eq!(pos(&ed, "ei_esc"), Some((0.0, 0.0)));
    assert!(!ed.store().can_undo());
    // The press after a cancel starts fresh.
    assert!(!up(&mut ed, 45.0, 45.0));
}

#[test]
fn lost_pointer_cancels_drag() {
    let mut ed = editor_with(vec![rect("ei_lost", 0.0, 0.0)]);
    down(&mut ed, 5.0, 5.0);
    drag_to(&mut ed, 30.0, 5.0);
    ed.handle_event(InputEvent::PointerCancel);
    assert_eq!(pos(&ed, "ei_lost"), Some((0.0, 0.0)));
    assert!(!ed.store().can_undo());
}

#[test]
fn below_threshold_press_does_not_move() {
    let mut ed = editor_with(vec![rect("ei_jitter", 0.0, 0.0)]);
    down(&mut ed, 5.0, 5.0);
    drag_to(&mut ed, 6.0, 6.0);
    up(&mut ed, 6.0, 6.0);
    assert_eq!(pos(&ed, "ei_jitter"), Some((0.0, 0.0)));
    assert!(!ed.store().can_undo());
}

#[test]
fn pointer_up_flushes_pending_move() {
    let mut ed = editor_with(vec![rect("ei_flush", 0.0, 0.0)]);
    down(&mut ed, 5.0, 5.0);
    ed.handle_event(InputEvent::pointer_move(45.0, 5.0, Modifiers::NONE));
    assert!(ed.has_pending_move());
    up(&mut ed, 45.0, 5.0);
    assert!(!ed.has_pending_move());
    assert_eq!(pos(&ed, "ei_flush"), Some((40.0, 0.0)));
}

#[test]
fn dragging_multiple_nodes_moves_all() {
    let mut ed = editor_with(vec![rect("ei_m_a", 0.0, 0.0), rect("ei_m_b", 50.0, 0.0)]);
    ed.store_mut()
        .set_selected_ids(vec![id("ei_m_a"), id("ei_m_b")]);
    down(&mut ed, 55.0, 5.0);
    assert_eq!(selected(&ed), vec![id("ei_m_a"), id("ei_m_b")]);
    drag_to(&mut ed, 55.0, 35.0);
    up(&mut ed, 55.0, 35.0);
    assert_eq!(pos(&ed, "ei_m_a"), Some((0.0, 30.0)));
    assert_eq!(pos(&ed, "ei_m_b"), Some((50.0, 30.0)));
}

// ─── Marquee ─────────────────────────────────────────────────────────────

#[test]
fn marquee_selects_touched_nodes() {
    let mut ed = editor_with(vec![
        rect("ei_mq_a", 0.0, 0.0),
        rect("ei_mq_b", 100.0, 0.0),
        rect("ei_mq_c", 300.0, 0.0),
    ]);
    down(&mut ed, -10.0, -10.0);
    drag_to(&mut ed, 110.0, 30.0);
    assert!(matches!(ed.feedback(), Some(Feedback::Marquee(_))));

    up(&mut ed, 110.0, 30.0);
    assert_eq!(ed.feedback(), None);
    assert_eq!(selected(&ed), vec![id("ei_mq_a"), id("ei_mq_b")]);
    assert!(!ed.store().can_undo());
}

#[test]
fn shift_marquee_adds_to_selection() {
    let mut ed = editor_with(vec![rect("ei_sm_a", 0.0, 0.0), rect("ei_sm_b", 100.0, 0.0)]);
    ed.store_mut().select(id("ei_sm_a"), false);
    ed.handle_event(InputEvent::pointer_down(90.0, -10.0, Modifiers::SHIFT));
    drag_to(&mut ed, 130.0, 30.0);
    ed.handle_event(InputEvent::pointer_up(130.0, 30.0, Modifiers::SHIFT));
    assert_eq!(selected(&ed), vec![id("ei_sm_a"), id("ei_sm_b")]);
}

// ─── Drawing ─────────────────────────────────────────────────────────────

#[test]
fn draw_rect_commits_one_node() {
    let mut ed = editor_with(vec![]);
    key(&mut ed, "r", Modifiers::NONE);
    assert_eq!(ed.tool(), ToolKind::Rect);

    down(&mut ed, 10.0, 10.0);
    drag_to(&mut ed, 60.0, 40.0);
    assert!(matches!(
        ed.feedback(),
        Some(Feedback::Preview {
            tool: ToolKind::Rect,
            ..
        })
    ));
    up(&mut ed, 60.0, 40.0);

    assert_eq!(ed.feedback(), None);
    assert_eq!(ed.tool(), ToolKind::Select);
    let created = ed.store().selection().single().unwrap();
    let node = ed.store().get_node(created).unwrap();
    assert_eq!(node.kind.type_name(), "rect");
    assert_eq!(
        (node.x, node.y, node.width, node.height),
        (10.0, 10.0, 50.0, 30.0)
    );

    assert!(ed.store_mut().undo());
    assert!(ed.store().graph().root_ids.is_empty());
}

#[test]
fn click_with_shape_tool_uses_default_size() {
    let mut ed = editor_with(vec![]);
    key(&mut ed, "o", Modifiers::NONE);
    down(&mut ed, 10.0, 10.0);
    up(&mut ed, 10.0, 10.0);
    let created = ed.store().selection().single().unwrap();
    let node = ed.store().get_node(created).unwrap();
    assert_eq!(node.kind.type_name(), "ellipse");
    assert_eq!((node.width, node.height), (100.0, 100.0));
}

#[test]
fn escape_cancels_draw_without_commit() {
    let mut ed = editor_with(vec![]);
    key(&mut ed, "f", Modifiers::NONE);
    down(&mut ed, 0.0, 0.0);
    drag_to(&mut ed, 80.0, 80.0);
    assert!(key(&mut ed, "Escape", Modifiers::NONE));
    assert_eq!(ed.feedback(), None);
    up(&mut ed, 80.0, 80.0);
    assert!(ed.store().graph().root_ids.is_empty());
    assert!(!ed.store().can_undo());
}

#[test]
fn shapes_drawn_inside_entered_container_use_local_coordinates() {
    let mut ed = editor_with(vec![TreeNode::leaf(
        SceneNode::frame(id("ei_box")).at(100.0, 100.0).sized(200.0, 200.0),
    )]);
    down(&mut ed, 150.0, 150.0);
    up(&mut ed, 150.0, 150.0);
    ed.handle_event(InputEvent::DoubleClick { x: 150.0, y: 150.0 });
    assert_eq!(ed.store().selection().entered_container_id, Some(id("ei_box")));

    key(&mut ed, "r", Modifiers::NONE);
    down(&mut ed, 110.0, 120.0);
    drag_to(&mut ed, 140.0, 150.0);
    up(&mut ed, 140.0, 150.0);

    let created = ed.store().selection().single().unwrap();
    assert_eq!(ed.store().graph().parent(created), Some(id("ei_box")));
    let node = ed.store().get_node(created).unwrap();
    assert_eq!((node.x, node.y), (10.0, 20.0));
}

#[test]
fn double_click_enters_container_and_picks_child() {
    let mut ed = editor_with(vec![TreeNode::new(
        SceneNode::frame(id("ei_dc_frame")).sized(200.0, 200.0),
        vec![rect("ei_dc_child", 50.0, 50.0)],
    )]);
    down(&mut ed, 55.0, 55.0);
    up(&mut ed, 55.0, 55.0);
    assert_eq!(selected(&ed), vec![id("ei_dc_frame")]);

    assert!(ed.handle_event(InputEvent::DoubleClick { x: 55.0, y: 55.0 }));
    assert_eq!(
        ed.store().selection().entered_container_id,
        Some(id("ei_dc_frame"))
    );
    assert_eq!(selected(&ed), vec![id("ei_dc_child")]);
}

#[test]
fn double_click_on_instance_targets_descendant() {
    let mut comp = SceneNode::frame(id("ei_di_comp")).sized(60.0, 30.0);
    if let Some(p) = comp.frame_props_mut() {
        p.reusable = true;
    }
    let mut ed = editor_with(vec![
        TreeNode::new(
            comp,
            vec![TreeNode::leaf(SceneNode::rect(id("ei_di_bg")).sized(60.0, 30.0))],
        ),
        TreeNode::leaf(
            SceneNode::instance(id("ei_di_inst"), id("ei_di_comp"))
                .at(100.0, 0.0)
                .sized(60.0, 30.0),
        ),
    ]);
    down(&mut ed, 110.0, 10.0);
    up(&mut ed, 110.0, 10.0);
    assert_eq!(selected(&ed), vec![id("ei_di_inst")]);

    assert!(ed.handle_event(InputEvent::DoubleClick { x: 110.0, y: 10.0 }));
    let ctx = ed.store().selection().instance_context.unwrap();
    assert_eq!((ctx.instance_id, ctx.descendant_id), (id("ei_di_inst"), id("ei_di_bg")));
}

// ─── Text ────────────────────────────────────────────────────────────────

#[test]
fn text_tool_places_and_edits() {
    let mut ed = editor_with(vec![]);
    key(&mut ed, "t", Modifiers::NONE);
    down(&mut ed, 40.0, 60.0);
    up(&mut ed, 40.0, 60.0);

    let editing = ed.store().selection().editing.unwrap();
    assert_eq!(editing.mode, EditingMode::Text);
    assert_eq!(pos(&ed, editing.node_id.as_str()), Some((40.0, 60.0)));

    // Keys belong to the text field while editing.
    assert!(!key(&mut ed, "Delete", Modifiers::NONE));
    assert!(ed.store().get_node(editing.node_id).is_some());

    assert!(ed.commit_text_edit("Hello"));
    assert!(!ed.store().selection().is_editing());
    let node = ed.store().get_node(editing.node_id).unwrap();
    assert_eq!(node.text_props().map(|t| t.text.as_str()), Some("Hello"));
    assert!(node.width > 0.0);
}

#[test]
fn abandoned_empty_text_is_removed() {
    let mut ed = editor_with(vec![]);
    key(&mut ed, "t", Modifiers::NONE);
    down(&mut ed, 0.0, 0.0);
    up(&mut ed, 0.0, 0.0);
    let text = ed.store().selection().editing.unwrap().node_id;

    assert!(key(&mut ed, "Escape", Modifiers::NONE));
    assert!(ed.store().get_node(text).is_none());
    assert!(!ed.store().selection().is_editing());
    assert!(!ed.store().can_undo());
}

#[test]
fn placed_text_and_commit_undo_together() {
    let mut ed = editor_with(vec![]);
    key(&mut ed, "t", Modifiers::NONE);
    down(&mut ed, 20.0, 20.0);
    up(&mut ed, 20.0, 20.0);
    let text = ed.store().selection().editing.unwrap().node_id;
    assert!(ed.commit_text_edit("Hello"));

    assert!(key(&mut ed, "z", Modifiers::CMD));
    assert!(ed.store().get_node(text).is_none());
    assert!(!ed.store().can_undo());

    assert!(key(&mut ed, "y", Modifiers::CMD));
    let node = ed.store().get_node(text).unwrap();
    assert_eq!(node.text_props().map(|t| t.text.as_str()), Some("Hello"));
}

#[test]
fn committing_empty_placed_text_leaves_no_undo_step() {
    let mut ed = editor_with(vec![rect("ei_ce_rect", 100.0, 100.0)]);
    key(&mut ed, "t", Modifiers::NONE);
    down(&mut ed, 0.0, 0.0);
    up(&mut ed, 0.0, 0.0);
    let text = ed.store().selection().editing.unwrap().node_id;
    assert!(ed.commit_text_edit(""));
    assert!(ed.store().get_node(text).is_none());
    assert!(!ed.store().can_undo());
    assert_eq!(ed.store().graph().len(), 1);
}

#[test]
fn press_while_editing_only_ends_editing() {
    let mut ed = editor_with(vec![rect("ei_pe_rect", 100.0, 100.0)]);
    key(&mut ed, "t", Modifiers::NONE);
    down(&mut ed, 0.0, 0.0);
    up(&mut ed, 0.0, 0.0);
    let text = ed.store().selection().editing.unwrap().node_id;
    ed.commit_text_edit("x");
    ed.store_mut().begin_editing(text, EditingMode::Text);

    assert!(down(&mut ed, 105.0, 105.0));
    assert!(!ed.store().selection().is_editing());
    assert_eq!(selected(&ed), vec![text]);
    up(&mut ed, 105.0, 105.0);
}

// ─── Shortcuts ───────────────────────────────────────────────────────────

#[test]
fn group_shortcut_then_undo() {
    let mut ed = editor_with(vec![rect("ei_g_a", 0.0, 0.0), rect("ei_g_b", 40.0, 0.0)]);
    ed.store_mut()
        .set_selected_ids(vec![id("ei_g_a"), id("ei_g_b")]);
    assert!(key(&mut ed, "g", Modifiers::CMD));
    let group = ed.store().selection().single().unwrap();
    assert_eq!(
        ed.store().graph().children(group),
        &[id("ei_g_a"), id("ei_g_b")]
    );

    assert!(key(&mut ed, "z", Modifiers::CMD));
    assert_eq!(ed.store().graph().root_ids, vec![id("ei_g_a"), id("ei_g_b")]);
    assert!(key(&mut ed, "Z", Modifiers { shift: true, ..Modifiers::CMD }));
    assert_eq!(ed.store().graph().root_ids.len(), 1);
}

#[test]
fn arrow_keys_nudge_selection() {
    let mut ed = editor_with(vec![rect("ei_arrow", 0.0, 0.0)]);
    ed.store_mut().select(id("ei_arrow"), false);
    key(&mut ed, "ArrowRight", Modifiers::NONE);
    key(&mut ed, "ArrowDown", Modifiers::SHIFT);
    assert_eq!(pos(&ed, "ei_arrow"), Some((1.0, 10.0)));
}

#[test]
fn copy_paste_offsets_until_source_is_gone() {
    let mut ed = editor_with(vec![rect("ei_cp", 10.0, 10.0)]);
    ed.store_mut().select(id("ei_cp"), false);
    key(&mut ed, "c", Modifiers::CMD);
    assert!(ed.clipboard_bytes().is_some());

    assert!(key(&mut ed, "v", Modifiers::CMD));
    let pasted = ed.store().selection().single().unwrap();
    assert_ne!(pasted, id("ei_cp"));
    assert_eq!(pos(&ed, pasted.as_str()), Some((20.0, 20.0)));

    ed.store_mut().select(id("ei_cp"), false);
    assert!(key(&mut ed, "x", Modifiers::CMD));
    assert!(ed.store().get_node(id("ei_cp")).is_none());
    assert!(key(&mut ed, "v", Modifiers::CMD));
    let restored = ed.store().selection().single().unwrap();
    assert_eq!(pos(&ed, restored.as_str()), Some((10.0, 10.0)));
}

#[test]
fn select_all_and_delete() {
    let mut ed = editor_with(vec![rect("ei_sa_a", 0.0, 0.0), rect("ei_sa_b", 40.0, 0.0)]);
    assert!(key(&mut ed, "a", Modifiers::CMD));
    assert_eq!(selected(&ed), vec![id("ei_sa_a"), id("ei_sa_b")]);
    assert!(key(&mut ed, "Backspace", Modifiers::NONE));
    assert!(ed.store().graph().root_ids.is_empty());
    assert!(selected(&ed).is_empty());
}

#[test]
fn escape_unwinds_selection() {
    let mut ed = editor_with(vec![rect("ei_unwind", 0.0, 0.0)]);
    ed.store_mut().select(id("ei_unwind"), false);
    assert!(key(&mut ed, "Escape", Modifiers::NONE));
    assert!(selected(&ed).is_empty());
    assert!(!key(&mut ed, "Escape", Modifiers::NONE));
}
