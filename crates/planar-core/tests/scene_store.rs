//! Integration tests: SceneStore mutations, history, and derived views.
//!
//! Structural tests finish by re-checking the four graph maps.

use planar_core::clipboard;
use planar_core::model::*;
use planar_core::{
    EstimatedMeasurer, FlatGraph, NodeId, NodePatch, SceneStore, StoreConfig, TextMeasurer,
    TextMetrics,
};
use std::cell::Cell;
use std::rc::Rc;
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

fn rect(name: &str, x: f32, y: f32, w: f32, h: f32) -> TreeNode {
    TreeNode::leaf(SceneNode::rect(id(name)).at(x, y).sized(w, h))
}

fn store_with(roots: Vec<TreeNode>) -> SceneStore {
    init();
    let mut store = SceneStore::new(StoreConfig::default());
    store.set_nodes(FlatGraph::from_tree(roots).unwrap()).unwrap();
    store.clear_history();
    store
}

fn assert_consistent(store: &SceneStore) {
    if let Err(err) = store.graph().check_consistency() {
        panic!("graph maps out of sync: {err}");
    }
}

// ─── Structure ──────────────────────────────────────────────────────────

#[test]
fn add_move_delete_keep_maps_consistent() {
    let mut store = store_with(vec![TreeNode::new(
        SceneNode::frame(id("it_page")).sized(400.0, 400.0),
        vec![],
    )]);

    let a = store
        .add_node(SceneNode::rect(id("it_a")), Some(id("it_page")), None)
        .unwrap();
    let b = store
        .add_node(SceneNode::rect(id("it_b")), Some(id("it_page")), Some(0))
        .unwrap();
    assert_eq!(store.graph().children(id("it_page")), &[b, a]);
    assert_consistent(&store);

    assert!(store.move_node(a, None, 0));
    assert_eq!(store.graph().root_ids, vec![a, id("it_page")]);
    assert_eq!(store.graph().parent(a), None);
    assert_consistent(&store);

    assert!(store.bring_to_front(a));
    assert_eq!(store.graph().root_ids, vec![id("it_page"), a]);

    assert!(store.delete_node(id("it_page")));
    assert!(!store.graph().contains(b));
    assert_eq!(store.graph().root_ids, vec![a]);
    assert_consistent(&store);
}

#[test]
fn move_into_own_descendant_is_refused() {
    let mut store = store_with(vec![TreeNode::new(
        SceneNode::frame(id("it_cy_outer")),
        vec![TreeNode::new(
            SceneNode::frame(id("it_cy_mid")),
            vec![TreeNode::new(SceneNode::frame(id("it_cy_leaf")), vec![])],
        )],
    )]);
    assert!(!store.move_node(id("it_cy_outer"), Some(id("it_cy_leaf")), 0));
    assert!(!store.move_node(id("it_cy_mid"), Some(id("it_cy_mid")), 0));
    assert_eq!(store.graph().parent(id("it_cy_mid")), Some(id("it_cy_outer")));
    assert!(!store.can_undo());
    assert_consistent(&store);
}

#[test]
fn leaf_cannot_take_children() {
    let mut store = store_with(vec![rect("it_leaf", 0.0, 0.0, 10.0, 10.0)]);
    assert_eq!(
        store.add_node(SceneNode::rect(id("it_orphan")), Some(id("it_leaf")), None),
        None
    );
    assert!(!store.graph().contains(id("it_orphan")));
    assert_consistent(&store);
}

#[test]
fn stored_ids_cannot_look_like_instance_paths() {
    let mut store = store_with(vec![rect("it_sep_a", 0.0, 0.0, 10.0, 10.0)]);
    assert_eq!(store.add_node(SceneNode::rect(id("it_sep_a/b")), None, None), None);
    assert!(!store.graph().contains(id("it_sep_a/b")));
    assert!(!store.can_undo());
    assert!(FlatGraph::from_tree(vec![rect("it_sep_x/y", 0.0, 0.0, 1.0, 1.0)]).is_err());
    assert_consistent(&store);
}

#[test]
fn delete_cascades_and_prunes_selection() {
    let mut store = store_with(vec![TreeNode::new(
        SceneNode::frame(id("it_del_frame")),
        vec![
            rect("it_del_a", 0.0, 0.0, 5.0, 5.0),
            TreeNode::new(
                SceneNode::group(id("it_del_group")),
                vec![rect("it_del_b", 0.0, 0.0, 5.0, 5.0)],
            ),
        ],
    )]);
    store.set_selected_ids(vec![id("it_del_a"), id("it_del_b")]);
    assert_eq!(store.delete_nodes(&[id("it_del_frame")]), 4);
    assert!(store.graph().is_empty());
    assert!(store.selection().selected_ids.is_empty());
    assert_consistent(&store);
}

// ─── History ────────────────────────────────────────────────────────────

#[test]
fn undo_redo_round_trips_graph_and_selection() {
    let mut store = store_with(vec![TreeNode::new(
        SceneNode::frame(id("it_h_frame")).sized(100.0, 100.0),
        vec![rect("it_h_rect", 10.0, 10.0, 20.0, 20.0)],
    )]);
    store.select(id("it_h_rect"), false);
    let before = store.snapshot();

    store.update_node(id("it_h_rect"), &NodePatch::position(50.0, 60.0));
    store.delete_node(id("it_h_rect"));
    let after = store.snapshot();
    assert!(store.selection().selected_ids.is_empty());

    assert!(store.undo());
    assert!(store.undo());
    assert_eq!(store.snapshot(), before);
    assert!(!store.undo());

    assert!(store.redo());
    assert!(store.redo());
    assert_eq!(store.snapshot(), after);
    assert!(!store.redo());
    assert_consistent(&store);
}

#[test]
fn gesture_batch_is_one_undo_step() {
    let mut store = store_with(vec![rect("it_b_rect", 0.0, 0.0, 10.0, 10.0)]);
    store.begin_batch();
    for step in 1..=10 {
        store.update_node(id("it_b_rect"), &NodePatch::position(step as f32, 0.0));
    }
    store.end_batch();
    assert_eq!(store.get_node(id("it_b_rect")).map(|n| n.x), Some(10.0));

    assert!(store.undo());
    assert_eq!(store.get_node(id("it_b_rect")).map(|n| n.x), Some(0.0));
    assert!(!store.can_undo());
}

#[test]
fn batched_scrub_without_history_is_one_undo_step() {
    let mut store = store_with(vec![rect("it_scrub", 0.0, 0.0, 10.0, 10.0)]);
    store.begin_batch();
    for x in [5.0, 10.0, 15.0] {
        assert!(store.update_node_without_history(id("it_scrub"), &NodePatch::position(x, 0.0)));
    }
    store.end_batch();
    assert_eq!(store.get_node(id("it_scrub")).map(|n| n.x), Some(15.0));

    assert!(store.undo());
    assert_eq!(store.get_node(id("it_scrub")).map(|n| n.x), Some(0.0));
    assert!(!store.can_undo());
}

#[test]
fn saved_history_covers_unbatched_scrub() {
    let mut store = store_with(vec![rect("it_save", 0.0, 0.0, 10.0, 10.0)]);
    store.save_history();
    store.update_node_without_history(id("it_save"), &NodePatch::position(4.0, 0.0));
    store.update_node_without_history(id("it_save"), &NodePatch::position(8.0, 0.0));

    assert!(store.undo());
    assert_eq!(store.get_node(id("it_save")).map(|n| n.x), Some(0.0));
    assert!(!store.can_undo());
}

#[test]
fn undo_restores_selection_without_dangling_ids() {
    let mut store = store_with(vec![]);
    let a = store
        .add_node(SceneNode::rect(id("it_sel_a")), None, None)
        .unwrap();
    store.select(a, false);
    store.clear_selection();
    // Undo the add: the selection snapshot from before it had no `a`.
    assert!(store.undo());
    assert!(!store.graph().contains(a));
    assert!(store.selection().selected_ids.is_empty());
}

// ─── Layout ─────────────────────────────────────────────────────────────

#[test]
fn row_layout_places_second_child_at_58() {
    let store = store_with(vec![TreeNode::new(
        SceneNode::frame(id("it_row"))
            .sized(300.0, 80.0)
            .with_layout(AutoLayout::flow(FlexDirection::Row, 8.0)),
        vec![
            rect("it_row_a", 0.0, 0.0, 50.0, 20.0),
            rect("it_row_b", 0.0, 0.0, 60.0, 20.0),
        ],
    )]);
    assert_eq!(store.absolute_bounds(id("it_row_b")).map(|b| b.x), Some(58.0));
    assert_eq!(store.absolute_bounds(id("it_row")).map(|b| b.width), Some(300.0));
}

#[test]
fn fit_content_column_is_58_tall() {
    let mut layout = AutoLayout::flow(FlexDirection::Column, 4.0);
    layout.padding.top = 2.0;
    layout.padding.bottom = 2.0;
    let store = store_with(vec![TreeNode::new(
        SceneNode::frame(id("it_col"))
            .sized(100.0, 999.0)
            .with_sizing(SizingMode::Fixed, SizingMode::FitContent)
            .with_layout(layout),
        vec![
            rect("it_col_a", 0.0, 0.0, 40.0, 20.0),
            rect("it_col_b", 0.0, 0.0, 40.0, 30.0),
        ],
    )]);
    assert_eq!(store.absolute_bounds(id("it_col")).map(|b| b.height), Some(58.0));
    assert_eq!(store.absolute_bounds(id("it_col_b")).map(|b| b.y), Some(26.0));
}

#[test]
fn text_remeasure_is_idempotent() {
    let mut store = store_with(vec![]);
    let text = store.create_text(None, 0.0, 0.0, "Hi").unwrap();
    let patch = NodePatch::text("Hello, layout");

    assert!(store.update_node(text, &patch));
    let first = store.get_node(text).map(|n| (n.width, n.height));
    assert!(!store.update_node(text, &patch));
    let second = store.get_node(text).map(|n| (n.width, n.height));
    assert_eq!(first, second);
    assert!(first.is_some_and(|(w, h)| w > 0.0 && h > 0.0));
}

#[test]
fn path_nodes_take_their_size_from_geometry() {
    let mut store = store_with(vec![]);
    let path = SceneNode::new(
        id("it_path"),
        NodeKind::Path {
            geometry: "M0 0 L40 0 L40 30 Z".to_string(),
            clip_geometry: None,
        },
    );
    let path = store.add_node(path, None, None).unwrap();
    assert_eq!(store.get_node(path).map(|n| (n.width, n.height)), Some((40.0, 30.0)));

    let reshape = NodePatch {
        geometry: Some("M0 0 l10 20".to_string()),
        ..Default::default()
    };
    assert!(store.update_node(path, &reshape));
    assert_eq!(store.get_node(path).map(|n| (n.width, n.height)), Some((10.0, 20.0)));

    // Broken data keeps the last good size.
    let broken = NodePatch {
        geometry: Some("M0 0 L".to_string()),
        ..Default::default()
    };
    assert!(store.update_node(path, &broken));
    assert_eq!(store.get_node(path).map(|n| (n.width, n.height)), Some((10.0, 20.0)));
}

/// Measurer whose glyph advance changes when a "font" finishes loading.
struct LoadingFontMeasurer {
    advance: Rc<Cell<f32>>,
}

impl TextMeasurer for LoadingFontMeasurer {
    fn measure(&self, text: &TextProps, max_width: Option<f32>) -> TextMetrics {
        EstimatedMeasurer {
            advance: self.advance.get(),
        }
        .measure(text, max_width)
    }
}

#[test]
fn remeasure_after_font_load_resizes_without_undo_entry() {
    init();
    let advance = Rc::new(Cell::new(0.5));
    let measurer = LoadingFontMeasurer {
        advance: Rc::clone(&advance),
    };
    let mut store = SceneStore::with_measurer(StoreConfig::default(), Box::new(measurer));
    let text = store.create_text(None, 0.0, 0.0, "Loading").unwrap();
    store.clear_history();
    let before = store.get_node(text).map(|n| n.width).unwrap();

    advance.set(1.0);
    assert_eq!(store.remeasure_all_text(), 1);
    let after = store.get_node(text).map(|n| n.width).unwrap();
    assert!(after > before);
    assert!(!store.can_undo());

    assert_eq!(store.remeasure_all_text(), 0);
}

// ─── Group / duplicate / clipboard ──────────────────────────────────────

#[test]
fn duplicate_places_offset_copy_after_original() {
    let mut store = store_with(vec![TreeNode::new(
        SceneNode::frame(id("it_dup_frame")).at(10.0, 10.0).sized(50.0, 50.0),
        vec![rect("it_dup_child", 5.0, 5.0, 10.0, 10.0)],
    )]);
    let copies = store.duplicate_nodes(&[id("it_dup_frame")]);
    assert_eq!(copies.len(), 1);
    let copy = copies[0];
    assert_ne!(copy, id("it_dup_frame"));
    assert_eq!(store.graph().root_ids, vec![id("it_dup_frame"), copy]);
    assert_eq!(store.get_node(copy).map(|n| (n.x, n.y)), Some((30.0, 30.0)));

    let copied_child = store.graph().children(copy)[0];
    assert_ne!(copied_child, id("it_dup_child"));
    assert_eq!(store.selection().selected_ids, vec![copy]);
    assert_consistent(&store);
}

#[test]
fn paste_assigns_fresh_ids_and_offsets() {
    let mut store = store_with(vec![TreeNode::new(
        SceneNode::frame(id("it_cp_frame")).sized(50.0, 50.0),
        vec![rect("it_cp_child", 0.0, 0.0, 10.0, 10.0)],
    )]);
    let payload = clipboard::copy(store.graph(), &[id("it_cp_frame")]);
    let bytes = clipboard::encode(&payload).unwrap();
    let decoded = clipboard::decode(&bytes).unwrap();

    let pasted = store.paste(&decoded, None);
    assert_eq!(pasted.len(), 1);
    let root = pasted[0];
    assert_ne!(root, id("it_cp_frame"));
    assert_eq!(store.get_node(root).map(|n| (n.x, n.y)), Some((10.0, 10.0)));
    assert_eq!(store.graph().children(root).len(), 1);
    assert_eq!(store.graph().len(), 4);

    // Pasting after the source is gone lands in place.
    store.delete_node(id("it_cp_frame"));
    let again = store.paste(&decoded, None);
    assert_eq!(store.get_node(again[0]).map(|n| (n.x, n.y)), Some((0.0, 0.0)));
    assert_consistent(&store);
}

#[test]
fn reparent_keeps_screen_position() {
    let mut store = store_with(vec![
        TreeNode::new(
            SceneNode::frame(id("it_rp_target")).at(100.0, 50.0).sized(200.0, 200.0),
            vec![],
        ),
        rect("it_rp_rect", 130.0, 80.0, 10.0, 10.0),
    ]);
    assert!(store.reparent_preserving_position(
        id("it_rp_rect"),
        Some(id("it_rp_target")),
        None
    ));
    assert_eq!(
        store.get_node(id("it_rp_rect")).map(|n| (n.x, n.y)),
        Some((30.0, 30.0))
    );
    assert_eq!(
        store.absolute_bounds(id("it_rp_rect")).map(|b| (b.x, b.y)),
        Some((130.0, 80.0))
    );
}
