//! Hit testing: point / marquee → node lookup.
//!
//! Walks the resolved tree with the layout index. Candidates are the
//! children of the scope container (the entered container, or the document
//! roots), checked front to back; a candidate is hit when the point lands on
//! it or on anything drawn inside it.

use crate::component::RenderNode;
use crate::id::NodeId;
use crate::layout::LaidOut;
use crate::model::{NodeKind, ResolvedBounds};
use std::collections::HashMap;

fn scope_children<'a>(roots: &'a [RenderNode], scope: Option<NodeId>) -> &'a [RenderNode] {
    match scope {
        Some(id) => roots
            .iter()
            .find_map(|r| r.find(id))
            .map(|n| n.children.as_slice())
            .unwrap_or(&[]),
        None => roots,
    }
}

/// Topmost child of `scope` under (px, py). `None` for background.
pub fn hit_test(
    roots: &[RenderNode],
    index: &HashMap<NodeId, LaidOut>,
    px: f32,
    py: f32,
    scope: Option<NodeId>,
) -> Option<NodeId> {
    scope_children(roots, scope)
        .iter()
        .rev()
        .find(|c| hits(c, index, px, py))
        .map(|c| c.id)
}

/// Deepest node under (px, py), instance descendants included (path ids).
pub fn hit_test_deep(
    roots: &[RenderNode],
    index: &HashMap<NodeId, LaidOut>,
    px: f32,
    py: f32,
) -> Option<NodeId> {
    roots.iter().rev().find_map(|r| deepest(r, index, px, py))
}

fn hits(node: &RenderNode, index: &HashMap<NodeId, LaidOut>, px: f32, py: f32) -> bool {
    deepest(node, index, px, py).is_some()
}

fn deepest(
    node: &RenderNode,
    index: &HashMap<NodeId, LaidOut>,
    px: f32,
    py: f32,
) -> Option<NodeId> {
    if !node.node.visible || !node.node.enabled {
        return None;
    }
    let bounds = index.get(&node.id);
    let inside = bounds.is_some_and(|b| b.absolute.contains(px, py));
    let clips = node.node.frame_props().is_some_and(|f| f.clip);

    if !clips || inside {
        for child in node.children.iter().rev() {
            if let Some(hit) = deepest(child, index, px, py) {
                return Some(hit);
            }
        }
    }
    // Groups are only as solid as their children.
    if inside && !matches!(node.node.kind, NodeKind::Group) {
        return Some(node.id);
    }
    None
}

/// Children of `scope` whose bounds intersect the marquee rect, in render
/// order.
pub fn hit_test_rect(
    roots: &[RenderNode],
    index: &HashMap<NodeId, LaidOut>,
    rect: ResolvedBounds,
    scope: Option<NodeId>,
) -> Vec<NodeId> {
    scope_children(roots, scope)
        .iter()
        .filter(|c| c.node.visible && c.node.enabled)
        .filter(|c| index.get(&c.id).is_some_and(|b| b.absolute.intersects(&rect)))
        .map(|c| c.id)
        .collect()
}
