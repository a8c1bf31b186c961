//! Copy/paste payloads.
//!
//! A payload is a list of detached subtrees. It travels as MessagePack
//! (`rmp-serde`, named fields, since node kinds are internally tagged).
//! Pasting always assigns fresh ids; see `remap_trees`.

use crate::error::ClipboardError;
use crate::graph::FlatGraph;
use crate::id::NodeId;
use crate::model::{SceneNode, TreeNode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClipboardPayload {
    pub trees: Vec<TreeNode>,
}

impl ClipboardPayload {
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Ids of the copied roots, as they were in the source document.
    pub fn root_ids(&self) -> Vec<NodeId> {
        self.trees.iter().map(TreeNode::id).collect()
    }
}

/// Copy the subtrees rooted at `ids`. Ids nested under another copied id
/// are folded into their ancestor's subtree; unknown ids are skipped.
pub fn copy(graph: &FlatGraph, ids: &[NodeId]) -> ClipboardPayload {
    let trees = ids
        .iter()
        .filter(|&&id| !ids.iter().any(|&other| graph.is_ancestor_of(other, id)))
        .filter_map(|&id| graph.subtree(id))
        .collect();
    ClipboardPayload { trees }
}

pub fn encode(payload: &ClipboardPayload) -> Result<Vec<u8>, ClipboardError> {
    if payload.is_empty() {
        return Err(ClipboardError::Empty);
    }
    Ok(rmp_serde::to_vec_named(payload)?)
}

pub fn decode(bytes: &[u8]) -> Result<ClipboardPayload, ClipboardError> {
    let payload: ClipboardPayload = rmp_serde::from_slice(bytes)?;
    if payload.is_empty() {
        return Err(ClipboardError::Empty);
    }
    Ok(payload)
}

/// Give every node in `trees` (slot content included) a new id from
/// `fresh`. Instances that reference a component copied along with them are
/// pointed at the copy, and their override keys follow the copied template
/// ids. Returns the old → new mapping.
pub fn remap_trees(
    trees: &mut [TreeNode],
    fresh: &mut impl FnMut(&SceneNode) -> NodeId,
) -> HashMap<NodeId, NodeId> {
    let mut mapping = HashMap::new();
    for tree in trees.iter() {
        assign(tree, fresh, &mut mapping);
    }
    for tree in trees.iter_mut() {
        rewrite(tree, &mapping);
    }
    mapping
}

fn assign(
    tree: &TreeNode,
    fresh: &mut impl FnMut(&SceneNode) -> NodeId,
    mapping: &mut HashMap<NodeId, NodeId>,
) {
    let new_id = fresh(&tree.node);
    mapping.insert(tree.node.id, new_id);
    if let Some(props) = tree.node.instance_props() {
        for content in props.slot_content.values() {
            assign(content, fresh, mapping);
        }
    }
    for child in &tree.children {
        assign(child, fresh, mapping);
    }
}

fn rewrite(tree: &mut TreeNode, mapping: &HashMap<NodeId, NodeId>) {
    if let Some(&new_id) = mapping.get(&tree.node.id) {
        tree.node.id = new_id;
    }
    if let Some(props) = tree.node.instance_props_mut()
        && let Some(&copied) = mapping.get(&props.component_id)
    {
        props.component_id = copied;
        let remap = |k: NodeId| mapping.get(&k).copied().unwrap_or(k);
        props.descendants = std::mem::take(&mut props.descendants)
            .into_iter()
            .map(|(k, v)| (remap(k), v))
            .collect();
        props.slot_content = std::mem::take(&mut props.slot_content)
            .into_iter()
            .map(|(k, v)| (remap(k), v))
            .collect();
    }
    if let Some(props) = tree.node.instance_props_mut() {
        for content in props.slot_content.values_mut() {
            rewrite(content, mapping);
        }
    }
    for child in &mut tree.children {
        rewrite(child, mapping);
    }
}
