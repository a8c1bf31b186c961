//! Normalized scene storage.
//!
//! `FlatGraph` keeps four maps that must always agree: every node lives in
//! `nodes_by_id`, has an entry in `parent_by_id` (`None` for roots), appears
//! in exactly one of `children_by_id[parent]` / `root_ids`, and every
//! container owns a (possibly empty) `children_by_id` entry. The helpers
//! here are the only code that edits those maps, so each one leaves them
//! consistent.

use crate::error::StoreError;
use crate::id::NodeId;
use crate::model::{SceneNode, TreeNode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlatGraph {
    pub nodes_by_id: HashMap<NodeId, SceneNode>,
    pub parent_by_id: HashMap<NodeId, Option<NodeId>>,
    pub children_by_id: HashMap<NodeId, Vec<NodeId>>,
    pub root_ids: Vec<NodeId>,
}

impl FlatGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a nested tree, e.g. an imported document.
    pub fn from_tree(roots: Vec<TreeNode>) -> Result<Self, StoreError> {
        let mut graph = Self::new();
        for root in roots {
            graph.insert_subtree(root, None, None)?;
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.nodes_by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes_by_id.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes_by_id.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes_by_id.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes_by_id.get_mut(&id)
    }

    /// Parent of `id`, `None` for roots and unknown ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent_by_id.get(&id).copied().flatten()
    }

    /// Children in render order (back to front). Empty for leaves.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children_by_id
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The list `id` lives in: its parent's children, or the roots.
    pub fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &self.root_ids,
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        self.siblings(id).iter().position(|&s| s == id)
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = descendant;
        let mut steps = 0;
        while let Some(parent) = self.parent(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
            steps += 1;
            if steps > self.len() {
                log::warn!("parent chain of {descendant} does not terminate");
                return false;
            }
        }
        false
    }

    /// Ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if out.len() > self.len() {
                break;
            }
            out.push(parent);
            current = parent;
        }
        out
    }

    /// All descendants in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev());
        }
        out
    }

    /// Nested view of one node and everything under it.
    pub fn subtree(&self, id: NodeId) -> Option<TreeNode> {
        let node = self.get(id)?.clone();
        let children = self
            .children(id)
            .iter()
            .filter_map(|&c| self.subtree(c))
            .collect();
        Some(TreeNode::new(node, children))
    }

    /// Nested view of the whole document, roots in order.
    pub fn build_tree(&self) -> Vec<TreeNode> {
        self.root_ids
            .iter()
            .filter_map(|&id| self.subtree(id))
            .collect()
    }

    // ─── Low-level edits ─────────────────────────────────────────────────

    /// Insert a whole subtree under `parent` (or as a root) at `index`
    /// (appended when `None` or past the end). Every id in the subtree must
    /// be new to the graph, unique within the subtree, and free of the path
    /// separator so it cannot collide with an instance path.
    pub fn insert_subtree(
        &mut self,
        tree: TreeNode,
        parent: Option<NodeId>,
        index: Option<usize>,
    ) -> Result<NodeId, StoreError> {
        if let Some(p) = parent {
            let parent_node = self.get(p).ok_or(StoreError::UnknownNode(p))?;
            if !parent_node.is_container() {
                return Err(StoreError::NotAContainer(p));
            }
        }

        let mut seen = HashSet::new();
        for id in tree.ids() {
            if id.is_path() {
                return Err(StoreError::ReservedId(id));
            }
            if self.contains(id) || !seen.insert(id) {
                return Err(StoreError::DuplicateId(id));
            }
        }
        check_children_allowed(&tree)?;

        let root_id = tree.id();
        self.insert_unchecked(tree, parent);
        self.link(root_id, parent, index);
        Ok(root_id)
    }

    fn insert_unchecked(&mut self, tree: TreeNode, parent: Option<NodeId>) {
        let TreeNode { node, children } = tree;
        let id = node.id;
        if node.is_container() {
            self.children_by_id.insert(id, Vec::with_capacity(children.len()));
        }
        self.nodes_by_id.insert(id, node);
        self.parent_by_id.insert(id, parent);
        for child in children {
            let child_id = child.id();
            self.insert_unchecked(child, Some(id));
            if let Some(list) = self.children_by_id.get_mut(&id) {
                list.push(child_id);
            }
        }
    }

    /// Attach an unlinked node to `parent` (or the roots) at `index`.
    fn link(&mut self, id: NodeId, parent: Option<NodeId>, index: Option<usize>) {
        let list = match parent {
            Some(p) => self.children_by_id.entry(p).or_default(),
            None => &mut self.root_ids,
        };
        let at = index.unwrap_or(list.len()).min(list.len());
        list.insert(at, id);
        self.parent_by_id.insert(id, parent);
    }

    /// Detach `id` from its parent's list (or the roots). Returns the index
    /// it occupied. The node stays in `nodes_by_id`.
    fn unlink(&mut self, id: NodeId) -> Option<usize> {
        let list = match self.parent(id) {
            Some(p) => self.children_by_id.get_mut(&p)?,
            None => &mut self.root_ids,
        };
        let pos = list.iter().position(|&c| c == id)?;
        list.remove(pos);
        Some(pos)
    }

    /// Remove `id` and every descendant from all maps. Returns the removed
    /// nodes, descendants first.
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<SceneNode> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.unlink(id);

        let mut doomed = self.descendants(id);
        doomed.reverse();
        doomed.push(id);

        let mut removed = Vec::with_capacity(doomed.len());
        for gone in doomed {
            self.parent_by_id.remove(&gone);
            self.children_by_id.remove(&gone);
            if let Some(node) = self.nodes_by_id.remove(&gone) {
                removed.push(node);
            }
        }
        removed
    }

    /// Move `id` under `new_parent` (or to the roots) at `index`. The index
    /// counts positions in the destination list after `id` has been removed.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
        index: usize,
    ) -> Result<(), StoreError> {
        if !self.contains(id) {
            return Err(StoreError::UnknownNode(id));
        }
        if let Some(p) = new_parent {
            let parent_node = self.get(p).ok_or(StoreError::UnknownNode(p))?;
            if !parent_node.is_container() {
                return Err(StoreError::NotAContainer(p));
            }
            if p == id || self.is_ancestor_of(id, p) {
                return Err(StoreError::Cycle {
                    node: id,
                    parent: p,
                });
            }
        }
        self.unlink(id);
        self.link(id, new_parent, Some(index));
        Ok(())
    }

    /// Verify every structural invariant; returns the first violation.
    pub fn check_consistency(&self) -> Result<(), StoreError> {
        let fail = |msg: String| Err(StoreError::Inconsistent(msg));

        if self.parent_by_id.len() != self.nodes_by_id.len() {
            return fail(format!(
                "{} parent entries for {} nodes",
                self.parent_by_id.len(),
                self.nodes_by_id.len()
            ));
        }

        let mut placed: HashSet<NodeId> = HashSet::new();
        for &root in &self.root_ids {
            if !self.contains(root) {
                return fail(format!("root {root} has no node"));
            }
            if self.parent(root).is_some() {
                return fail(format!("root {root} has a parent"));
            }
            if !placed.insert(root) {
                return fail(format!("{root} listed twice"));
            }
        }

        for (&parent, kids) in &self.children_by_id {
            match self.get(parent) {
                Some(node) if node.is_container() => {}
                Some(_) => return fail(format!("leaf {parent} has a children entry")),
                None => return fail(format!("children entry for missing {parent}")),
            }
            for &kid in kids {
                if !self.contains(kid) {
                    return fail(format!("{parent} lists missing child {kid}"));
                }
                if self.parent(kid) != Some(parent) {
                    return fail(format!("{kid} listed under {parent} but parented elsewhere"));
                }
                if !placed.insert(kid) {
                    return fail(format!("{kid} listed twice"));
                }
            }
        }

        for (&id, node) in &self.nodes_by_id {
            if !self.parent_by_id.contains_key(&id) {
                return fail(format!("{id} has no parent entry"));
            }
            if node.is_container() && !self.children_by_id.contains_key(&id) {
                return fail(format!("container {id} has no children entry"));
            }
            if !placed.contains(&id) {
                return fail(format!("{id} is detached"));
            }
        }

        // Every node reachable from the roots exactly once rules out cycles.
        let mut reached = 0usize;
        let mut stack: Vec<NodeId> = self.root_ids.clone();
        let mut visited = HashSet::new();
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                return fail(format!("{id} reached twice"));
            }
            reached += 1;
            stack.extend(self.children(id));
        }
        if reached != self.len() {
            return fail(format!("{reached} of {} nodes reachable", self.len()));
        }
        Ok(())
    }
}

/// Leaves may not carry children in a nested tree.
fn check_children_allowed(tree: &TreeNode) -> Result<(), StoreError> {
    if !tree.children.is_empty() && !tree.node.is_container() {
        return Err(StoreError::NotAContainer(tree.id()));
    }
    tree.children.iter().try_for_each(check_children_allowed)
}
