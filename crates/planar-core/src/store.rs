//! The scene store: single owner of the document state.
//!
//! `SceneStore` wraps the flat graph with history, selection, text
//! measurement, caches, and change notification. Every public mutation
//! snapshots the pre-mutation state into history (unless it says
//! `without_history`), keeps the four graph maps consistent, bumps the
//! version, drops the derived caches, and notifies subscribers.
//!
//! Refused mutations are no-ops: they log a warning and report `false` /
//! `None`. A mutation that fails half-way restores the graph it started
//! from, so the maps are never left partially edited.

use crate::clipboard::{self, ClipboardPayload};
use crate::component::{
    self, ComponentGraph, RenderNode, find_component, referenced_components, resolve_tree,
};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::geometry::{self, Alignment, Axis, Deltas};
use crate::graph::FlatGraph;
use crate::hit;
use crate::history::{History, Snapshot};
use crate::id::NodeId;
use crate::layout::{LaidOut, resolve_tree_layout, resolved_size};
use crate::model::{
    DescendantOverride, NodeKind, OverrideField, ResolvedBounds, SceneNode, TreeNode,
};
use crate::patch::NodePatch;
use crate::path_data;
use crate::selection::{EditingMode, EscapeOutcome, SelectionState};
use crate::text::{EstimatedMeasurer, TextMeasurer, sync_text_size};
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What a write touched.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    Added(Vec<NodeId>),
    Updated(Vec<NodeId>),
    Removed(Vec<NodeId>),
    Moved(Vec<NodeId>),
    /// Whole-document replacement: `set_nodes`, undo, redo, cancelled gesture.
    Replaced,
    /// Selection or interaction context only; the document is unchanged.
    Selection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreEvent {
    /// Document version after the change.
    pub version: u64,
    pub change: StoreChange,
}

pub type Subscriber = Box<dyn FnMut(&StoreEvent)>;

/// Resolved tree with auto-layout applied, plus its layout index.
struct Resolved {
    roots: Vec<RenderNode>,
    index: HashMap<NodeId, LaidOut>,
}

pub struct SceneStore {
    graph: FlatGraph,
    selection: SelectionState,
    history: History,
    measurer: Box<dyn TextMeasurer>,
    config: StoreConfig,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    version: u64,
    tree_cache: OnceCell<Vec<TreeNode>>,
    resolved_cache: OnceCell<Resolved>,
}

impl Default for SceneStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl SceneStore {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_measurer(config, Box::new(EstimatedMeasurer::default()))
    }

    pub fn with_measurer(config: StoreConfig, measurer: Box<dyn TextMeasurer>) -> Self {
        Self {
            graph: FlatGraph::new(),
            selection: SelectionState::new(),
            history: History::new(config.history_depth),
            measurer,
            config,
            subscribers: Vec::new(),
            next_subscription: 0,
            version: 0,
            tree_cache: OnceCell::new(),
            resolved_cache: OnceCell::new(),
        }
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn graph(&self) -> &FlatGraph {
        &self.graph
    }

    pub fn get_node(&self, id: NodeId) -> Option<&SceneNode> {
        self.graph.get(id)
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Nested view of the document, cached until the next write.
    pub fn get_nodes(&self) -> &[TreeNode] {
        self.tree_cache.get_or_init(|| self.graph.build_tree())
    }

    fn resolved(&self) -> &Resolved {
        self.resolved_cache.get_or_init(|| {
            let mut roots = resolve_tree(&self.graph);
            let index = resolve_tree_layout(&roots);
            for root in &mut roots {
                apply_layout(root, &index);
            }
            Resolved { roots, index }
        })
    }

    /// Document with instances resolved and auto-layout geometry written
    /// into each node's `x/y/width/height`. Cached until the next write.
    pub fn render_tree(&self) -> &[RenderNode] {
        &self.resolved().roots
    }

    /// Local and absolute bounds for every rendered id.
    pub fn layout_index(&self) -> &HashMap<NodeId, LaidOut> {
        &self.resolved().index
    }

    /// Rendered node for `id`, path ids included.
    pub fn render_node(&self, id: NodeId) -> Option<&RenderNode> {
        self.render_tree().iter().find_map(|r| r.find(id))
    }

    /// Absolute bounds after layout. Ancestor rotation is not applied.
    pub fn absolute_bounds(&self, id: NodeId) -> Option<ResolvedBounds> {
        self.layout_index().get(&id).map(|l| l.absolute)
    }

    /// Absolute bounds grown to cover the node's own rotation.
    pub fn visual_bounds(&self, id: NodeId) -> Option<ResolvedBounds> {
        let bounds = self.absolute_bounds(id)?;
        let rotation = self.render_node(id).map_or(0.0, |n| n.node.rotation);
        Some(geometry::rotated_aabb(bounds, rotation))
    }

    /// Union of the selected nodes' visual bounds.
    pub fn selection_bounds(&self) -> Option<ResolvedBounds> {
        let rects: Vec<ResolvedBounds> = self
            .selection
            .selected_ids
            .iter()
            .filter_map(|&id| self.visual_bounds(id))
            .collect();
        geometry::selection_bounds(&rects)
    }

    /// Topmost node at a canvas point, scoped to the entered container.
    pub fn hit_test(&self, px: f32, py: f32) -> Option<NodeId> {
        let resolved = self.resolved();
        hit::hit_test(
            &resolved.roots,
            &resolved.index,
            px,
            py,
            self.selection.entered_container_id,
        )
    }

    /// The template descendant of `instance` drawn under (px, py): the
    /// first path segment below the instance, so a point inside a nested
    /// instance yields that nested instance.
    pub fn instance_descendant_at(&self, instance: NodeId, px: f32, py: f32) -> Option<NodeId> {
        let resolved = self.resolved();
        let mut current = hit::hit_test_deep(&resolved.roots, &resolved.index, px, py)?;
        loop {
            let (head, tail) = current.split_path()?;
            if head == instance {
                return Some(tail);
            }
            current = head;
        }
    }

    /// Nodes touched by a marquee, scoped to the entered container.
    pub fn hit_test_rect(&self, rect: ResolvedBounds) -> Vec<NodeId> {
        let resolved = self.resolved();
        hit::hit_test_rect(
            &resolved.roots,
            &resolved.index,
            rect,
            self.selection.entered_container_id,
        )
    }

    /// The node's position is derived by its parent's auto-layout.
    pub fn is_layout_driven(&self, id: NodeId) -> bool {
        let Some(node) = self.graph.get(id) else {
            return false;
        };
        node.in_flow()
            && self
                .graph
                .parent(id)
                .and_then(|p| self.graph.get(p))
                .is_some_and(|p| p.auto_layout().is_some())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            graph: self.graph.clone(),
            selection: self.selection.snapshot(),
        }
    }

    // ─── Subscriptions ───────────────────────────────────────────────────

    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self, change: StoreChange) {
        let event = StoreEvent {
            version: self.version,
            change,
        };
        for (_, callback) in &mut self.subscribers {
            callback(&event);
        }
    }

    // ─── Write plumbing ──────────────────────────────────────────────────

    /// Bump the version, drop derived views, prune dangling selection, and
    /// notify.
    fn commit(&mut self, change: StoreChange) {
        self.version += 1;
        self.tree_cache.take();
        self.resolved_cache.take();
        self.selection.prune(&self.graph);
        log::debug!("store v{}: {change:?}", self.version);
        self.notify(change);
    }

    /// Run one mutation as one undo step. `f` reports the change it made,
    /// or `None` when nothing changed (no history entry, no notification).
    fn transact<R>(
        &mut self,
        label: &str,
        f: impl FnOnce(&mut Self) -> Result<(R, Option<StoreChange>), StoreError>,
    ) -> Option<R> {
        let before = self.snapshot();
        match f(self) {
            Ok((value, Some(change))) => {
                self.history.record(before);
                self.commit(change);
                Some(value)
            }
            Ok((value, None)) => Some(value),
            Err(err) => {
                log::warn!("{label} refused: {err}");
                self.graph = before.graph;
                None
            }
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.graph = snapshot.graph;
        self.selection.restore(&snapshot.selection, &self.graph);
        self.commit(StoreChange::Replaced);
    }

    /// Derive the size of nodes measured from their content: text and
    /// path geometry.
    fn sync_content_size(&mut self, id: NodeId) -> bool {
        let measurer = &*self.measurer;
        self.graph.get_mut(id).is_some_and(|node| {
            sync_text_size(node, measurer) | path_data::sync_path_size(node)
        })
    }

    fn sync_text(&mut self, id: NodeId) -> bool {
        let measurer = &*self.measurer;
        self.graph
            .get_mut(id)
            .is_some_and(|node| sync_text_size(node, measurer))
    }

    /// Ids that slot content already uses. Stored nodes are checked through
    /// the graph directly.
    fn slot_ids(&self) -> HashSet<NodeId> {
        self.graph
            .nodes_by_id
            .values()
            .filter_map(SceneNode::instance_props)
            .flat_map(|p| p.slot_content.values())
            .flat_map(TreeNode::ids)
            .collect()
    }

    fn fresh_id(&self, prefix: &str, reserved: &HashSet<NodeId>) -> NodeId {
        loop {
            let id = NodeId::with_prefix(prefix);
            if !self.graph.contains(id) && !reserved.contains(&id) {
                return id;
            }
        }
    }

    /// A new id unused anywhere in the document, e.g. `rect_12`.
    pub fn generate_id(&self, prefix: &str) -> NodeId {
        self.fresh_id(prefix, &self.slot_ids())
    }

    /// Give every node in `trees` a fresh id. Returns the old → new map.
    fn remap_fresh(&self, trees: &mut [TreeNode]) -> HashMap<NodeId, NodeId> {
        let mut reserved = self.slot_ids();
        clipboard::remap_trees(trees, &mut |node: &SceneNode| {
            let id = self.fresh_id(node.kind.type_name(), &reserved);
            reserved.insert(id);
            id
        })
    }

    /// Instances in `tree` must reference a component that exists (in the
    /// document or in `tree` itself) and must not make any component
    /// enclosing `parent` contain itself.
    fn validate_instances(&self, tree: &TreeNode, parent: Option<NodeId>) -> Result<(), StoreError> {
        let referenced = referenced_components(tree);
        if referenced.is_empty() {
            return Ok(());
        }
        for &component_id in &referenced {
            let in_doc = find_component(&self.graph, component_id).is_some();
            let in_tree = tree
                .find(component_id)
                .is_some_and(|t| t.node.is_component());
            if !in_doc && !in_tree {
                return Err(StoreError::UnknownComponent(component_id));
            }
        }
        let deps = ComponentGraph::build(&self.graph);
        match deps.placement_cycle(&self.graph, tree, parent) {
            Some(component) => Err(StoreError::ComponentCycle { component }),
            None => Ok(()),
        }
    }

    fn component_of(&self, instance: NodeId) -> Result<NodeId, StoreError> {
        self.graph
            .get(instance)
            .ok_or(StoreError::UnknownNode(instance))?
            .instance_props()
            .map(|p| p.component_id)
            .ok_or(StoreError::UnknownComponent(instance))
    }

    /// `descendant` must live inside the component `instance` points at.
    fn check_descendant(&self, instance: NodeId, descendant: NodeId) -> Result<(), StoreError> {
        let component = self.component_of(instance)?;
        if self.graph.is_ancestor_of(component, descendant) {
            Ok(())
        } else {
            Err(StoreError::NotInComponent {
                component,
                descendant,
            })
        }
    }

    // ─── Add ─────────────────────────────────────────────────────────────

    /// Add one node under `parent` (or as a root) at `index` (appended when
    /// `None`). Text nodes are measured on the way in.
    pub fn add_node(
        &mut self,
        node: SceneNode,
        parent: Option<NodeId>,
        index: Option<usize>,
    ) -> Option<NodeId> {
        self.add_subtree(TreeNode::leaf(node), parent, index)
    }

    pub fn add_child_to_frame(&mut self, frame: NodeId, node: SceneNode) -> Option<NodeId> {
        self.add_node(node, Some(frame), None)
    }

    /// Add a whole subtree (import, tool calls). All ids must be new.
    pub fn add_subtree(
        &mut self,
        tree: TreeNode,
        parent: Option<NodeId>,
        index: Option<usize>,
    ) -> Option<NodeId> {
        self.transact("add", |s| {
            s.validate_instances(&tree, parent)?;
            let ids = tree.ids();
            let root = s.graph.insert_subtree(tree, parent, index)?;
            for &id in &ids {
                s.sync_content_size(id);
            }
            Ok((root, Some(StoreChange::Added(ids))))
        })
    }

    /// Text node with the configured default font.
    pub fn create_text(
        &mut self,
        parent: Option<NodeId>,
        x: f32,
        y: f32,
        text: &str,
    ) -> Option<NodeId> {
        let mut node = SceneNode::text(self.generate_id("text"), text).at(x, y);
        if let NodeKind::Text(props) = &mut node.kind {
            props.font = self.config.default_font.clone();
        }
        self.add_node(node, parent, None)
    }

    // ─── Update ──────────────────────────────────────────────────────────

    fn apply_patch(&mut self, id: NodeId, patch: &NodePatch) -> Result<bool, StoreError> {
        let measurer = &*self.measurer;
        let node = self.graph.get_mut(id).ok_or(StoreError::UnknownNode(id))?;
        let changed = patch.apply(node);
        if changed && patch.touches_text() {
            sync_text_size(node, measurer);
        }
        if changed && patch.geometry.is_some() {
            path_data::sync_path_size(node);
        }
        Ok(changed)
    }

    /// Patch one node. Text-affecting patches re-measure in the same write.
    /// Returns true if anything changed.
    pub fn update_node(&mut self, id: NodeId, patch: &NodePatch) -> bool {
        self.transact("update", |s| {
            let changed = s.apply_patch(id, patch)?;
            Ok((changed, changed.then(|| StoreChange::Updated(vec![id]))))
        })
        .unwrap_or(false)
    }

    /// Patch without an undo entry of its own, for high-frequency scrubbing.
    /// History is saved once per gesture: either by `save_history` before
    /// the scrub starts, or by the open batch on its first change.
    pub fn update_node_without_history(&mut self, id: NodeId, patch: &NodePatch) -> bool {
        match self.apply_patch(id, patch) {
            Ok(true) => {
                self.history.mark_batch_changed();
                self.commit(StoreChange::Updated(vec![id]));
                true
            }
            Ok(false) => false,
            Err(err) => {
                log::warn!("update refused: {err}");
                false
            }
        }
    }

    /// Patch many nodes as one undo step. Unknown ids are skipped. Returns
    /// how many nodes changed.
    pub fn update_multiple_nodes(&mut self, patches: &[(NodeId, NodePatch)]) -> usize {
        self.transact("update many", |s| {
            let mut changed = Vec::new();
            for (id, patch) in patches {
                match s.apply_patch(*id, patch) {
                    Ok(true) => changed.push(*id),
                    Ok(false) => {}
                    Err(err) => log::warn!("skipping patch: {err}"),
                }
            }
            let count = changed.len();
            Ok((count, (count > 0).then_some(StoreChange::Updated(changed))))
        })
        .unwrap_or(0)
    }

    /// Replace the whole document. The graph must pass the consistency
    /// check; the previous document is kept in history.
    pub fn set_nodes(&mut self, graph: FlatGraph) -> Result<(), StoreError> {
        graph.check_consistency()?;
        let before = self.snapshot();
        self.history.record(before);
        self.graph = graph;
        self.commit(StoreChange::Replaced);
        Ok(())
    }

    /// Re-measure every text node, e.g. after a font finished loading. Not
    /// an undoable edit. Returns how many nodes changed size.
    pub fn remeasure_all_text(&mut self) -> usize {
        let ids: Vec<NodeId> = self
            .graph
            .nodes_by_id
            .iter()
            .filter(|(_, n)| n.text_props().is_some())
            .map(|(&id, _)| id)
            .collect();
        let changed: Vec<NodeId> = ids.into_iter().filter(|&id| self.sync_text(id)).collect();
        let count = changed.len();
        if count > 0 {
            self.commit(StoreChange::Updated(changed));
        }
        count
    }

    // ─── Delete ──────────────────────────────────────────────────────────

    /// Delete `id` and everything under it.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        self.delete_nodes(&[id]) > 0
    }

    /// Delete several subtrees as one undo step. Returns the number of
    /// nodes removed, descendants included.
    pub fn delete_nodes(&mut self, ids: &[NodeId]) -> usize {
        self.transact("delete", |s| {
            let mut removed = Vec::new();
            for &id in ids {
                if !s.graph.contains(id) {
                    continue;
                }
                removed.extend(s.graph.remove_subtree(id).into_iter().map(|n| n.id));
            }
            let count = removed.len();
            Ok((count, (count > 0).then_some(StoreChange::Removed(removed))))
        })
        .unwrap_or(0)
    }

    // ─── Move / reorder ──────────────────────────────────────────────────

    /// Move `id` under `new_parent` (or to the roots) at `index`, counted
    /// after `id` has left its old list. Refuses cycles, leaf parents, and
    /// component self-containment.
    pub fn move_node(&mut self, id: NodeId, new_parent: Option<NodeId>, index: usize) -> bool {
        self.transact("move", |s| s.move_inner(id, new_parent, index))
            .unwrap_or(false)
    }

    fn move_inner(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
        index: usize,
    ) -> Result<(bool, Option<StoreChange>), StoreError> {
        let current_parent = self.graph.parent(id);
        let current_index = self
            .graph
            .index_in_parent(id)
            .ok_or(StoreError::UnknownNode(id))?;
        if current_parent == new_parent {
            let target = index.min(self.graph.siblings(id).len() - 1);
            if target == current_index {
                return Ok((false, None));
            }
        } else if let Some(subtree) = self.graph.subtree(id) {
            self.validate_instances(&subtree, new_parent)?;
        }
        self.graph.move_node(id, new_parent, index)?;
        Ok((true, Some(StoreChange::Moved(vec![id]))))
    }

    /// Move into a new parent keeping the node where it is on screen.
    pub fn reparent_preserving_position(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
        index: Option<usize>,
    ) -> bool {
        let Some(abs) = self.absolute_bounds(id) else {
            log::warn!("reparent refused: {}", StoreError::UnknownNode(id));
            return false;
        };
        let origin = new_parent
            .and_then(|p| self.absolute_bounds(p))
            .map_or((0.0, 0.0), |b| (b.x, b.y));
        let patch = NodePatch::position(abs.x - origin.0, abs.y - origin.1);
        self.transact("reparent", |s| {
            let (moved, change) = s.move_inner(id, new_parent, index.unwrap_or(usize::MAX))?;
            if !moved {
                return Ok((false, change));
            }
            s.apply_patch(id, &patch)?;
            Ok((true, change))
        })
        .unwrap_or(false)
    }

    pub fn reorder_node(&mut self, id: NodeId, index: usize) -> bool {
        let parent = self.graph.parent(id);
        self.move_node(id, parent, index)
    }

    /// One step towards the front (later in render order).
    pub fn bring_forward(&mut self, id: NodeId) -> bool {
        match self.graph.index_in_parent(id) {
            Some(i) => self.reorder_node(id, i + 1),
            None => false,
        }
    }

    pub fn send_backward(&mut self, id: NodeId) -> bool {
        match self.graph.index_in_parent(id) {
            Some(i) if i > 0 => self.reorder_node(id, i - 1),
            _ => false,
        }
    }

    pub fn bring_to_front(&mut self, id: NodeId) -> bool {
        self.reorder_node(id, usize::MAX)
    }

    pub fn send_to_back(&mut self, id: NodeId) -> bool {
        self.reorder_node(id, 0)
    }

    // ─── Group / duplicate / paste ───────────────────────────────────────

    /// Wrap siblings in a new group sized to their union. The group takes
    /// the place of the frontmost member and becomes the selection.
    pub fn group_nodes(&mut self, ids: &[NodeId]) -> Option<NodeId> {
        let mut members: Vec<NodeId> = Vec::new();
        for &id in ids {
            if self.graph.contains(id) && !members.contains(&id) {
                members.push(id);
            }
        }
        let &first = members.first()?;
        let parent = self.graph.parent(first);
        if members.iter().any(|&m| self.graph.parent(m) != parent) {
            log::warn!("group refused: members have different parents");
            return None;
        }
        members.sort_by_key(|&m| self.graph.index_in_parent(m));

        let locals: Vec<ResolvedBounds> = members
            .iter()
            .map(|m| match self.layout_index().get(m) {
                Some(laid) => laid.local,
                None => self.graph.get(*m).map(SceneNode::bounds).unwrap_or_default(),
            })
            .collect();
        let union = geometry::selection_bounds(&locals)?;
        let front = members
            .iter()
            .filter_map(|&m| self.graph.index_in_parent(m))
            .max()
            .unwrap_or(0);

        let group_id = self.generate_id("group");
        let group = SceneNode::group(group_id)
            .at(union.x, union.y)
            .sized(union.width, union.height);

        self.transact("group", |s| {
            s.graph.insert_subtree(TreeNode::leaf(group), parent, Some(front + 1))?;
            for (&member, local) in members.iter().zip(&locals) {
                s.graph.move_node(member, Some(group_id), usize::MAX)?;
                if let Some(node) = s.graph.get_mut(member) {
                    node.x = local.x - union.x;
                    node.y = local.y - union.y;
                }
            }
            s.selection.set_selected(vec![group_id]);
            let mut touched = members.clone();
            touched.push(group_id);
            Ok((group_id, Some(StoreChange::Moved(touched))))
        })
    }

    /// Dissolve a group into its parent, keeping children where they are on
    /// screen. The children become the selection.
    pub fn ungroup_node(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(group) = self.graph.get(id) else {
            return Vec::new();
        };
        if !matches!(group.kind, NodeKind::Group) {
            log::warn!("ungroup refused: {id} is not a group");
            return Vec::new();
        }
        let (gx, gy) = (group.x, group.y);
        let parent = self.graph.parent(id);
        let index = self.graph.index_in_parent(id).unwrap_or(0);
        let children = self.graph.children(id).to_vec();

        self.transact("ungroup", |s| {
            for (offset, &child) in children.iter().enumerate() {
                s.graph.move_node(child, parent, index + 1 + offset)?;
                if let Some(node) = s.graph.get_mut(child) {
                    node.x += gx;
                    node.y += gy;
                }
            }
            s.graph.remove_subtree(id);
            s.selection.set_selected(children.clone());
            let mut touched = children.clone();
            touched.push(id);
            Ok((children.clone(), Some(StoreChange::Moved(touched))))
        })
        .unwrap_or_default()
    }

    /// Deep-copy each subtree with fresh ids, offset by the configured
    /// amount, right in front of its original. The copies become the
    /// selection.
    pub fn duplicate_nodes(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let payload = clipboard::copy(&self.graph, ids);
        if payload.is_empty() {
            return Vec::new();
        }
        let originals = payload.root_ids();
        let mut trees = payload.trees;
        self.remap_fresh(&mut trees);
        let offset = self.config.duplicate_offset;

        self.transact("duplicate", |s| {
            let mut created = Vec::new();
            let mut added = Vec::new();
            for (mut tree, original) in trees.into_iter().zip(originals) {
                tree.node.x += offset;
                tree.node.y += offset;
                let parent = s.graph.parent(original);
                let index = s.graph.index_in_parent(original).map(|i| i + 1);
                added.extend(tree.ids());
                created.push(s.graph.insert_subtree(tree, parent, index)?);
            }
            s.selection.set_selected(created.clone());
            Ok((created, Some(StoreChange::Added(added))))
        })
        .unwrap_or_default()
    }

    /// Insert a clipboard payload under `parent` with fresh ids. Roots whose
    /// source still exists are nudged by the paste offset. Trees with
    /// invalid component references are skipped. The pasted roots become
    /// the selection.
    pub fn paste(&mut self, payload: &ClipboardPayload, parent: Option<NodeId>) -> Vec<NodeId> {
        let mut trees = payload.trees.clone();
        let offsets: Vec<f32> = trees
            .iter()
            .map(|t| {
                if self.graph.contains(t.id()) {
                    self.config.paste_offset
                } else {
                    0.0
                }
            })
            .collect();
        self.remap_fresh(&mut trees);

        let mut accepted = Vec::new();
        for (mut tree, offset) in trees.into_iter().zip(offsets) {
            match self.validate_instances(&tree, parent) {
                Ok(()) => {
                    tree.node.x += offset;
                    tree.node.y += offset;
                    accepted.push(tree);
                }
                Err(err) => log::warn!("paste skipped {}: {err}", tree.id()),
            }
        }
        if accepted.is_empty() {
            return Vec::new();
        }

        self.transact("paste", |s| {
            let mut created = Vec::new();
            let mut added = Vec::new();
            for tree in accepted {
                let ids = tree.ids();
                created.push(s.graph.insert_subtree(tree, parent, None)?);
                for &id in &ids {
                    s.sync_content_size(id);
                }
                added.extend(ids);
            }
            s.selection.set_selected(created.clone());
            Ok((created, Some(StoreChange::Added(added))))
        })
        .unwrap_or_default()
    }

    // ─── Alignment ───────────────────────────────────────────────────────

    /// Selected ids whose position the user controls.
    fn movable_selection(&self) -> Vec<NodeId> {
        self.selection
            .selected_ids
            .iter()
            .copied()
            .filter(|&id| self.graph.contains(id) && !self.is_layout_driven(id))
            .collect()
    }

    fn apply_deltas(&mut self, ids: &[NodeId], deltas: &Deltas) -> bool {
        let patches: Vec<(NodeId, NodePatch)> = ids
            .iter()
            .zip(deltas)
            .filter(|(_, d)| !d.is_zero())
            .filter_map(|(&id, d)| {
                let node = self.graph.get(id)?;
                Some((id, NodePatch::position(node.x + d.dx, node.y + d.dy)))
            })
            .collect();
        self.update_multiple_nodes(&patches) > 0
    }

    /// Align the selection to its union, or a lone node to its parent.
    /// Nodes placed by auto-layout are left alone.
    pub fn align_selection(&mut self, alignment: Alignment) -> bool {
        let ids = self.movable_selection();
        let rects: Vec<ResolvedBounds> =
            ids.iter().filter_map(|&id| self.absolute_bounds(id)).collect();
        if rects.len() != ids.len() || rects.is_empty() {
            return false;
        }
        let deltas = if let [only] = ids.as_slice() {
            let Some(parent) = self.graph.parent(*only).and_then(|p| self.absolute_bounds(p))
            else {
                return false;
            };
            geometry::align_to(&rects, parent, alignment)
        } else {
            geometry::align_nodes(&rects, alignment)
        };
        self.apply_deltas(&ids, &deltas)
    }

    /// Equalize gaps between three or more selected nodes.
    pub fn distribute_selection(&mut self, axis: Axis) -> bool {
        let ids = self.movable_selection();
        let rects: Vec<ResolvedBounds> =
            ids.iter().filter_map(|&id| self.absolute_bounds(id)).collect();
        if rects.len() != ids.len() || rects.len() < 3 {
            return false;
        }
        let deltas = geometry::distribute_nodes(&rects, axis);
        self.apply_deltas(&ids, &deltas)
    }

    // ─── Components ──────────────────────────────────────────────────────

    /// Mark a frame as a reusable component.
    pub fn create_component(&mut self, frame_id: NodeId) -> bool {
        self.transact("create component", |s| {
            let node = s
                .graph
                .get_mut(frame_id)
                .ok_or(StoreError::UnknownNode(frame_id))?;
            let props = node
                .frame_props_mut()
                .ok_or(StoreError::UnknownComponent(frame_id))?;
            if props.reusable {
                return Ok((false, None));
            }
            props.reusable = true;
            Ok((true, Some(StoreChange::Updated(vec![frame_id]))))
        })
        .unwrap_or(false)
    }

    /// Place a new instance of `component_id`, sized like the component.
    pub fn create_instance(
        &mut self,
        component_id: NodeId,
        parent: Option<NodeId>,
        x: f32,
        y: f32,
    ) -> Option<NodeId> {
        let Some(component) = find_component(&self.graph, component_id) else {
            log::warn!(
                "create instance refused: {}",
                StoreError::UnknownComponent(component_id)
            );
            return None;
        };
        let size = self
            .graph
            .subtree(component_id)
            .map(|t| resolved_size(&t))
            .unwrap_or_default();
        let mut node = SceneNode::instance(self.generate_id("ref"), component_id)
            .at(x, y)
            .sized(size.width, size.height);
        node.name = component.name.clone();
        self.add_node(node, parent, None)
    }

    /// Replace an instance with a plain copy of its resolved subtree. The
    /// root keeps the instance id; everything below gets fresh ids.
    pub fn detach_instance(&mut self, id: NodeId) -> Option<NodeId> {
        let resolved = component::resolve_instance(&self.graph, id)?;
        if let Some(err) = &resolved.error {
            log::warn!("detach refused: {err}");
            return None;
        }
        let mut tree = materialize(&resolved);
        let mut children = std::mem::take(&mut tree.children);
        self.remap_fresh(&mut children);
        tree.children = children;
        tree.node.id = id;

        let parent = self.graph.parent(id);
        let index = self.graph.index_in_parent(id);
        self.transact("detach", |s| {
            s.graph.remove_subtree(id);
            let ids = tree.ids();
            s.graph.insert_subtree(tree, parent, index)?;
            Ok((id, Some(StoreChange::Added(ids))))
        })
    }

    fn edit_instance(
        &mut self,
        label: &str,
        instance: NodeId,
        descendant: Option<NodeId>,
        f: impl FnOnce(&mut crate::model::InstanceProps) -> bool,
    ) -> bool {
        self.transact(label, |s| {
            if let Some(d) = descendant {
                s.check_descendant(instance, d)?;
            }
            let props = s
                .graph
                .get_mut(instance)
                .and_then(SceneNode::instance_props_mut)
                .ok_or(StoreError::UnknownNode(instance))?;
            let changed = f(props);
            Ok((changed, changed.then(|| StoreChange::Updated(vec![instance]))))
        })
        .unwrap_or(false)
    }

    /// Merge `over` into the override for `descendant`.
    pub fn set_descendant_override(
        &mut self,
        instance: NodeId,
        descendant: NodeId,
        over: &DescendantOverride,
    ) -> bool {
        self.edit_instance("override", instance, Some(descendant), |props| {
            let entry = props.descendants.entry(descendant).or_default();
            let before = entry.clone();
            entry.merge(over);
            let changed = *entry != before;
            if entry.is_empty() {
                props.descendants.remove(&descendant);
            }
            changed
        })
    }

    /// Drop one overridden property, reverting it to the template value.
    pub fn reset_descendant_override(
        &mut self,
        instance: NodeId,
        descendant: NodeId,
        field: OverrideField,
    ) -> bool {
        self.edit_instance("reset override", instance, None, |props| {
            let Some(entry) = props.descendants.get_mut(&descendant) else {
                return false;
            };
            let changed = entry.clear(field);
            if entry.is_empty() {
                props.descendants.remove(&descendant);
            }
            changed
        })
    }

    /// Drop every override and slot replacement for one descendant.
    pub fn reset_all_descendant_overrides(&mut self, instance: NodeId, descendant: NodeId) -> bool {
        self.edit_instance("reset overrides", instance, None, |props| {
            let a = props.descendants.remove(&descendant).is_some();
            let b = props.slot_content.remove(&descendant).is_some();
            a || b
        })
    }

    /// Drop every override and slot replacement on the instance.
    pub fn reset_instance(&mut self, instance: NodeId) -> bool {
        self.edit_instance("reset instance", instance, None, |props| {
            let changed = props.has_overrides();
            props.descendants.clear();
            props.slot_content.clear();
            changed
        })
    }

    /// Swap a slot (an instance-typed template descendant) for `content`.
    /// Ids in `content` that collide with the document are renamed.
    pub fn replace_slot(&mut self, instance: NodeId, slot: NodeId, content: TreeNode) -> bool {
        if let Err(err) = self.check_descendant(instance, slot) {
            log::warn!("replace slot refused: {err}");
            return false;
        }
        if self.graph.get(slot).and_then(SceneNode::instance_props).is_none() {
            log::warn!("replace slot refused: {slot} is not a slot");
            return false;
        }

        let mut reserved: HashSet<NodeId> = self
            .graph
            .nodes_by_id
            .values()
            .filter_map(SceneNode::instance_props)
            .flat_map(|p| {
                p.slot_content
                    .iter()
                    .filter(|(k, _)| **k != slot)
                    .flat_map(|(_, t)| t.ids())
            })
            .collect();
        let mut trees = [content];
        clipboard::remap_trees(&mut trees, &mut |node: &SceneNode| {
            let keep = !self.graph.contains(node.id) && !reserved.contains(&node.id);
            let id = if keep {
                node.id
            } else {
                self.fresh_id(node.kind.type_name(), &reserved)
            };
            reserved.insert(id);
            id
        });
        let [content] = trees;

        if let Err(err) = self.validate_instances(&content, Some(instance)) {
            log::warn!("replace slot refused: {err}");
            return false;
        }
        self.edit_instance("replace slot", instance, Some(slot), |props| {
            let changed = props.slot_content.get(&slot) != Some(&content);
            props.slot_content.insert(slot, content);
            changed
        })
    }

    pub fn reset_slot_content(&mut self, instance: NodeId, slot: NodeId) -> bool {
        self.edit_instance("reset slot", instance, None, |props| {
            props.slot_content.remove(&slot).is_some()
        })
    }

    /// Apply a property edit to the selection. With an instance context the
    /// edit becomes an override on the targeted descendant; otherwise every
    /// selected node is patched.
    pub fn update_selection_properties(&mut self, patch: &NodePatch) -> bool {
        if let Some(ctx) = self.selection.instance_context {
            let (set, cleared) = override_from_patch(patch);
            return self.edit_instance(
                "override",
                ctx.instance_id,
                Some(ctx.descendant_id),
                |props| {
                    let entry = props.descendants.entry(ctx.descendant_id).or_default();
                    let before = entry.clone();
                    entry.merge(&set);
                    for field in cleared {
                        entry.clear(field);
                    }
                    let changed = *entry != before;
                    if entry.is_empty() {
                        props.descendants.remove(&ctx.descendant_id);
                    }
                    changed
                },
            );
        }
        let patches: Vec<(NodeId, NodePatch)> = self
            .selection
            .selected_ids
            .iter()
            .map(|&id| (id, patch.clone()))
            .collect();
        self.update_multiple_nodes(&patches) > 0
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Start a gesture: every change until `end_batch` is one undo step.
    pub fn begin_batch(&mut self) {
        let current = self.snapshot();
        self.history.begin_batch(current);
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    /// Save the current state as an undo step ahead of edits made with
    /// `update_node_without_history`. Inside a batch the batch-start state
    /// is saved instead, once.
    pub fn save_history(&mut self) {
        if !self.history.mark_batch_changed() {
            let current = self.snapshot();
            self.history.record(current);
        }
    }

    /// Abandon the gesture, restoring the state from before it began.
    /// Returns true if anything had to be rolled back.
    pub fn cancel_batch(&mut self) -> bool {
        match self.history.cancel_batch() {
            Some(start) => {
                self.restore(start);
                true
            }
            None => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ─── Selection ───────────────────────────────────────────────────────

    fn selection_changed(&mut self, before: &SelectionState) -> bool {
        let changed = self.selection != *before;
        if changed {
            self.notify(StoreChange::Selection);
        }
        changed
    }

    pub fn select(&mut self, id: NodeId, additive: bool) -> bool {
        if !self.graph.contains(id) {
            return false;
        }
        let before = self.selection.clone();
        self.selection.select(id, additive);
        self.selection_changed(&before)
    }

    /// Replace the selection. Unknown ids are dropped.
    pub fn set_selected_ids(&mut self, ids: Vec<NodeId>) -> bool {
        let before = self.selection.clone();
        let ids = ids.into_iter().filter(|&id| self.graph.contains(id)).collect();
        self.selection.set_selected(ids);
        self.selection_changed(&before)
    }

    pub fn clear_selection(&mut self) -> bool {
        let before = self.selection.clone();
        self.selection.clear();
        self.selection_changed(&before)
    }

    pub fn click_empty(&mut self) -> bool {
        let before = self.selection.clone();
        self.selection.click_empty();
        self.selection_changed(&before)
    }

    pub fn double_click(&mut self, id: NodeId) -> bool {
        let before = self.selection.clone();
        self.selection.double_click(&self.graph, id);
        self.selection_changed(&before)
    }

    pub fn press_enter(&mut self) -> bool {
        let before = self.selection.clone();
        self.selection.press_enter(&self.graph);
        self.selection_changed(&before)
    }

    pub fn escape(&mut self) -> EscapeOutcome {
        let outcome = self.selection.escape();
        if outcome != EscapeOutcome::Nothing {
            self.notify(StoreChange::Selection);
        }
        outcome
    }

    /// Target `descendant` (a template id) inside `instance` for edits.
    pub fn enter_instance(&mut self, instance: NodeId, descendant: NodeId) -> bool {
        if let Err(err) = self.check_descendant(instance, descendant) {
            log::warn!("enter instance refused: {err}");
            return false;
        }
        let before = self.selection.clone();
        self.selection.enter_instance(instance, descendant);
        self.selection_changed(&before)
    }

    pub fn begin_editing(&mut self, id: NodeId, mode: EditingMode) -> bool {
        if !self.graph.contains(id) {
            return false;
        }
        let before = self.selection.clone();
        self.selection.begin_editing(id, mode);
        self.selection_changed(&before)
    }

    pub fn end_editing(&mut self) -> bool {
        let before = self.selection.clone();
        self.selection.end_editing();
        self.selection_changed(&before)
    }
}

/// Write layout results into the rendered nodes.
fn apply_layout(node: &mut RenderNode, index: &HashMap<NodeId, LaidOut>) {
    if let Some(laid) = index.get(&node.id) {
        node.node.x = laid.local.x;
        node.node.y = laid.local.y;
        node.node.width = laid.local.width;
        node.node.height = laid.local.height;
    }
    for child in &mut node.children {
        apply_layout(child, index);
    }
}

/// Stored-tree copy of a resolved subtree.
fn materialize(node: &RenderNode) -> TreeNode {
    TreeNode::new(
        node.node.clone(),
        node.children.iter().map(materialize).collect(),
    )
}

/// Split a node patch into the override properties it sets and the ones it
/// clears.
fn override_from_patch(patch: &NodePatch) -> (DescendantOverride, Vec<OverrideField>) {
    let mut cleared = Vec::new();
    let set = DescendantOverride {
        fill: split_field(&patch.fill, OverrideField::Fill, &mut cleared),
        stroke: split_field(&patch.stroke, OverrideField::Stroke, &mut cleared),
        fill_binding: split_field(&patch.fill_binding, OverrideField::FillBinding, &mut cleared),
        stroke_binding: split_field(
            &patch.stroke_binding,
            OverrideField::StrokeBinding,
            &mut cleared,
        ),
        enabled: patch.visible,
        stroke_width: None,
    };
    (set, cleared)
}

fn split_field<T: Clone>(
    value: &Option<Option<T>>,
    field: OverrideField,
    cleared: &mut Vec<OverrideField>,
) -> Option<T> {
    match value {
        Some(Some(v)) => Some(v.clone()),
        Some(None) => {
            cleared.push(field);
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AutoLayout, FlexDirection, Paint};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    fn store_with(roots: Vec<TreeNode>) -> SceneStore {
        let mut store = SceneStore::default();
        let graph = FlatGraph::from_tree(roots).unwrap();
        store.set_nodes(graph).unwrap();
        store.clear_history();
        store
    }

    fn rect(name: &str, x: f32, y: f32, w: f32, h: f32) -> TreeNode {
        TreeNode::leaf(SceneNode::rect(id(name)).at(x, y).sized(w, h))
    }

    #[test]
    fn refused_move_changes_nothing() {
        let mut store = store_with(vec![TreeNode::new(
            SceneNode::frame(id("st_outer")),
            vec![TreeNode::new(SceneNode::frame(id("st_inner")), vec![])],
        )]);
        let version = store.version();
        assert!(!store.move_node(id("st_outer"), Some(id("st_inner")), 0));
        assert_eq!(store.version(), version);
        assert!(!store.can_undo());
        assert_eq!(store.graph().parent(id("st_inner")), Some(id("st_outer")));
    }

    #[test]
    fn subscribers_see_versioned_changes() {
        let mut store = store_with(vec![rect("st_sub", 0.0, 0.0, 10.0, 10.0)]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        store.update_node(id("st_sub"), &NodePatch::position(5.0, 5.0));
        store.select(id("st_sub"), false);
        assert!(store.unsubscribe(sub));
        store.update_node(id("st_sub"), &NodePatch::position(6.0, 6.0));

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].change, StoreChange::Updated(vec![id("st_sub")]));
        assert_eq!(seen[1].change, StoreChange::Selection);
        assert_eq!(seen[0].version, seen[1].version);
    }

    #[test]
    fn unchanged_update_records_nothing() {
        let mut store = store_with(vec![rect("st_same", 1.0, 2.0, 10.0, 10.0)]);
        assert!(!store.update_node(id("st_same"), &NodePatch::position(1.0, 2.0)));
        assert!(!store.can_undo());
    }

    #[test]
    fn group_then_ungroup_keeps_screen_positions() {
        let mut store = store_with(vec![TreeNode::new(
            SceneNode::frame(id("st_g_frame")).sized(200.0, 200.0),
            vec![
                rect("st_g_a", 10.0, 10.0, 20.0, 20.0),
                rect("st_g_mid", 0.0, 100.0, 5.0, 5.0),
                rect("st_g_b", 50.0, 40.0, 10.0, 10.0),
            ],
        )]);
        let group = store.group_nodes(&[id("st_g_a"), id("st_g_b")]).unwrap();
        let node = store.get_node(group).unwrap();
        assert_eq!(node.bounds(), ResolvedBounds::new(10.0, 10.0, 50.0, 40.0));
        assert_eq!(
            store.graph().children(id("st_g_frame")),
            &[id("st_g_mid"), group]
        );
        assert_eq!(store.get_node(id("st_g_b")).map(|n| (n.x, n.y)), Some((40.0, 30.0)));
        assert_eq!(store.selection().selected_ids, vec![group]);
        assert_eq!(
            store.absolute_bounds(id("st_g_b")),
            Some(ResolvedBounds::new(50.0, 40.0, 10.0, 10.0))
        );

        let children = store.ungroup_node(group);
        assert_eq!(children, vec![id("st_g_a"), id("st_g_b")]);
        assert!(!store.graph().contains(group));
        assert_eq!(store.get_node(id("st_g_b")).map(|n| (n.x, n.y)), Some((50.0, 40.0)));
        store.graph().check_consistency().unwrap();
    }

    #[test]
    fn group_refuses_mixed_parents() {
        let mut store = store_with(vec![
            TreeNode::new(
                SceneNode::frame(id("st_mp_frame")),
                vec![rect("st_mp_in", 0.0, 0.0, 1.0, 1.0)],
            ),
            rect("st_mp_out", 0.0, 0.0, 1.0, 1.0),
        ]);
        assert_eq!(store.group_nodes(&[id("st_mp_in"), id("st_mp_out")]), None);
        assert!(!store.can_undo());
    }

    #[test]
    fn align_skips_auto_layout_children() {
        let mut store = store_with(vec![
            TreeNode::new(
                SceneNode::frame(id("st_al_row"))
                    .sized(300.0, 100.0)
                    .with_layout(AutoLayout::flow(FlexDirection::Row, 0.0)),
                vec![rect("st_al_flow", 0.0, 0.0, 10.0, 10.0)],
            ),
            rect("st_al_a", 400.0, 0.0, 10.0, 10.0),
            rect("st_al_b", 500.0, 50.0, 10.0, 10.0),
        ]);
        store.set_selected_ids(vec![id("st_al_flow"), id("st_al_a"), id("st_al_b")]);
        assert!(store.align_selection(Alignment::Top));
        assert_eq!(store.get_node(id("st_al_b")).map(|n| n.y), Some(0.0));
        assert_eq!(store.get_node(id("st_al_a")).map(|n| n.x), Some(400.0));
        assert!(store.is_layout_driven(id("st_al_flow")));
    }

    #[test]
    fn lone_node_aligns_to_parent() {
        let mut store = store_with(vec![TreeNode::new(
            SceneNode::frame(id("st_lone_frame")).at(100.0, 100.0).sized(200.0, 100.0),
            vec![rect("st_lone", 10.0, 10.0, 20.0, 20.0)],
        )]);
        store.select(id("st_lone"), false);
        assert!(store.align_selection(Alignment::Right));
        assert_eq!(store.get_node(id("st_lone")).map(|n| n.x), Some(180.0));
    }

    #[test]
    fn cancelled_batch_restores_start() {
        let mut store = store_with(vec![rect("st_drag", 0.0, 0.0, 10.0, 10.0)]);
        store.begin_batch();
        store.update_node(id("st_drag"), &NodePatch::position(5.0, 0.0));
        store.update_node(id("st_drag"), &NodePatch::position(9.0, 0.0));
        assert!(store.cancel_batch());
        assert_eq!(store.get_node(id("st_drag")).map(|n| n.x), Some(0.0));
        assert!(!store.can_undo());
    }

    #[test]
    fn selection_edit_becomes_override_inside_instance() {
        let mut card = SceneNode::frame(id("st_card")).sized(50.0, 50.0);
        if let Some(p) = card.frame_props_mut() {
            p.reusable = true;
        }
        let mut store = store_with(vec![
            TreeNode::new(card, vec![rect("st_card_bg", 0.0, 0.0, 50.0, 50.0)]),
            TreeNode::leaf(SceneNode::instance(id("st_card_i"), id("st_card")).at(100.0, 0.0)),
        ]);
        assert!(store.enter_instance(id("st_card_i"), id("st_card_bg")));
        let red = Paint::hex("#ff0000").unwrap();
        assert!(store.update_selection_properties(&NodePatch::fill(red.clone())));

        let props = store.get_node(id("st_card_i")).and_then(|n| n.instance_props()).unwrap();
        assert_eq!(props.descendants[&id("st_card_bg")].fill, Some(red));
        // Template untouched.
        assert_eq!(store.get_node(id("st_card_bg")).and_then(|n| n.fill.clone()), None);
    }

    #[test]
    fn create_instance_sizes_like_component() {
        let mut frame = SceneNode::frame(id("st_ci_comp")).sized(64.0, 32.0);
        if let Some(p) = frame.frame_props_mut() {
            p.reusable = true;
        }
        let mut store = store_with(vec![TreeNode::leaf(frame)]);
        let inst = store.create_instance(id("st_ci_comp"), None, 200.0, 0.0).unwrap();
        let node = store.get_node(inst).unwrap();
        assert_eq!((node.width, node.height), (64.0, 32.0));
        assert_eq!(store.create_instance(id("st_ci_missing"), None, 0.0, 0.0), None);
    }

    #[test]
    fn render_tree_carries_layout_geometry() {
        let store = store_with(vec![TreeNode::new(
            SceneNode::frame(id("st_rt_row"))
                .sized(300.0, 100.0)
                .with_layout(AutoLayout::flow(FlexDirection::Row, 8.0)),
            vec![
                rect("st_rt_a", 0.0, 0.0, 50.0, 20.0),
                rect("st_rt_b", 0.0, 0.0, 60.0, 20.0),
            ],
        )]);
        let b = store.render_node(id("st_rt_b")).unwrap();
        assert_eq!(b.node.x, 58.0);
        // Stored geometry is left alone.
        assert_eq!(store.get_node(id("st_rt_b")).map(|n| n.x), Some(0.0));
    }
}
