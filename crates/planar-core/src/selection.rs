//! Selection and interaction state.
//!
//! Tracks what is selected, which container the user has drilled into, which
//! instance descendant is being edited, and whether an inline text/name edit
//! is active. Transitions that depend on node kinds take the graph by
//! reference; the state itself never touches the node maps.

use crate::graph::FlatGraph;
use crate::id::NodeId;
use crate::model::NodeKind;
use serde::{Deserialize, Serialize};

/// Edits target a descendant inside a resolved instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceContext {
    pub instance_id: NodeId,
    /// Template descendant id (override key).
    pub descendant_id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditingMode {
    Text,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Editing {
    pub node_id: NodeId,
    pub mode: EditingMode,
}

/// The part of the selection captured by undo snapshots.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    pub selected_ids: Vec<NodeId>,
    pub instance_context: Option<InstanceContext>,
    pub entered_container_id: Option<NodeId>,
}

/// What an Escape press did, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeOutcome {
    ExitedEditing,
    ExitedInstance,
    ClearedSelection,
    ExitedContainer,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    pub selected_ids: Vec<NodeId>,
    pub entered_container_id: Option<NodeId>,
    pub instance_context: Option<InstanceContext>,
    pub editing: Option<Editing>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected_ids.contains(&id)
    }

    /// The only selected id, if exactly one is selected.
    pub fn single(&self) -> Option<NodeId> {
        match self.selected_ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Click on a node. `additive` (shift) toggles membership; otherwise the
    /// node replaces the selection unless it is already part of it.
    pub fn select(&mut self, id: NodeId, additive: bool) {
        self.editing = None;
        self.instance_context = None;
        if additive {
            if let Some(pos) = self.selected_ids.iter().position(|s| *s == id) {
                self.selected_ids.remove(pos);
            } else {
                self.selected_ids.push(id);
            }
        } else if !self.is_selected(id) {
            self.selected_ids = vec![id];
        }
    }

    pub fn set_selected(&mut self, ids: Vec<NodeId>) {
        self.editing = None;
        self.instance_context = None;
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        self.selected_ids = unique;
    }

    pub fn clear(&mut self) {
        self.selected_ids.clear();
        self.instance_context = None;
        self.editing = None;
    }

    /// Click on empty canvas: drop everything, including drill-in contexts.
    pub fn click_empty(&mut self) {
        self.clear();
        self.entered_container_id = None;
    }

    /// Double-click on `id`. A selected container is entered; a selected
    /// text node starts text editing. Returns true if the state changed.
    pub fn double_click(&mut self, graph: &FlatGraph, id: NodeId) -> bool {
        if !self.is_selected(id) {
            return false;
        }
        match graph.get(id).map(|n| &n.kind) {
            Some(NodeKind::Frame(_) | NodeKind::Group) => {
                self.enter_container(id);
                true
            }
            Some(NodeKind::Text(_)) => self.begin_editing(id, EditingMode::Text),
            _ => false,
        }
    }

    /// Enter on the selection: text starts editing, a container is entered
    /// and its children become the selection.
    pub fn press_enter(&mut self, graph: &FlatGraph) -> bool {
        let Some(id) = self.single() else {
            return false;
        };
        match graph.get(id).map(|n| &n.kind) {
            Some(NodeKind::Text(_)) => self.begin_editing(id, EditingMode::Text),
            Some(NodeKind::Frame(_) | NodeKind::Group) => {
                let children = graph.children(id).to_vec();
                if children.is_empty() {
                    return false;
                }
                self.enter_container(id);
                self.selected_ids = children;
                true
            }
            _ => false,
        }
    }

    /// Escape exits editing, then the instance context, then clears the
    /// selection, then leaves the entered container.
    pub fn escape(&mut self) -> EscapeOutcome {
        if self.editing.take().is_some() {
            return EscapeOutcome::ExitedEditing;
        }
        if let Some(ctx) = self.instance_context.take() {
            self.selected_ids = vec![ctx.instance_id];
            return EscapeOutcome::ExitedInstance;
        }
        if !self.selected_ids.is_empty() {
            self.selected_ids.clear();
            return EscapeOutcome::ClearedSelection;
        }
        if self.entered_container_id.take().is_some() {
            return EscapeOutcome::ExitedContainer;
        }
        EscapeOutcome::Nothing
    }

    pub fn enter_container(&mut self, id: NodeId) {
        self.entered_container_id = Some(id);
        self.selected_ids.clear();
        self.instance_context = None;
        self.editing = None;
    }

    /// Target a descendant of an instance; the instance becomes the sole
    /// selection.
    pub fn enter_instance(&mut self, instance_id: NodeId, descendant_id: NodeId) {
        self.editing = None;
        self.selected_ids = vec![instance_id];
        self.instance_context = Some(InstanceContext {
            instance_id,
            descendant_id,
        });
    }

    /// Start an inline edit. Text mode requires the node to be selected.
    pub fn begin_editing(&mut self, id: NodeId, mode: EditingMode) -> bool {
        if mode == EditingMode::Text && !self.is_selected(id) {
            return false;
        }
        self.editing = Some(Editing { node_id: id, mode });
        true
    }

    pub fn end_editing(&mut self) -> Option<Editing> {
        self.editing.take()
    }

    /// Drop references to nodes that no longer exist.
    pub fn prune(&mut self, graph: &FlatGraph) {
        self.selected_ids.retain(|id| graph.contains(*id));
        if self
            .entered_container_id
            .is_some_and(|id| !graph.contains(id))
        {
            self.entered_container_id = None;
        }
        if self.instance_context.is_some_and(|ctx| {
            !graph.contains(ctx.instance_id) || !graph.contains(ctx.descendant_id)
        }) {
            self.instance_context = None;
        }
        if self.editing.is_some_and(|e| !graph.contains(e.node_id)) {
            self.editing = None;
        }
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            selected_ids: self.selected_ids.clone(),
            instance_context: self.instance_context,
            entered_container_id: self.entered_container_id,
        }
    }

    /// Restore from an undo snapshot, filtering ids missing from `graph`.
    /// Any inline edit is abandoned.
    pub fn restore(&mut self, snapshot: &SelectionSnapshot, graph: &FlatGraph) {
        self.selected_ids = snapshot.selected_ids.clone();
        self.instance_context = snapshot.instance_context;
        self.entered_container_id = snapshot.entered_container_id;
        self.editing = None;
        self.prune(graph);
    }
}
