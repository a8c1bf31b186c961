//! The editor: routes input through tools and shortcuts onto the store.
//!
//! Pointer moves are coalesced. `handle_event` only parks the latest move;
//! the host calls `animation_frame` once per display frame to apply it. A
//! pointer-up or pointer-down flushes the parked move first so gestures end
//! where the pointer really was.

use crate::input::InputEvent;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{GestureTracker, ToolCommand, ToolKind};
use planar_core::clipboard;
use planar_core::selection::Editing;
use planar_core::{
    EditingMode, EscapeOutcome, NodeId, NodeKind, NodePatch, ResolvedBounds, SceneNode,
    SceneStore,
};
use serde::{Deserialize, Serialize};

/// Editor tuning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Pointer travel (canvas units) before a press turns into a drag.
    pub drag_threshold: f32,
    /// Arrow-key step.
    pub nudge: f32,
    /// Shift+arrow step.
    pub large_nudge: f32,
    /// Size of a shape created by a click without dragging.
    pub default_shape_size: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3.0,
            nudge: 1.0,
            large_nudge: 10.0,
            default_shape_size: 100.0,
        }
    }
}

/// Transient overlay the renderer draws on top of the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feedback {
    Marquee(ResolvedBounds),
    Preview { tool: ToolKind, rect: ResolvedBounds },
}

pub struct Editor {
    store: SceneStore,
    config: EditorConfig,
    tool: ToolKind,
    previous_tool: ToolKind,
    tracker: GestureTracker,
    pending_move: Option<InputEvent>,
    /// Stored positions of the dragged nodes at drag start.
    drag_origins: Vec<(NodeId, f32, f32)>,
    feedback: Option<Feedback>,
    clipboard: Option<Vec<u8>>,
    /// A placed text node is being edited inside an open batch.
    text_batch: bool,
}

impl Editor {
    pub fn new(store: SceneStore, config: EditorConfig) -> Self {
        let tracker = GestureTracker::new(config.drag_threshold);
        Self {
            store,
            config,
            tool: ToolKind::Select,
            previous_tool: ToolKind::Select,
            tracker,
            pending_move: None,
            drag_origins: Vec::new(),
            feedback: None,
            clipboard: None,
            text_batch: false,
        }
    }

    pub fn store(&self) -> &SceneStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SceneStore {
        &mut self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn feedback(&self) -> Option<Feedback> {
        self.feedback
    }

    pub fn has_pending_move(&self) -> bool {
        self.pending_move.is_some()
    }

    /// Encoded clipboard payload, for handing to the system clipboard.
    pub fn clipboard_bytes(&self) -> Option<&[u8]> {
        self.clipboard.as_deref()
    }

    /// Load a payload read from the system clipboard.
    pub fn set_clipboard_bytes(&mut self, bytes: Vec<u8>) {
        self.clipboard = Some(bytes);
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool == self.tool {
            return;
        }
        self.cancel_gesture();
        self.previous_tool = self.tool;
        self.tool = tool;
        log::debug!("tool: {tool:?}");
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one input event. Returns true when the document, selection, or
    /// feedback changed and a redraw is due.
    pub fn handle_event(&mut self, event: InputEvent) -> bool {
        if !self.store.selection().is_editing() {
            self.close_text_batch();
        }
        match event {
            InputEvent::PointerMove { .. } => {
                self.pending_move = Some(event);
                false
            }
            InputEvent::PointerDown { x, y, .. } => {
                let mut changed = self.animation_frame();
                if self.store.selection().is_editing() {
                    return self.finish_editing() || changed;
                }
                let hit = match self.tool {
                    ToolKind::Select => self.store.hit_test(x, y),
                    _ => None,
                };
                let commands = self.tracker.handle(self.tool, &event, hit);
                changed |= self.apply(commands);
                changed
            }
            InputEvent::PointerUp { .. } => {
                let mut changed = self.animation_frame();
                let commands = self.tracker.handle(self.tool, &event, None);
                changed |= self.apply(commands);
                changed
            }
            InputEvent::PointerCancel => {
                self.pending_move = None;
                self.cancel_gesture()
            }
            InputEvent::DoubleClick { x, y } => self.double_click(x, y),
            InputEvent::Key { key, modifiers } => {
                if self.store.selection().is_editing() {
                    // The host's text field owns every other key.
                    return key == "Escape" && self.finish_editing();
                }
                if key == "Escape" && !self.tracker.gesture.is_idle() {
                    self.pending_move = None;
                    return self.cancel_gesture();
                }
                match ShortcutMap::resolve(&key, modifiers) {
                    Some(action) => self.dispatch(action),
                    None => false,
                }
            }
        }
    }

    /// Apply the parked pointer move, if any. Call once per display frame.
    pub fn animation_frame(&mut self) -> bool {
        let Some(event) = self.pending_move.take() else {
            return false;
        };
        let commands = self.tracker.handle(self.tool, &event, None);
        self.apply(commands)
    }

    fn cancel_gesture(&mut self) -> bool {
        let commands = self.tracker.cancel();
        self.apply(commands)
    }

    fn double_click(&mut self, x: f32, y: f32) -> bool {
        let Some(hit) = self.store.hit_test(x, y) else {
            return false;
        };
        if !self.store.selection().is_selected(hit) {
            return self.store.select(hit, false);
        }
        if self.store.get_node(hit).is_some_and(|n| n.instance_props().is_some()) {
            return self
                .store
                .instance_descendant_at(hit, x, y)
                .is_some_and(|d| self.store.enter_instance(hit, d));
        }
        if !self.store.double_click(hit) {
            return false;
        }
        // Entered a container: pick the child under the pointer.
        if self.store.selection().entered_container_id == Some(hit)
            && let Some(child) = self.store.hit_test(x, y)
        {
            self.store.select(child, false);
        }
        true
    }

    fn apply(&mut self, commands: Vec<ToolCommand>) -> bool {
        let mut changed = false;
        for command in commands {
            changed |= self.apply_one(command);
        }
        changed
    }

    fn apply_one(&mut self, command: ToolCommand) -> bool {
        match command {
            ToolCommand::Select { id, additive } => self.store.select(id, additive),
            ToolCommand::ClickEmpty => self.store.click_empty(),
            ToolCommand::BeginDrag => {
                self.drag_origins = self.movable_selection();
                self.store.begin_batch();
                false
            }
            ToolCommand::DragTo { dx, dy } => {
                let patches: Vec<(NodeId, NodePatch)> = self
                    .drag_origins
                    .iter()
                    .map(|&(id, x, y)| (id, NodePatch::position(x + dx, y + dy)))
                    .collect();
                self.store.update_multiple_nodes(&patches) > 0
            }
            ToolCommand::EndDrag => {
                self.store.end_batch();
                self.drag_origins.clear();
                false
            }
            ToolCommand::CancelDrag => {
                self.drag_origins.clear();
                self.store.cancel_batch()
            }
            ToolCommand::Marquee(rect) => {
                self.feedback = Some(Feedback::Marquee(rect));
                true
            }
            ToolCommand::MarqueeSelect { rect, additive } => {
                let mut ids = if additive {
                    self.store.selection().selected_ids.clone()
                } else {
                    Vec::new()
                };
                for id in self.store.hit_test_rect(rect) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                self.store.set_selected_ids(ids)
            }
            ToolCommand::Preview { tool, rect } => {
                self.feedback = Some(Feedback::Preview { tool, rect });
                true
            }
            ToolCommand::ClearFeedback => self.feedback.take().is_some(),
            ToolCommand::CommitShape { tool, rect } => self.commit_shape(tool, rect),
            ToolCommand::PlaceText { x, y } => self.place_text(x, y),
        }
    }

    /// Selected nodes a drag or nudge may move, with their stored position.
    /// Nodes placed by auto-layout and nodes inside another selected node
    /// stay put.
    fn movable_selection(&self) -> Vec<(NodeId, f32, f32)> {
        let selected = &self.store.selection().selected_ids;
        let graph = self.store.graph();
        selected
            .iter()
            .filter(|&&id| !self.store.is_layout_driven(id))
            .filter(|&&id| !selected.iter().any(|&other| graph.is_ancestor_of(other, id)))
            .filter_map(|&id| graph.get(id).map(|n| (id, n.x, n.y)))
            .collect()
    }

    /// Container new nodes go into, and its absolute origin.
    fn insertion_parent(&self) -> (Option<NodeId>, f32, f32) {
        let parent = self.store.selection().entered_container_id;
        let origin = parent
            .and_then(|p| self.store.absolute_bounds(p))
            .map_or((0.0, 0.0), |b| (b.x, b.y));
        (parent, origin.0, origin.1)
    }

    fn commit_shape(&mut self, tool: ToolKind, mut rect: ResolvedBounds) -> bool {
        if rect.width < 1.0 && rect.height < 1.0 {
            rect.width = self.config.default_shape_size;
            rect.height = self.config.default_shape_size;
        }
        let (parent, ox, oy) = self.insertion_parent();
        let node = match tool {
            ToolKind::Frame => SceneNode::frame(self.store.generate_id("frame")),
            ToolKind::Rect => SceneNode::rect(self.store.generate_id("rect")),
            ToolKind::Ellipse => SceneNode::new(self.store.generate_id("ellipse"), NodeKind::Ellipse),
            ToolKind::Select | ToolKind::Text => return false,
        };
        let node = node.at(rect.x - ox, rect.y - oy).sized(rect.width, rect.height);
        let Some(id) = self.store.add_node(node, parent, None) else {
            return false;
        };
        self.store.set_selected_ids(vec![id]);
        self.set_tool(ToolKind::Select);
        true
    }

    /// Placement and the first commit share one undo step.
    fn place_text(&mut self, x: f32, y: f32) -> bool {
        let (parent, ox, oy) = self.insertion_parent();
        self.store.begin_batch();
        let Some(id) = self.store.create_text(parent, x - ox, y - oy, "") else {
            self.store.cancel_batch();
            return false;
        };
        self.text_batch = true;
        self.store.set_selected_ids(vec![id]);
        self.store.begin_editing(id, EditingMode::Text);
        self.set_tool(ToolKind::Select);
        true
    }

    // ─── Text editing ────────────────────────────────────────────────────

    /// Commit the inline editor's value and leave editing mode. Text left
    /// empty deletes its node.
    pub fn commit_text_edit(&mut self, value: &str) -> bool {
        let Some(Editing { node_id, mode }) = self.store.selection().editing else {
            return false;
        };
        self.store.end_editing();
        match mode {
            EditingMode::Text if value.is_empty() => self.remove_empty_text(node_id),
            EditingMode::Text => {
                let changed = self.store.update_node(node_id, &NodePatch::text(value));
                self.close_text_batch();
                changed
            }
            EditingMode::Name => {
                let patch = NodePatch {
                    name: Some((!value.is_empty()).then(|| value.to_string())),
                    ..Default::default()
                };
                self.store.update_node(node_id, &patch)
            }
        }
    }

    /// Leave editing without a new value (Escape, click elsewhere). A text
    /// node that was never given content is removed.
    fn finish_editing(&mut self) -> bool {
        let Some(Editing { node_id, mode }) = self.store.selection().editing else {
            return false;
        };
        self.store.escape();
        let empty = mode == EditingMode::Text
            && self
                .store
                .get_node(node_id)
                .and_then(SceneNode::text_props)
                .is_some_and(|t| t.text.is_empty());
        if empty {
            self.remove_empty_text(node_id);
        } else {
            self.close_text_batch();
        }
        true
    }

    /// Drop a text node left without content. One that was just placed is
    /// rolled back so no undo step remains.
    fn remove_empty_text(&mut self, id: NodeId) -> bool {
        if std::mem::take(&mut self.text_batch) {
            return self.store.cancel_batch();
        }
        self.store.delete_node(id)
    }

    fn close_text_batch(&mut self) {
        if std::mem::take(&mut self.text_batch) {
            self.store.end_batch();
        }
    }

    // ─── Actions ─────────────────────────────────────────────────────────

    /// Run a semantic action against the store. Returns true if anything
    /// changed.
    pub fn dispatch(&mut self, action: ShortcutAction) -> bool {
        if !self.store.selection().is_editing() {
            self.close_text_batch();
        }
        let selected = self.store.selection().selected_ids.clone();
        match action {
            ShortcutAction::ToolSelect => self.switch_tool(ToolKind::Select),
            ShortcutAction::ToolFrame => self.switch_tool(ToolKind::Frame),
            ShortcutAction::ToolRect => self.switch_tool(ToolKind::Rect),
            ShortcutAction::ToolEllipse => self.switch_tool(ToolKind::Ellipse),
            ShortcutAction::ToolText => self.switch_tool(ToolKind::Text),
            ShortcutAction::ToggleLastTool => self.switch_tool(self.previous_tool),

            ShortcutAction::Undo => self.store.undo(),
            ShortcutAction::Redo => self.store.redo(),
            ShortcutAction::Delete => self.store.delete_nodes(&selected) > 0,
            ShortcutAction::SelectAll => {
                let ids = match self.store.selection().entered_container_id {
                    Some(container) => self.store.graph().children(container).to_vec(),
                    None => self.store.graph().root_ids.clone(),
                };
                self.store.set_selected_ids(ids)
            }
            ShortcutAction::Duplicate => !self.store.duplicate_nodes(&selected).is_empty(),
            ShortcutAction::Copy => {
                self.copy_selection(&selected);
                false
            }
            ShortcutAction::Cut => {
                self.copy_selection(&selected) && self.store.delete_nodes(&selected) > 0
            }
            ShortcutAction::Paste => self.paste(),
            ShortcutAction::Group => self.store.group_nodes(&selected).is_some(),
            ShortcutAction::Ungroup => self.batched(|store| {
                let mut changed = false;
                let mut freed = Vec::new();
                for &id in &selected {
                    let children = store.ungroup_node(id);
                    changed |= !children.is_empty();
                    freed.extend(children);
                }
                if changed {
                    store.set_selected_ids(freed);
                }
                changed
            }),

            ShortcutAction::CreateComponent => match self.store.selection().single() {
                Some(id) => self.store.create_component(id),
                None => false,
            },
            ShortcutAction::DetachInstance => match self.store.selection().single() {
                Some(id) => self.store.detach_instance(id).is_some(),
                None => false,
            },

            ShortcutAction::Align(alignment) => self.store.align_selection(alignment),
            ShortcutAction::Distribute(axis) => self.store.distribute_selection(axis),
            ShortcutAction::Nudge { dx, dy, large } => {
                let step = if large {
                    self.config.large_nudge
                } else {
                    self.config.nudge
                };
                let patches: Vec<(NodeId, NodePatch)> = self
                    .movable_selection()
                    .into_iter()
                    .map(|(id, x, y)| {
                        let patch =
                            NodePatch::position(x + f32::from(dx) * step, y + f32::from(dy) * step);
                        (id, patch)
                    })
                    .collect();
                self.store.update_multiple_nodes(&patches) > 0
            }

            // Front-most first so neighbours don't leapfrog each other.
            ShortcutAction::BringForward => self.reorder_each(&selected, true, SceneStore::bring_forward),
            ShortcutAction::SendBackward => self.reorder_each(&selected, false, SceneStore::send_backward),
            ShortcutAction::BringToFront => self.reorder_each(&selected, false, SceneStore::bring_to_front),
            ShortcutAction::SendToBack => self.reorder_each(&selected, true, SceneStore::send_to_back),

            ShortcutAction::Escape => {
                if !self.tracker.gesture.is_idle() {
                    return self.cancel_gesture();
                }
                self.store.escape() != EscapeOutcome::Nothing
            }
            ShortcutAction::Enter => self.store.press_enter(),
        }
    }

    fn switch_tool(&mut self, tool: ToolKind) -> bool {
        let changed = tool != self.tool;
        self.set_tool(tool);
        changed
    }

    /// Run several store writes as one undo step.
    fn batched(&mut self, f: impl FnOnce(&mut SceneStore) -> bool) -> bool {
        self.store.begin_batch();
        let changed = f(&mut self.store);
        self.store.end_batch();
        changed
    }

    /// Apply a z-order step to each node, front-most first when
    /// `front_first`, as one undo step.
    fn reorder_each(
        &mut self,
        ids: &[NodeId],
        front_first: bool,
        step: fn(&mut SceneStore, NodeId) -> bool,
    ) -> bool {
        let mut ordered = ids.to_vec();
        let graph = self.store.graph();
        ordered.sort_by_key(|&id| graph.index_in_parent(id));
        if front_first {
            ordered.reverse();
        }
        self.batched(|store| {
            let mut changed = false;
            for id in ordered {
                changed |= step(store, id);
            }
            changed
        })
    }

    fn copy_selection(&mut self, ids: &[NodeId]) -> bool {
        let payload = clipboard::copy(self.store.graph(), ids);
        match clipboard::encode(&payload) {
            Ok(bytes) => {
                self.clipboard = Some(bytes);
                true
            }
            Err(err) => {
                log::warn!("copy failed: {err}");
                false
            }
        }
    }

    fn paste(&mut self) -> bool {
        let Some(bytes) = &self.clipboard else {
            return false;
        };
        let payload = match clipboard::decode(bytes) {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("paste failed: {err}");
                return false;
            }
        };
        let parent = self.store.selection().entered_container_id;
        !self.store.paste(&payload, parent).is_empty()
    }
}
