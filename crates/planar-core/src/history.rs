//! Undo/redo snapshot stack.
//!
//! Every store mutation records a full `Snapshot` of the state *before* it
//! applies. Gestures (drags, multi-step keyboard edits) are wrapped in a
//! batch: the state at `begin_batch` is held back and pushed once, on the
//! first recorded change, so the whole gesture undoes in one step.

use crate::graph::FlatGraph;
use crate::selection::SelectionSnapshot;
use serde::{Deserialize, Serialize};

/// Default maximum undo depth.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// Immutable capture of the node maps plus selection context.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub graph: FlatGraph,
    pub selection: SelectionSnapshot,
}

#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// State captured when the outermost batch opened.
    batch_snapshot: Option<Snapshot>,
    /// Whether `batch_snapshot` has been pushed onto the undo stack.
    batch_pushed: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_snapshot: None,
            batch_pushed: false,
        }
    }

    /// Save the pre-mutation state. Inside a batch only the batch-start
    /// state is pushed, and only once.
    pub fn record(&mut self, before: Snapshot) {
        if self.batch_depth > 0 {
            self.mark_batch_changed();
            return;
        }
        self.push(before);
    }

    /// Push the batch-start state if the open batch has not pushed it yet.
    /// Returns false outside a batch.
    pub fn mark_batch_changed(&mut self) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        if !self.batch_pushed
            && let Some(start) = self.batch_snapshot.clone()
        {
            self.push(start);
            self.batch_pushed = true;
        }
        true
    }

    fn push(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Open a batch. Only the outermost call captures `current`.
    pub fn begin_batch(&mut self, current: Snapshot) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(current);
            self.batch_pushed = false;
        }
        self.batch_depth += 1;
    }

    /// Close a batch. Unbalanced calls are ignored.
    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 {
            self.reset_batch();
        }
    }

    /// Abandon the open batch entirely. If it had recorded a change, the
    /// undo entry it pushed is withdrawn and the batch-start state is
    /// returned so the caller can restore it.
    pub fn cancel_batch(&mut self) -> Option<Snapshot> {
        if self.batch_depth == 0 {
            return None;
        }
        let restored = if self.batch_pushed {
            self.undo_stack.pop()
        } else {
            None
        };
        self.batch_depth = 0;
        self.reset_batch();
        restored
    }

    fn reset_batch(&mut self) {
        self.batch_snapshot = None;
        self.batch_pushed = false;
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Pop the latest undo entry, parking `current` on the redo stack.
    /// Any open batch is closed.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop()?;
        self.batch_depth = 0;
        self.reset_batch();
        self.redo_stack.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.batch_depth = 0;
        self.reset_batch();
        self.undo_stack.push(current);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.reset_batch();
    }
}
