//! Embed render bookkeeping.
//!
//! Embed nodes carry raw markup that an external rasterizer turns into a
//! texture. Edits are debounced per node, and every request bumps a
//! generation counter so a slow render that finishes after a newer edit (or
//! after the node was deleted) is recognized and dropped instead of applied.

use crate::graph::FlatGraph;
use crate::id::NodeId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// A render the host should start now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTicket {
    pub id: NodeId,
    pub generation: u64,
}

/// What to do with a finished render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Latest generation for a live node: show it.
    Apply,
    /// A newer request exists; discard this result.
    Superseded,
    /// The node was deleted while rendering; discard and forget it.
    NodeGone,
}

#[derive(Debug, Clone, Default)]
struct EmbedEntry {
    generation: u64,
    deadline: Option<Instant>,
    in_flight: Option<u64>,
    last_good: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct EmbedScheduler {
    debounce: Duration,
    entries: HashMap<NodeId, EmbedEntry>,
}

impl Default for EmbedScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl EmbedScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            entries: HashMap::new(),
        }
    }

    /// Content of `id` changed. Restarts its debounce window.
    pub fn request(&mut self, id: NodeId, now: Instant) -> u64 {
        let entry = self.entries.entry(id).or_default();
        entry.generation += 1;
        entry.deadline = Some(now + self.debounce);
        entry.generation
    }

    /// Renders whose debounce window has elapsed, in id order.
    pub fn due(&mut self, now: Instant) -> Vec<RenderTicket> {
        let mut tickets: Vec<RenderTicket> = self
            .entries
            .iter_mut()
            .filter(|(_, e)| e.deadline.is_some_and(|d| d <= now))
            .map(|(&id, e)| {
                e.deadline = None;
                e.in_flight = Some(e.generation);
                RenderTicket {
                    id,
                    generation: e.generation,
                }
            })
            .collect();
        tickets.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        tickets
    }

    /// A render finished. The node is re-checked against `graph` first.
    pub fn complete(&mut self, id: NodeId, generation: u64, graph: &FlatGraph) -> Completion {
        if !graph.contains(id) {
            self.entries.remove(&id);
            log::debug!("dropping embed render for deleted node {id}");
            return Completion::NodeGone;
        }
        let Some(entry) = self.entries.get_mut(&id) else {
            return Completion::Superseded;
        };
        if entry.in_flight == Some(generation) {
            entry.in_flight = None;
        }
        if generation != entry.generation {
            return Completion::Superseded;
        }
        entry.last_good = Some(generation);
        Completion::Apply
    }

    /// A render failed. The last good texture stays in place.
    pub fn fail(&mut self, id: NodeId, generation: u64, reason: &str) {
        log::warn!("embed render {id} (generation {generation}) failed: {reason}");
        if let Some(entry) = self.entries.get_mut(&id)
            && entry.in_flight == Some(generation)
        {
            entry.in_flight = None;
        }
    }

    /// Forget `id` entirely, e.g. when its node is disposed.
    pub fn cancel(&mut self, id: NodeId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drop entries whose node no longer exists. Returns how many went.
    pub fn retain_existing(&mut self, graph: &FlatGraph) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| graph.contains(*id));
        before - self.entries.len()
    }

    pub fn is_pending(&self, id: NodeId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|e| e.deadline.is_some() || e.in_flight.is_some())
    }

    /// Generation of the texture currently on screen for `id`.
    pub fn last_good(&self, id: NodeId) -> Option<u64> {
        self.entries.get(&id).and_then(|e| e.last_good)
    }
}
