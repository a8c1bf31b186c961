use crate::history::DEFAULT_HISTORY_DEPTH;
use crate::model::FontSpec;
use serde::{Deserialize, Serialize};

/// Store tuning knobs. Every field has a default, so a host may deserialize
/// a partial table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum undo entries kept; the oldest are dropped first.
    pub history_depth: usize,
    /// Offset applied to duplicated nodes, in both axes.
    pub duplicate_offset: f32,
    /// Offset applied to pasted roots when pasting onto their source parent.
    pub paste_offset: f32,
    /// Font given to text nodes created without one.
    pub default_font: FontSpec,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_depth: DEFAULT_HISTORY_DEPTH,
            duplicate_offset: 20.0,
            paste_offset: 10.0,
            default_font: FontSpec::default(),
        }
    }
}
