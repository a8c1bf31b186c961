pub mod clipboard;
pub mod component;
pub mod config;
pub mod embed;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod history;
pub mod hit;
pub mod id;
pub mod layout;
pub mod model;
pub mod patch;
pub mod path_data;
pub mod selection;
pub mod store;
pub mod text;

pub use clipboard::ClipboardPayload;
pub use component::RenderNode;
pub use config::StoreConfig;
pub use error::{ClipboardError, ResolveError, StoreError};
pub use geometry::{Alignment, Axis};
pub use graph::FlatGraph;
pub use history::{History, Snapshot};
pub use id::NodeId;
pub use layout::{LaidOut, Size};
pub use model::*;
pub use patch::NodePatch;
pub use selection::{EditingMode, EscapeOutcome, SelectionState};
pub use store::{SceneStore, StoreChange, StoreEvent, SubscriptionId};
pub use text::{EstimatedMeasurer, TextMeasurer, TextMetrics};
