//! Error types for the scene store, instance resolution, and clipboard.

use crate::id::NodeId;
use thiserror::Error;

/// A refused or inconsistent store operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} cannot hold children")]
    NotAContainer(NodeId),

    #[error("moving {node} under {parent} would create a cycle")]
    Cycle { node: NodeId, parent: NodeId },

    #[error("node id {0} is already in use")]
    DuplicateId(NodeId),

    #[error("node id {0} contains the path separator")]
    ReservedId(NodeId),

    #[error("{0} is not a reusable component")]
    UnknownComponent(NodeId),

    #[error("{descendant} is not part of component {component}")]
    NotInComponent {
        component: NodeId,
        descendant: NodeId,
    },

    #[error("placing an instance of {component} here would make it contain itself")]
    ComponentCycle { component: NodeId },

    #[error("inconsistent graph: {0}")]
    Inconsistent(String),
}

/// Why an instance rendered empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("component {0} not found")]
    MissingComponent(NodeId),

    #[error("component {0} contains an instance of itself")]
    ComponentCycle(NodeId),
}

/// Clipboard encode/decode failure.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to encode clipboard payload: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode clipboard payload: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("clipboard payload is empty")]
    Empty,
}
