//! Error types for the node registry.

use crate::model::{ItemKind, NodeId};
use thiserror::Error;

/// Reasons a harvest or registry operation is rejected.
///
/// Harvest checks run in declaration order of the first four variants; the first failing
/// check is the one reported.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HarvestError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} is depleted")]
    NodeNotReady(NodeId),

    #[error("Too far from node: {distance:.2} > {range:.2}")]
    TooFar { distance: f32, range: f32 },

    #[error("Requires {required}, equipped {equipped:?}")]
    WrongTool {
        required: ItemKind,
        equipped: Option<ItemKind>,
    },

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(ItemKind),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for HarvestError {
    fn from(msg: String) -> Self {
        HarvestError::ActorCommunicationError(msg)
    }
}
