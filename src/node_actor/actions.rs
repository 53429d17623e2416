//! Custom actions for the node registry.
//!
//! Both actions are state transitions. Nothing else moves a node between
//! [`NodeState::Available`](crate::model::NodeState::Available) and
//! [`NodeState::Depleted`](crate::model::NodeState::Depleted).

use crate::model::{HarvestAttempt, YieldDescriptor};

#[derive(Debug, Clone)]
pub enum NodeAction {
    /// Validates the attempt and depletes the node.
    ///
    /// # Errors
    /// [`NodeNotReady`](super::HarvestError::NodeNotReady),
    /// [`TooFar`](super::HarvestError::TooFar) or [`WrongTool`](super::HarvestError::WrongTool);
    /// the node is left untouched.
    Harvest(HarvestAttempt),
    /// Makes a depleted node available again. Sent only by the respawn scheduler.
    Respawn,
}

/// Results from NodeActions - variants match 1:1 with NodeAction
#[derive(Debug, Clone)]
pub enum NodeActionResult {
    Harvest(YieldDescriptor),
    /// `false` when the node was already available.
    Respawn(bool),
}
