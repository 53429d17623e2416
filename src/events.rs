//! Outbound events and the bus that carries them.
//!
//! Presentation, analytics and transport collaborators subscribe to the [`EventBus`]; the core
//! never waits for them. A subscriber that falls behind loses the oldest events
//! (`RecvError::Lagged`), the economy itself is unaffected.

use crate::model::{ItemKind, NodeId, PlayerId, ProcessId, QualityTier, RecipeId, RegionId};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Stable, serializable reason attached to failure events and command errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    NodeNotFound,
    NodeNotReady,
    TooFar,
    WrongTool,
    UnknownResourceType,
    UnknownRecipe,
    InvalidQuantity,
    MissingIngredients,
    InventoryFull,
    TooManyActiveCrafts,
    ProcessNotFound,
    NotProcessOwner,
    PlayerNotConnected,
    AlreadyConnected,
    ToolNotOwned,
    RollFailed,
    PlayerDisconnected,
    InvalidRegion,
    SurfaceUnavailable,
    Storage,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EconomyEvent {
    HarvestSucceeded {
        player: PlayerId,
        node: NodeId,
        kind: ItemKind,
        amount: u32,
        tool_used: Option<ItemKind>,
    },
    HarvestFailed {
        player: PlayerId,
        node: NodeId,
        reason: ReasonCode,
    },
    NodeRespawned {
        node: NodeId,
        kind: ItemKind,
        region: RegionId,
    },
    CraftStarted {
        player: PlayerId,
        process: ProcessId,
        recipe: RecipeId,
        quantity: u32,
        duration_ms: u64,
    },
    CraftProgress {
        player: PlayerId,
        process: ProcessId,
        progress: f32,
    },
    CraftCompleted {
        player: PlayerId,
        process: ProcessId,
        recipe: RecipeId,
        quantity: u32,
        quality: QualityTier,
        output: ItemKind,
        output_quantity: u64,
        bonus_quantity: u64,
        experience: u64,
    },
    CraftFailed {
        player: PlayerId,
        process: ProcessId,
        recipe: RecipeId,
        reason: ReasonCode,
    },
    CraftCancelled {
        player: PlayerId,
        process: ProcessId,
        recipe: RecipeId,
    },
    RegionPopulated {
        region: RegionId,
        nodes: usize,
    },
    RegionCleared {
        region: RegionId,
        nodes: usize,
    },
}

#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<EconomyEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EconomyEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: EconomyEvent) {
        if self.sender.send(event).is_err() {
            trace!("No event subscribers");
        }
    }
}
