//! A placed, harvestable resource instance.
//!
//! # Actor Framework
//! Implements [`ActorEntity`](actor_framework::ActorEntity) in
//! [`node_actor::entity`](crate::node_actor::entity); the node registry actor is its only owner.
//! State moves Available → Depleted through the harvest action and Depleted → Available through
//! the respawn action, nothing else.
use crate::model::{ItemKind, NodeId, PlayerId, Rarity, RegionId};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    Available,
    Depleted,
}

#[derive(Debug, Clone)]
pub struct ResourceNode {
    pub id: NodeId,
    pub kind: ItemKind,
    pub rarity: Rarity,
    pub region: RegionId,
    pub position: Vec3,
    pub state: NodeState,
    pub spawned_at: Instant,
    pub last_harvest: Option<Instant>,
    pub respawn_delay: Duration,
}

impl ResourceNode {
    pub fn is_available(&self) -> bool {
        self.state == NodeState::Available
    }
}

/// Payload for registering a node found by the placement engine.
#[derive(Debug, Clone)]
pub struct NodeCreate {
    pub kind: ItemKind,
    pub rarity: Rarity,
    pub region: RegionId,
    pub position: Vec3,
    pub respawn_delay: Duration,
}

/// A harvest attempt as validated inside the registry actor.
#[derive(Debug, Clone)]
pub struct HarvestAttempt {
    pub player: PlayerId,
    pub player_position: Vec3,
    pub equipped_tool: Option<ItemKind>,
    pub interaction_range: f32,
}

/// Result of a successful harvest, handed to the player ledger for crediting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldDescriptor {
    pub node_id: NodeId,
    pub region: RegionId,
    pub kind: ItemKind,
    pub amount: u32,
    #[serde(skip)]
    pub respawn_delay: Duration,
    /// The equipped tool when it was required by the node or earned a yield bonus.
    pub tool_used: Option<ItemKind>,
}
