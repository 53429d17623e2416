//! A connected player's economic state.
//!
//! # Actor Framework
//! Implements [`ActorEntity`](actor_framework::ActorEntity) in
//! [`player_actor::entity`](crate::player_actor::entity). Balances are only changed by the
//! ledger's own actions, one request at a time, so a reservation can never spend the same
//! units twice.
use crate::model::{ItemKind, PlayerId, QualityTier};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub kind: ItemKind,
    pub durability: u32,
    pub max_durability: u32,
    pub quality: QualityTier,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeStats {
    pub harvests: u64,
    pub resources_harvested: u64,
    pub crafts_started: u64,
    pub crafts_completed: u64,
    pub crafts_failed: u64,
    pub crafts_cancelled: u64,
    pub items_crafted: u64,
    pub tools_broken: u64,
    pub experience: u64,
}

/// Persisted form of a player's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    #[serde(default)]
    pub balances: BTreeMap<ItemKind, u64>,
    #[serde(default)]
    pub tools: Vec<ToolRecord>,
    #[serde(default)]
    pub stats: LifetimeStats,
}

impl PlayerRecord {
    pub fn empty(player_id: PlayerId) -> Self {
        Self {
            player_id,
            balances: BTreeMap::new(),
            tools: Vec::new(),
            stats: LifetimeStats::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingIngredient {
    pub kind: ItemKind,
    pub required: u64,
    pub available: u64,
}

#[derive(Debug, Clone)]
pub struct PlayerLedger {
    pub id: PlayerId,
    pub balances: BTreeMap<ItemKind, u64>,
    pub tools: Vec<ToolRecord>,
    pub stats: LifetimeStats,
    pub position: Vec3,
    pub equipped_tool: Option<ItemKind>,
    pub active_crafts: u32,
    /// Base output owed to running crafts. Counts against capacity until they settle.
    pub pending_output: u64,
    pub inventory_capacity: u64,
}

impl PlayerLedger {
    pub fn from_record(record: PlayerRecord, inventory_capacity: u64, position: Vec3) -> Self {
        Self {
            id: record.player_id,
            balances: record.balances,
            tools: record.tools,
            stats: record.stats,
            position,
            equipped_tool: None,
            active_crafts: 0,
            pending_output: 0,
            inventory_capacity,
        }
    }

    pub fn to_record(&self) -> PlayerRecord {
        PlayerRecord {
            player_id: self.id,
            balances: self.balances.clone(),
            tools: self.tools.clone(),
            stats: self.stats.clone(),
        }
    }

    pub fn balance(&self, kind: &ItemKind) -> u64 {
        self.balances.get(kind).copied().unwrap_or(0)
    }

    /// Every counted item plus every durable tool record.
    pub fn total_items(&self) -> u64 {
        self.balances.values().sum::<u64>() + self.tools.len() as u64
    }

    pub fn owns_tool(&self, kind: &ItemKind) -> bool {
        self.tools.iter().any(|t| &t.kind == kind)
    }

    /// Ingredients this ledger cannot cover, in kind order.
    pub fn missing_for(&self, required: &BTreeMap<ItemKind, u64>) -> Vec<MissingIngredient> {
        required
            .iter()
            .filter_map(|(kind, &amount)| {
                let available = self.balance(kind);
                (available < amount).then(|| MissingIngredient {
                    kind: kind.clone(),
                    required: amount,
                    available,
                })
            })
            .collect()
    }

    /// Items held plus output already promised to running crafts.
    pub fn committed_items(&self) -> u64 {
        self.total_items().saturating_add(self.pending_output)
    }

    pub fn free_room(&self) -> u64 {
        self.inventory_capacity.saturating_sub(self.committed_items())
    }

    pub fn has_room_for(&self, extra_items: u64) -> bool {
        self.committed_items().saturating_add(extra_items) <= self.inventory_capacity
    }

    pub(crate) fn credit(&mut self, kind: &ItemKind, amount: u64) {
        if amount > 0 {
            *self.balances.entry(kind.clone()).or_insert(0) += amount;
        }
    }

    /// Removes `required` from the balances. Callers check [`missing_for`](Self::missing_for)
    /// first; entries that reach zero are dropped.
    pub(crate) fn debit_all(&mut self, required: &BTreeMap<ItemKind, u64>) {
        for (kind, amount) in required {
            if let Some(balance) = self.balances.get_mut(kind) {
                *balance = balance.saturating_sub(*amount);
                if *balance == 0 {
                    self.balances.remove(kind);
                }
            }
        }
    }
}

/// Payload for registering a connected player.
#[derive(Debug, Clone)]
pub struct PlayerCreate {
    /// Record loaded from storage, if the player has played before.
    pub record: Option<PlayerRecord>,
    pub inventory_capacity: u64,
    pub position: Vec3,
}

/// Updates coming from the movement and equipment collaborators.
#[derive(Debug, Clone, Default)]
pub struct PlayerUpdate {
    pub position: Option<Vec3>,
    /// `Some(None)` unequips.
    pub equipped_tool: Option<Option<ItemKind>>,
}
