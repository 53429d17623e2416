//! The command surface of the economy.
//!
//! [`Economy`] is the one entry point the session layer talks to and the one place outbound
//! events come from. It owns no state of its own: nodes, ledgers and processes live in their
//! actors, and every command here is a short sequence of actor round-trips.

use crate::clients::{NodeClient, PlayerClient, ProcessClient};
use crate::config::{EconomyConfig, ResourceCatalog, SpawnTable};
use crate::crafting::{CraftingEngine, RecipeAvailability};
use crate::error::EconomyError;
use crate::events::{EconomyEvent, EventBus};
use crate::model::{
    HarvestAttempt, ItemKind, NodeId, PlayerCreate, PlayerId, PlayerLedger, PlayerUpdate,
    ProcessId, RecipeId, ResourceNode, ToolRecord, YieldDescriptor,
};
use crate::node_actor::HarvestError;
use crate::persistence::PlayerRepository;
use crate::placement::{PlacedNode, PlacementEngine, Region, SurfaceQuery};
use crate::respawn::RespawnScheduler;
use actor_framework::ActorClient;
use glam::Vec3;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

/// Clients the economy drives. Built by [`crate::lifecycle::EconomySystem`].
pub struct EconomyClients {
    pub nodes: NodeClient,
    pub players: PlayerClient,
    pub processes: ProcessClient,
}

pub struct Economy {
    config: Arc<EconomyConfig>,
    catalog: Arc<ResourceCatalog>,
    nodes: NodeClient,
    players: PlayerClient,
    repository: PlayerRepository,
    placement: PlacementEngine,
    respawn: RespawnScheduler,
    crafting: CraftingEngine,
    events: EventBus,
}

impl Economy {
    pub fn new(
        config: Arc<EconomyConfig>,
        catalog: Arc<ResourceCatalog>,
        clients: EconomyClients,
        repository: PlayerRepository,
        events: EventBus,
    ) -> Self {
        let EconomyClients {
            nodes,
            players,
            processes,
        } = clients;
        let placement = PlacementEngine::new(
            config.placement.clone(),
            config.world.sea_level,
            catalog.clone(),
        );
        let respawn = RespawnScheduler::new(nodes.clone(), events.clone());
        let crafting = CraftingEngine::new(
            Arc::new(config.recipe_book()),
            config.crafting.clone(),
            players.clone(),
            processes,
            events.clone(),
        );
        Self {
            config,
            catalog,
            nodes,
            players,
            repository,
            placement,
            respawn,
            crafting,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EconomyEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn respawn(&self) -> &RespawnScheduler {
        &self.respawn
    }

    pub fn crafting(&self) -> &CraftingEngine {
        &self.crafting
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Loads the player's saved record, or starts an empty one, and opens their ledger.
    #[instrument(skip(self))]
    pub async fn connect_player(&self, player: PlayerId, position: Vec3) -> Result<(), EconomyError> {
        let record = self.repository.load(player).await?;
        let returning = record.is_some();
        self.players
            .connect(
                player,
                PlayerCreate {
                    record,
                    inventory_capacity: self.config.player.inventory_capacity,
                    position,
                },
            )
            .await?;
        info!(%player, returning, "Player connected");
        Ok(())
    }

    /// Cancels the player's crafts and closes their ledger, which persists the final record.
    #[instrument(skip(self))]
    pub async fn disconnect_player(&self, player: PlayerId) -> Result<(), EconomyError> {
        let cancelled = self.crafting.cancel_all_for(player).await?;
        self.players.disconnect(player).await?;
        info!(%player, cancelled, "Player disconnected");
        Ok(())
    }

    pub async fn update_position(&self, player: PlayerId, position: Vec3) -> Result<(), EconomyError> {
        self.players
            .update(
                player,
                PlayerUpdate {
                    position: Some(position),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    /// Equips an owned tool, or unequips with `None`.
    #[instrument(skip(self))]
    pub async fn equip_tool(&self, player: PlayerId, tool: Option<ItemKind>) -> Result<(), EconomyError> {
        self.players
            .update(
                player,
                PlayerUpdate {
                    equipped_tool: Some(tool),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    /// Credits items and tools outside of harvesting, e.g. a starting kit.
    #[instrument(skip(self, items, tools))]
    pub async fn grant_items(
        &self,
        player: PlayerId,
        items: BTreeMap<ItemKind, u64>,
        tools: Vec<ToolRecord>,
    ) -> Result<(), EconomyError> {
        self.players.grant(player, items, tools).await?;
        Ok(())
    }

    pub async fn player_snapshot(&self, player: PlayerId) -> Result<PlayerLedger, EconomyError> {
        Ok(self.players.ledger(player).await?)
    }

    // =========================================================================
    // Regions and nodes
    // =========================================================================

    /// Populates a region with the configured spawn table.
    pub async fn populate_region(
        &self,
        region: &Region,
        surface: &dyn SurfaceQuery,
    ) -> Result<Vec<PlacedNode>, EconomyError> {
        let table = self.catalog.spawn_table();
        self.populate_region_with(region, &table, surface).await
    }

    /// Populates a region with an explicit, ordered spawn table.
    #[instrument(skip(self, table, surface), fields(region = %region.id))]
    pub async fn populate_region_with(
        &self,
        region: &Region,
        table: &SpawnTable,
        surface: &dyn SurfaceQuery,
    ) -> Result<Vec<PlacedNode>, EconomyError> {
        let placed = self
            .placement
            .place_resources(region, table, surface, &self.nodes)
            .await?;
        self.events.publish(EconomyEvent::RegionPopulated {
            region: region.id,
            nodes: placed.len(),
        });
        Ok(placed)
    }

    /// Cancels the region's respawn timers, then removes its nodes.
    #[instrument(skip(self), fields(region = %region.id))]
    pub async fn clear_region(&self, region: &Region) -> Result<usize, EconomyError> {
        let timers = self.respawn.cancel_region(region.id);
        let mut removed = 0;
        for node in self.nodes.in_region(region.id).await? {
            match self.nodes.remove(node.id).await {
                Ok(()) => removed += 1,
                Err(HarvestError::NodeNotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.events.publish(EconomyEvent::RegionCleared {
            region: region.id,
            nodes: removed,
        });
        info!(removed, timers, "Region cleared");
        Ok(removed)
    }

    pub async fn node(&self, id: NodeId) -> Result<Option<ResourceNode>, EconomyError> {
        Ok(self.nodes.get(id).await?)
    }

    // =========================================================================
    // Harvesting
    // =========================================================================

    /// Harvests a node with the player's current position and equipped tool.
    ///
    /// On success the node is depleted, its respawn timer is running and the yield has been
    /// credited. Failures emit `HarvestFailed` and leave the ledger untouched. A node depleted
    /// before its yield could be credited is made available again; if the node was removed in
    /// the meantime there is nothing to restore.
    #[instrument(skip(self))]
    pub async fn harvest(&self, player: PlayerId, node: NodeId) -> Result<YieldDescriptor, EconomyError> {
        let result = self.try_harvest(player, node).await;
        if let Err(e) = &result {
            debug!(%player, %node, error = %e, "Harvest rejected");
            self.events.publish(EconomyEvent::HarvestFailed {
                player,
                node,
                reason: e.code(),
            });
        }
        result
    }

    async fn try_harvest(&self, player: PlayerId, node: NodeId) -> Result<YieldDescriptor, EconomyError> {
        let ledger = self.players.ledger(player).await?;
        let descriptor = self
            .nodes
            .harvest(
                node,
                HarvestAttempt {
                    player,
                    player_position: ledger.position,
                    equipped_tool: ledger.equipped_tool.clone(),
                    interaction_range: self.config.harvest.interaction_range,
                },
            )
            .await?;

        match self
            .players
            .credit_harvest(
                player,
                descriptor.kind.clone(),
                descriptor.amount,
                descriptor.tool_used.clone(),
                self.config.harvest.tool_wear_per_harvest,
            )
            .await
        {
            Ok(credit) => {
                debug!(%player, balance = credit.balance, tool_durability = ?credit.tool_durability, "Harvest credited");
            }
            Err(e) => {
                warn!(%player, %node, error = %e, "Harvest yield could not be credited");
                if let Err(restore) = self.nodes.respawn(node).await {
                    warn!(%node, error = %restore, "Depleted node could not be restored");
                }
                return Err(e.into());
            }
        }

        self.respawn.schedule(
            node,
            descriptor.kind.clone(),
            descriptor.region,
            descriptor.respawn_delay,
        );

        self.events.publish(EconomyEvent::HarvestSucceeded {
            player,
            node,
            kind: descriptor.kind.clone(),
            amount: descriptor.amount,
            tool_used: descriptor.tool_used.clone(),
        });
        info!(%player, %node, kind = %descriptor.kind, amount = descriptor.amount, "Harvest succeeded");
        Ok(descriptor)
    }

    // =========================================================================
    // Crafting
    // =========================================================================

    pub async fn validate_recipe(
        &self,
        player: PlayerId,
        recipe: &RecipeId,
        quantity: u32,
    ) -> Result<RecipeAvailability, EconomyError> {
        Ok(self.crafting.validate_recipe(player, recipe, quantity).await?)
    }

    pub async fn query_available_recipes(
        &self,
        player: PlayerId,
    ) -> Result<Vec<RecipeAvailability>, EconomyError> {
        Ok(self.crafting.available_recipes(player).await?)
    }

    pub async fn start_craft(
        &self,
        player: PlayerId,
        recipe: &RecipeId,
        quantity: u32,
    ) -> Result<ProcessId, EconomyError> {
        Ok(self.crafting.start_crafting(player, recipe, quantity).await?)
    }

    pub async fn cancel_craft(&self, player: PlayerId, process: ProcessId) -> Result<(), EconomyError> {
        Ok(self.crafting.cancel(player, process).await?)
    }

    /// Stops every timer and craft task. Actors keep running until their clients are dropped.
    pub fn halt(&self) {
        let timers = self.respawn.cancel_all();
        self.crafting.shutdown();
        debug!(timers, "Economy halted");
    }
}
