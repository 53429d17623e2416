//! Crafting settlement.
//!
//! Starting a craft is a single ledger action: the player actor re-checks the craft cap, the
//! ingredients and the inventory room and debits the ingredients in the same step, so two
//! concurrent starts against one balance cannot both pass. Each running craft then gets its own
//! tick task that reports progress and, at the end, settles the outcome.
//!
//! Completion and cancellation race through the process table: whoever deletes the process
//! first decides its fate. Consumed ingredients are never refunded, whether the craft fails or
//! is cancelled.

pub mod error;
pub mod process;
pub mod settlement;

pub use error::*;
pub use process::ProcessAction;
pub use settlement::{craft_duration, roll_failure, roll_quality, settle, Settlement};

use crate::clients::{PlayerClient, ProcessClient};
use crate::config::{CraftingSettings, RecipeBook};
use crate::events::{EconomyEvent, EventBus, ReasonCode};
use crate::model::{
    CraftingProcess, MissingIngredient, PlayerId, ProcessCreate, ProcessId, Recipe, RecipeId,
};
use crate::player_actor::{CraftCredit, PlayerError, SlotRelease};
use actor_framework::{ActorClient, ResourceActor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

const PROCESS_CHANNEL_CAPACITY: usize = 128;

/// Creates the crafting process table actor and its client.
pub fn new_process_table() -> (ResourceActor<CraftingProcess>, ProcessClient) {
    let (actor, generic_client) = ResourceActor::new(PROCESS_CHANNEL_CAPACITY);
    (actor, ProcessClient::new(generic_client))
}

/// Whether a player can craft a recipe right now, and what is missing if not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeAvailability {
    pub recipe_id: RecipeId,
    pub name: String,
    pub quantity: u32,
    pub can_craft: bool,
    pub missing: Vec<MissingIngredient>,
    pub inventory_full: bool,
}

type TaskMap = Arc<Mutex<HashMap<ProcessId, JoinHandle<()>>>>;

/// Everything a tick task needs, cloned into it.
#[derive(Clone)]
struct Settler {
    settings: Arc<CraftingSettings>,
    players: PlayerClient,
    processes: ProcessClient,
    events: EventBus,
    tasks: TaskMap,
}

pub struct CraftingEngine {
    recipes: Arc<RecipeBook>,
    settler: Settler,
}

impl CraftingEngine {
    pub fn new(
        recipes: Arc<RecipeBook>,
        settings: CraftingSettings,
        players: PlayerClient,
        processes: ProcessClient,
        events: EventBus,
    ) -> Self {
        Self {
            recipes,
            settler: Settler {
                settings: Arc::new(settings),
                players,
                processes,
                events,
                tasks: Arc::new(Mutex::new(HashMap::new())),
            },
        }
    }

    fn recipe(&self, id: &RecipeId, quantity: u32) -> Result<&Recipe, CraftError> {
        let recipe = self
            .recipes
            .get(id)
            .ok_or_else(|| CraftError::UnknownRecipe(id.clone()))?;
        if quantity == 0 {
            return Err(CraftError::InvalidQuantity(quantity));
        }
        Ok(recipe)
    }

    /// Read-only check against the player's current balances.
    #[instrument(skip(self))]
    pub async fn validate_recipe(
        &self,
        player: PlayerId,
        recipe_id: &RecipeId,
        quantity: u32,
    ) -> Result<RecipeAvailability, CraftError> {
        let recipe = self.recipe(recipe_id, quantity)?;
        let ledger = self.settler.players.ledger(player).await?;
        let missing = ledger.missing_for(&recipe.scaled_ingredients(quantity));
        let inventory_full = !ledger.has_room_for(recipe.base_output(quantity));
        Ok(RecipeAvailability {
            recipe_id: recipe.id.clone(),
            name: recipe.name.clone(),
            quantity,
            can_craft: missing.is_empty() && !inventory_full,
            missing,
            inventory_full,
        })
    }

    /// Single-unit availability of every recipe, in recipe id order.
    #[instrument(skip(self))]
    pub async fn available_recipes(
        &self,
        player: PlayerId,
    ) -> Result<Vec<RecipeAvailability>, CraftError> {
        let ledger = self.settler.players.ledger(player).await?;
        Ok(self
            .recipes
            .iter()
            .map(|recipe| {
                let missing = ledger.missing_for(&recipe.scaled_ingredients(1));
                let inventory_full = !ledger.has_room_for(recipe.base_output(1));
                RecipeAvailability {
                    recipe_id: recipe.id.clone(),
                    name: recipe.name.clone(),
                    quantity: 1,
                    can_craft: missing.is_empty() && !inventory_full,
                    missing,
                    inventory_full,
                }
            })
            .collect())
    }

    /// Consumes the ingredients and starts the process.
    #[instrument(skip(self))]
    pub async fn start_crafting(
        &self,
        player: PlayerId,
        recipe_id: &RecipeId,
        quantity: u32,
    ) -> Result<ProcessId, CraftError> {
        let recipe = self.recipe(recipe_id, quantity)?.clone();
        let settler = &self.settler;
        let duration = craft_duration(&settler.settings, &recipe, quantity)
            .filter(|d| Instant::now().checked_add(*d).is_some())
            .ok_or(CraftError::InvalidQuantity(quantity))?;
        let reserved_output = recipe.base_output(quantity);

        settler
            .players
            .reserve_craft(
                player,
                recipe.scaled_ingredients(quantity),
                reserved_output,
                settler.settings.max_active_crafts,
            )
            .await?;

        let process = match settler
            .processes
            .start(ProcessCreate {
                player,
                recipe: recipe.id.clone(),
                quantity,
                reserved_output,
                duration,
            })
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(%player, error = %e, "Process table rejected a reserved craft");
                let _ = settler
                    .players
                    .release_slot(player, SlotRelease::Failed, reserved_output)
                    .await;
                return Err(e);
            }
        };

        settler.events.publish(EconomyEvent::CraftStarted {
            player,
            process,
            recipe: recipe.id.clone(),
            quantity,
            duration_ms: duration.as_millis() as u64,
        });
        info!(%player, %process, recipe = %recipe.id, quantity, ?duration, "Craft started");

        {
            // The handle is recorded before the task can try to remove it.
            let mut tasks = lock_tasks(&settler.tasks);
            let worker = settler.clone();
            let handle = tokio::spawn(async move {
                worker.run(process, player, recipe, quantity, duration).await;
            });
            tasks.insert(process, handle);
        }
        Ok(process)
    }

    /// Stops a running craft. Ingredients are not refunded.
    #[instrument(skip(self))]
    pub async fn cancel(&self, player: PlayerId, process: ProcessId) -> Result<(), CraftError> {
        let settler = &self.settler;
        let Some(entry) = settler.processes.get(process).await? else {
            return Err(CraftError::ProcessNotFound(process));
        };
        if entry.player != player {
            return Err(CraftError::NotOwner { process, player });
        }

        settler.processes.claim(process).await?;
        let handle = lock_tasks(&settler.tasks).remove(&process);
        if let Some(handle) = handle {
            handle.abort();
        }

        match settler
            .players
            .release_slot(player, SlotRelease::Cancelled, entry.reserved_output)
            .await
        {
            Ok(()) | Err(PlayerError::NotConnected(_)) => {}
            Err(e) => warn!(%player, %process, error = %e, "Failed to release craft slot"),
        }
        settler.events.publish(EconomyEvent::CraftCancelled {
            player,
            process,
            recipe: entry.recipe,
        });
        info!(%player, %process, "Craft cancelled");
        Ok(())
    }

    /// Cancels every process the player owns. Used on disconnect.
    pub async fn cancel_all_for(&self, player: PlayerId) -> Result<usize, CraftError> {
        let mut cancelled = 0;
        for process in self.settler.processes.for_player(player).await? {
            match self.cancel(player, process.id).await {
                Ok(()) => cancelled += 1,
                Err(CraftError::ProcessNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(cancelled)
    }

    pub fn active_tasks(&self) -> usize {
        lock_tasks(&self.settler.tasks).len()
    }

    /// Aborts every tick task. Processes left in the table are dropped with it.
    pub fn shutdown(&self) {
        let drained: Vec<_> = lock_tasks(&self.settler.tasks).drain().collect();
        for (process, handle) in drained {
            debug!(%process, "Aborting craft task");
            handle.abort();
        }
    }
}

fn lock_tasks(tasks: &TaskMap) -> std::sync::MutexGuard<'_, HashMap<ProcessId, JoinHandle<()>>> {
    tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Settler {
    async fn run(
        self,
        process: ProcessId,
        player: PlayerId,
        recipe: Recipe,
        quantity: u32,
        duration: Duration,
    ) {
        self.drive(process, player, &recipe, quantity, duration).await;
        lock_tasks(&self.tasks).remove(&process);
    }

    async fn drive(
        &self,
        process: ProcessId,
        player: PlayerId,
        recipe: &Recipe,
        quantity: u32,
        duration: Duration,
    ) {
        let deadline = Instant::now() + duration;
        let tick = self.settings.tick_interval();

        while Instant::now() < deadline {
            tokio::time::sleep_until((Instant::now() + tick).min(deadline)).await;
            if Instant::now() >= deadline {
                break;
            }
            match self.processes.advance(process).await {
                Ok(progress) => self.events.publish(EconomyEvent::CraftProgress {
                    player,
                    process,
                    progress,
                }),
                Err(CraftError::ProcessNotFound(_)) => return,
                Err(e) => {
                    warn!(%process, error = %e, "Craft tick failed");
                    return;
                }
            }
        }

        self.finish(process, player, recipe, quantity).await;
    }

    async fn finish(&self, process: ProcessId, player: PlayerId, recipe: &Recipe, quantity: u32) {
        if let Err(e) = self.processes.claim(process).await {
            debug!(%process, error = %e, "Craft already claimed");
            return;
        }

        let reserved_output = recipe.base_output(quantity);
        let mut rng = StdRng::from_entropy();
        if roll_failure(&mut rng, self.settings.failure_rate) {
            self.fail(process, player, recipe, reserved_output).await;
            return;
        }
        let Some(tier) = roll_quality(&mut rng, &self.settings.quality_tiers) else {
            warn!(%process, "Quality ladder is empty");
            self.fail(process, player, recipe, reserved_output).await;
            return;
        };

        let payout = settle(recipe, quantity, tier);
        let credit = CraftCredit {
            output: recipe.output.clone(),
            reserved_output,
            quantity: payout.total(),
            quality: tier.tier,
            tool_durability: payout.tool_durability,
            experience: payout.experience,
        };
        let credited = match self.players.complete_craft(player, credit).await {
            Ok(credited) => credited,
            Err(e) => {
                warn!(%player, %process, error = %e, "Craft output could not be credited");
                self.events.publish(EconomyEvent::CraftFailed {
                    player,
                    process,
                    recipe: recipe.id.clone(),
                    reason: ReasonCode::PlayerDisconnected,
                });
                return;
            }
        };

        self.events.publish(EconomyEvent::CraftCompleted {
            player,
            process,
            recipe: recipe.id.clone(),
            quantity,
            quality: tier.tier,
            output: recipe.output.clone(),
            output_quantity: credited,
            bonus_quantity: credited.saturating_sub(payout.base),
            experience: payout.experience,
        });
        info!(%player, %process, quality = ?tier.tier, output = credited, "Craft completed");
    }

    async fn fail(&self, process: ProcessId, player: PlayerId, recipe: &Recipe, reserved_output: u64) {
        if let Err(e) = self
            .players
            .release_slot(player, SlotRelease::Failed, reserved_output)
            .await
        {
            warn!(%player, %process, error = %e, "Failed to release craft slot");
        }
        self.events.publish(EconomyEvent::CraftFailed {
            player,
            process,
            recipe: recipe.id.clone(),
            reason: ReasonCode::RollFailed,
        });
        info!(%player, %process, "Craft failed");
    }
}
