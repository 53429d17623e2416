//! Error types for crafting.

use crate::model::{MissingIngredient, PlayerId, ProcessId, RecipeId};
use crate::player_actor::PlayerError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CraftError {
    #[error("Unknown recipe: {0}")]
    UnknownRecipe(RecipeId),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Missing {} ingredient(s)", .0.len())]
    MissingIngredients(Vec<MissingIngredient>),

    #[error("Inventory full: {required} items needed, capacity {capacity}")]
    InventoryFull { required: u64, capacity: u64 },

    #[error("Too many active crafts (limit {limit})")]
    TooManyActiveCrafts { limit: u32 },

    #[error("Crafting process not found: {0}")]
    ProcessNotFound(ProcessId),

    #[error("Process {process} does not belong to {player}")]
    NotOwner { process: ProcessId, player: PlayerId },

    #[error("Player not connected: {0}")]
    PlayerNotConnected(PlayerId),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for CraftError {
    fn from(msg: String) -> Self {
        CraftError::ActorCommunicationError(msg)
    }
}

impl From<PlayerError> for CraftError {
    fn from(e: PlayerError) -> Self {
        match e {
            PlayerError::MissingIngredients(missing) => CraftError::MissingIngredients(missing),
            PlayerError::InventoryFull { required, capacity } => {
                CraftError::InventoryFull { required, capacity }
            }
            PlayerError::TooManyActiveCrafts { limit } => CraftError::TooManyActiveCrafts { limit },
            PlayerError::NotConnected(player) => CraftError::PlayerNotConnected(player),
            other => CraftError::ActorCommunicationError(other.to_string()),
        }
    }
}
