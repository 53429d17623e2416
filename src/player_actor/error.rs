//! Error types for the player ledger actor.

use crate::model::{ItemKind, MissingIngredient, PlayerId};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlayerError {
    #[error("Player not connected: {0}")]
    NotConnected(PlayerId),

    #[error("Player already connected: {0}")]
    AlreadyConnected(PlayerId),

    #[error("Missing ingredients: {}", describe(.0))]
    MissingIngredients(Vec<MissingIngredient>),

    #[error("Inventory full: {required} items needed, capacity {capacity}")]
    InventoryFull { required: u64, capacity: u64 },

    #[error("Too many active crafts (limit {limit})")]
    TooManyActiveCrafts { limit: u32 },

    #[error("Tool not owned: {0}")]
    ToolNotOwned(ItemKind),

    #[error("Player storage error: {0}")]
    Storage(String),

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

fn describe(missing: &[MissingIngredient]) -> String {
    missing
        .iter()
        .map(|m| format!("{} {}/{}", m.kind, m.available, m.required))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<String> for PlayerError {
    fn from(msg: String) -> Self {
        PlayerError::ActorCommunicationError(msg)
    }
}
