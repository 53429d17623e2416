//! The façade's error type and the reason codes every error maps to.

use crate::config::ConfigError;
use crate::crafting::CraftError;
use crate::events::ReasonCode;
use crate::node_actor::HarvestError;
use crate::persistence::StoreError;
use crate::placement::PlacementError;
use crate::player_actor::PlayerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EconomyError {
    #[error(transparent)]
    Harvest(#[from] HarvestError),

    #[error(transparent)]
    Craft(#[from] CraftError),

    #[error(transparent)]
    Player(#[from] PlayerError),

    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EconomyError {
    pub fn code(&self) -> ReasonCode {
        match self {
            EconomyError::Harvest(e) => e.code(),
            EconomyError::Craft(e) => e.code(),
            EconomyError::Player(e) => e.code(),
            EconomyError::Placement(e) => e.code(),
            EconomyError::Store(_) => ReasonCode::Storage,
            EconomyError::Config(_) => ReasonCode::Internal,
        }
    }
}

impl HarvestError {
    pub fn code(&self) -> ReasonCode {
        match self {
            HarvestError::NodeNotFound(_) => ReasonCode::NodeNotFound,
            HarvestError::NodeNotReady(_) => ReasonCode::NodeNotReady,
            HarvestError::TooFar { .. } => ReasonCode::TooFar,
            HarvestError::WrongTool { .. } => ReasonCode::WrongTool,
            HarvestError::UnknownResourceType(_) => ReasonCode::UnknownResourceType,
            HarvestError::ActorCommunicationError(_) => ReasonCode::Internal,
        }
    }
}

impl CraftError {
    pub fn code(&self) -> ReasonCode {
        match self {
            CraftError::UnknownRecipe(_) => ReasonCode::UnknownRecipe,
            CraftError::InvalidQuantity(_) => ReasonCode::InvalidQuantity,
            CraftError::MissingIngredients(_) => ReasonCode::MissingIngredients,
            CraftError::InventoryFull { .. } => ReasonCode::InventoryFull,
            CraftError::TooManyActiveCrafts { .. } => ReasonCode::TooManyActiveCrafts,
            CraftError::ProcessNotFound(_) => ReasonCode::ProcessNotFound,
            CraftError::NotOwner { .. } => ReasonCode::NotProcessOwner,
            CraftError::PlayerNotConnected(_) => ReasonCode::PlayerNotConnected,
            CraftError::ActorCommunicationError(_) => ReasonCode::Internal,
        }
    }
}

impl PlayerError {
    pub fn code(&self) -> ReasonCode {
        match self {
            PlayerError::NotConnected(_) => ReasonCode::PlayerNotConnected,
            PlayerError::AlreadyConnected(_) => ReasonCode::AlreadyConnected,
            PlayerError::MissingIngredients(_) => ReasonCode::MissingIngredients,
            PlayerError::InventoryFull { .. } => ReasonCode::InventoryFull,
            PlayerError::TooManyActiveCrafts { .. } => ReasonCode::TooManyActiveCrafts,
            PlayerError::ToolNotOwned(_) => ReasonCode::ToolNotOwned,
            PlayerError::Storage(_) => ReasonCode::Storage,
            PlayerError::ActorCommunicationError(_) => ReasonCode::Internal,
        }
    }
}

impl PlacementError {
    pub fn code(&self) -> ReasonCode {
        match self {
            PlacementError::SurfaceUnavailable => ReasonCode::SurfaceUnavailable,
            PlacementError::InvalidRegion(_) => ReasonCode::InvalidRegion,
            PlacementError::Registration(e) => e.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, PlayerId};

    #[test]
    fn test_codes_survive_wrapping() {
        let err = EconomyError::from(HarvestError::NodeNotReady(NodeId(2)));
        assert_eq!(err.code(), ReasonCode::NodeNotReady);
        assert_eq!(err.to_string(), "Node node_2 is depleted");

        let err = EconomyError::from(CraftError::from(PlayerError::NotConnected(PlayerId(5))));
        assert_eq!(err.code(), ReasonCode::PlayerNotConnected);

        let err = EconomyError::from(PlacementError::Registration(HarvestError::UnknownResourceType(
            "driftwood".into(),
        )));
        assert_eq!(err.code(), ReasonCode::UnknownResourceType);
    }
}
