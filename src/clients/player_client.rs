use crate::model::{ItemKind, PlayerCreate, PlayerId, PlayerLedger, PlayerUpdate, ToolRecord};
use crate::player_actor::{
    CraftCredit, HarvestCredit, PlayerAction, PlayerActionResult, PlayerError, SlotRelease,
};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Client for the player ledger actor.
#[derive(Clone)]
pub struct PlayerClient {
    inner: ResourceClient<PlayerLedger>,
}

impl PlayerClient {
    pub fn new(inner: ResourceClient<PlayerLedger>) -> Self {
        Self { inner }
    }

    fn map_player_error(id: PlayerId, e: FrameworkError) -> PlayerError {
        match e {
            FrameworkError::NotFound(_) => PlayerError::NotConnected(id),
            FrameworkError::AlreadyExists(_) => PlayerError::AlreadyConnected(id),
            other => Self::map_error(other),
        }
    }

    async fn act(&self, id: PlayerId, action: PlayerAction) -> Result<PlayerActionResult, PlayerError> {
        self.inner
            .perform_action(id, action)
            .await
            .map_err(|e| Self::map_player_error(id, e))
    }

    #[instrument(skip(self, params))]
    pub async fn connect(&self, id: PlayerId, params: PlayerCreate) -> Result<(), PlayerError> {
        debug!(returning = params.record.is_some(), "Sending request");
        self.inner
            .insert(id, params)
            .await
            .map(|_| ())
            .map_err(|e| Self::map_player_error(id, e))
    }

    /// Removes the ledger. Its final record is persisted on the way out.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, id: PlayerId) -> Result<(), PlayerError> {
        debug!("Sending request");
        self.inner
            .delete(id)
            .await
            .map_err(|e| Self::map_player_error(id, e))
    }

    #[instrument(skip(self))]
    pub async fn ledger(&self, id: PlayerId) -> Result<PlayerLedger, PlayerError> {
        self.get(id).await?.ok_or(PlayerError::NotConnected(id))
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: PlayerId, update: PlayerUpdate) -> Result<PlayerLedger, PlayerError> {
        debug!("Sending request");
        self.inner
            .update(id, update)
            .await
            .map_err(|e| Self::map_player_error(id, e))
    }

    #[instrument(skip(self, ingredients))]
    pub async fn reserve_craft(
        &self,
        id: PlayerId,
        ingredients: BTreeMap<ItemKind, u64>,
        output_items: u64,
        max_active: u32,
    ) -> Result<(), PlayerError> {
        debug!("Sending request");
        self.act(
            id,
            PlayerAction::ReserveCraft {
                ingredients,
                output_items,
                max_active,
            },
        )
        .await
        .map(|_| ())
    }

    /// Returns the number of items actually credited.
    #[instrument(skip(self))]
    pub async fn complete_craft(&self, id: PlayerId, credit: CraftCredit) -> Result<u64, PlayerError> {
        debug!("Sending request");
        match self.act(id, PlayerAction::CompleteCraft(credit)).await? {
            PlayerActionResult::CompleteCraft(credited) => Ok(credited),
            other => Err(PlayerError::ActorCommunicationError(format!(
                "unexpected result {other:?}"
            ))),
        }
    }

    #[instrument(skip(self))]
    pub async fn release_slot(
        &self,
        id: PlayerId,
        release: SlotRelease,
        reserved_output: u64,
    ) -> Result<(), PlayerError> {
        debug!("Sending request");
        self.act(
            id,
            PlayerAction::ReleaseCraftSlot {
                release,
                reserved_output,
            },
        )
        .await
        .map(|_| ())
    }

    #[instrument(skip(self))]
    pub async fn credit_harvest(
        &self,
        id: PlayerId,
        kind: ItemKind,
        amount: u32,
        tool_used: Option<ItemKind>,
        wear: u32,
    ) -> Result<HarvestCredit, PlayerError> {
        debug!("Sending request");
        match self
            .act(
                id,
                PlayerAction::CreditHarvest {
                    kind,
                    amount,
                    tool_used,
                    wear,
                },
            )
            .await?
        {
            PlayerActionResult::CreditHarvest(credit) => Ok(credit),
            other => Err(PlayerError::ActorCommunicationError(format!(
                "unexpected result {other:?}"
            ))),
        }
    }

    #[instrument(skip(self, items, tools))]
    pub async fn grant(
        &self,
        id: PlayerId,
        items: BTreeMap<ItemKind, u64>,
        tools: Vec<ToolRecord>,
    ) -> Result<(), PlayerError> {
        debug!("Sending request");
        self.act(id, PlayerAction::Grant { items, tools }).await.map(|_| ())
    }
}

#[async_trait]
impl ActorClient<PlayerLedger> for PlayerClient {
    type Error = PlayerError;

    fn inner(&self) -> &ResourceClient<PlayerLedger> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.into_entity_error::<PlayerError>() {
            Ok(typed) => typed,
            Err(other) => PlayerError::ActorCommunicationError(other.to_string()),
        }
    }
}
