use crate::crafting::{CraftError, ProcessAction};
use crate::model::{CraftingProcess, PlayerId, ProcessCreate, ProcessId};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for the crafting process table.
#[derive(Clone)]
pub struct ProcessClient {
    inner: ResourceClient<CraftingProcess>,
}

impl ProcessClient {
    pub fn new(inner: ResourceClient<CraftingProcess>) -> Self {
        Self { inner }
    }

    fn map_process_error(id: ProcessId, e: FrameworkError) -> CraftError {
        if e.is_not_found() {
            CraftError::ProcessNotFound(id)
        } else {
            Self::map_error(e)
        }
    }

    #[instrument(skip(self, params), fields(player = %params.player, recipe = %params.recipe))]
    pub async fn start(&self, params: ProcessCreate) -> Result<ProcessId, CraftError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn advance(&self, id: ProcessId) -> Result<f32, CraftError> {
        self.inner
            .perform_action(id, ProcessAction::Advance)
            .await
            .map_err(|e| Self::map_process_error(id, e))
    }

    /// Removes the process. Of several racing claims exactly one succeeds; the others get
    /// [`CraftError::ProcessNotFound`].
    #[instrument(skip(self))]
    pub async fn claim(&self, id: ProcessId) -> Result<(), CraftError> {
        debug!("Sending request");
        self.inner
            .delete(id)
            .await
            .map_err(|e| Self::map_process_error(id, e))
    }

    #[instrument(skip(self))]
    pub async fn for_player(&self, player: PlayerId) -> Result<Vec<CraftingProcess>, CraftError> {
        let mut processes: Vec<_> = self
            .list()
            .await?
            .into_iter()
            .filter(|p| p.player == player)
            .collect();
        processes.sort_by_key(|p| p.id);
        Ok(processes)
    }
}

#[async_trait]
impl ActorClient<CraftingProcess> for ProcessClient {
    type Error = CraftError;

    fn inner(&self) -> &ResourceClient<CraftingProcess> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        match e.into_entity_error::<CraftError>() {
            Ok(typed) => typed,
            Err(other) => CraftError::ActorCommunicationError(other.to_string()),
        }
    }
}
