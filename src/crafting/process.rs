//! [`ActorEntity`] implementation for [`CraftingProcess`].
//!
//! The process table is the arbiter between completion and cancellation: whichever side
//! deletes the process first owns its outcome.

use super::error::CraftError;
use crate::model::{CraftingProcess, ProcessCreate, ProcessId};
use actor_framework::ActorEntity;
use async_trait::async_trait;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub enum ProcessAction {
    /// Recomputes progress from the clock and returns it.
    Advance,
}

#[async_trait]
impl ActorEntity for CraftingProcess {
    type Id = ProcessId;
    type Create = ProcessCreate;
    type Update = ();
    type Action = ProcessAction;
    type ActionResult = f32;
    type Context = ();
    type Error = CraftError;

    fn from_create_params(id: ProcessId, params: ProcessCreate) -> Result<Self, CraftError> {
        if params.quantity == 0 {
            return Err(CraftError::InvalidQuantity(0));
        }
        Ok(Self {
            id,
            player: params.player,
            recipe: params.recipe,
            quantity: params.quantity,
            reserved_output: params.reserved_output,
            started_at: Instant::now(),
            duration: params.duration,
            progress: 0.0,
        })
    }

    async fn on_update(&mut self, _: (), _: &()) -> Result<(), CraftError> {
        Ok(())
    }

    async fn handle_action(&mut self, action: ProcessAction, _: &()) -> Result<f32, CraftError> {
        match action {
            ProcessAction::Advance => {
                self.progress = self.fraction_at(Instant::now()).max(self.progress);
                Ok(self.progress)
            }
        }
    }
}
