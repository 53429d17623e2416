use crate::model::{PlayerId, ProcessId, RecipeId};
use std::time::Duration;
use tokio::time::Instant;

/// One running crafting operation. Ingredients were already consumed when it was created.
#[derive(Debug, Clone)]
pub struct CraftingProcess {
    pub id: ProcessId,
    pub player: PlayerId,
    pub recipe: RecipeId,
    pub quantity: u32,
    /// Base output held against the player's capacity while this process runs.
    pub reserved_output: u64,
    pub started_at: Instant,
    pub duration: Duration,
    /// Fraction in `[0, 1]`, advanced by the process's tick task.
    pub progress: f32,
}

impl CraftingProcess {
    pub fn fraction_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }
}

#[derive(Debug, Clone)]
pub struct ProcessCreate {
    pub player: PlayerId,
    pub recipe: RecipeId,
    pub quantity: u32,
    pub reserved_output: u64,
    pub duration: Duration,
}
