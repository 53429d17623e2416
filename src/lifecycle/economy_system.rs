use crate::config::{ConfigError, EconomyConfig};
use crate::economy::{Economy, EconomyClients};
use crate::events::EventBus;
use crate::persistence::{spawn_writer, KeyValueStore, PersistenceHandle, PlayerRepository};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

const EVENT_BUS_CAPACITY: usize = 1024;

/// Starts and stops the whole economy.
///
/// `EconomySystem` spawns the three entity actors (node registry, player ledgers, crafting
/// processes) and the persistence writer, injects each actor's context, and hands the wired
/// [`Economy`] to the caller.
///
/// # Example
///
/// ```ignore
/// let system = EconomySystem::new(EconomyConfig::default(), Arc::new(MemoryStore::new()))?;
///
/// system.economy.connect_player(PlayerId(1), Vec3::ZERO).await?;
/// let placed = system.economy.populate_region(&region, &seabed).await?;
///
/// system.shutdown().await?;
/// ```
pub struct EconomySystem {
    pub economy: Economy,
    persistence: PersistenceHandle,
    handles: Vec<JoinHandle<()>>,
    writer: JoinHandle<()>,
}

impl EconomySystem {
    /// Validates the configuration and starts every actor. Must be called inside a Tokio runtime.
    pub fn new(config: EconomyConfig, store: Arc<dyn KeyValueStore>) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        let catalog = Arc::new(config.catalog());
        let repository = PlayerRepository::new(store);

        // 1. Persistence first; the player actor's context needs its handle
        let (persistence, writer) = spawn_writer(repository.clone());

        // 2. Create actors
        let (node_actor, nodes) = crate::node_actor::new();
        let (player_actor, players) = crate::player_actor::new();
        let (process_actor, processes) = crate::crafting::new_process_table();

        // 3. Start actors with injected context
        let node_handle = tokio::spawn(node_actor.run(catalog.clone()));
        let player_handle = tokio::spawn(player_actor.run(persistence.clone()));
        let process_handle = tokio::spawn(process_actor.run(()));

        let economy = Economy::new(
            config,
            catalog,
            EconomyClients {
                nodes,
                players,
                processes,
            },
            repository,
            EventBus::new(EVENT_BUS_CAPACITY),
        );
        info!("Economy started");

        Ok(Self {
            economy,
            persistence,
            handles: vec![node_handle, player_handle, process_handle],
            writer,
        })
    }

    /// Waits until every record saved so far has reached the store.
    pub async fn flush(&self) {
        self.persistence.flush().await;
    }

    /// Stops timers and crafts, closes every actor, then drains the persistence queue.
    ///
    /// Ledgers are saved after every mutation, so nothing is lost for players still connected.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down economy...");

        self.economy.halt();

        // Dropping the last clients closes the actors' channels.
        drop(self.economy);
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        // The player actor held the other persistence handle; the writer exits once the queue
        // is empty.
        drop(self.persistence);
        if let Err(e) = self.writer.await {
            error!("Persistence writer failed: {:?}", e);
            return Err(format!("Persistence writer failed: {:?}", e));
        }

        info!("Economy shutdown complete.");
        Ok(())
    }
}
