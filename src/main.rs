//! Demo: populate one region, harvest kelp, craft rope, and shut down.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ECONOMY_CONFIG=economy.toml RUST_LOG=debug cargo run
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tidepool_economy::config::EconomyConfig;
use tidepool_economy::events::EconomyEvent;
use tidepool_economy::lifecycle::{setup_tracing, EconomySystem};
use tidepool_economy::model::{ItemKind, PlayerId, RecipeId, RegionId, SurfaceMaterial};
use tidepool_economy::persistence::MemoryStore;
use tidepool_economy::placement::{FlatSeabed, Region};
use tracing::{debug, error, info, warn, Instrument};

const CRAFT_WAIT: Duration = Duration::from_secs(30);

fn load_config() -> Result<EconomyConfig, String> {
    match std::env::var_os("ECONOMY_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            info!(path = %path.display(), "Loading economy config");
            EconomyConfig::load_from_path(&path).map_err(|e| e.to_string())
        }
        None => Ok(EconomyConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    info!("Starting tidepool economy demo");
    let system = EconomySystem::new(load_config()?, Arc::new(MemoryStore::new()))
        .map_err(|e| e.to_string())?;
    let economy = &system.economy;

    // Print every event the way a transport collaborator would see it
    let mut events = economy.subscribe();
    let mut outcomes = economy.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => debug!(%json, "Event"),
                Err(e) => warn!(error = %e, "Event could not be encoded"),
            }
        }
    });

    let region = Region::square(RegionId(1), 200.0);
    let seabed = FlatSeabed::new(-15.0, SurfaceMaterial::Sand);
    let placed = economy
        .populate_region(&region, &seabed)
        .instrument(tracing::info_span!("populate"))
        .await
        .map_err(|e| e.to_string())?;
    info!(region = %region.id, nodes = placed.len(), "Region ready");

    let player = PlayerId(1);
    let kelp = ItemKind::from("kelp");
    let Some(target) = placed.iter().find(|n| n.kind == kelp) else {
        warn!("No kelp was placed; nothing to harvest");
        return system.shutdown().await;
    };

    economy
        .connect_player(player, target.position)
        .await
        .map_err(|e| e.to_string())?;

    let span = tracing::info_span!("harvest");
    match economy.harvest(player, target.node_id).instrument(span).await {
        Ok(descriptor) => info!(kind = %descriptor.kind, amount = descriptor.amount, "Harvested"),
        Err(e) => error!(error = %e, code = ?e.code(), "Harvest failed"),
    }

    // A second attempt on the same node is rejected until it respawns
    if let Err(e) = economy.harvest(player, target.node_id).await {
        info!(code = ?e.code(), "Second harvest rejected");
    }

    for availability in economy
        .query_available_recipes(player)
        .await
        .map_err(|e| e.to_string())?
    {
        info!(
            recipe = %availability.recipe_id,
            can_craft = availability.can_craft,
            missing = availability.missing.len(),
            "Recipe"
        );
    }

    let rope = RecipeId::from("rope");
    match economy.start_craft(player, &rope, 1).await {
        Ok(process) => {
            let wait = async {
                while let Ok(event) = outcomes.recv().await {
                    match event {
                        EconomyEvent::CraftCompleted {
                            process: done,
                            quality,
                            output_quantity,
                            ..
                        } if done == process => {
                            info!(?quality, output_quantity, "Rope crafted");
                            return;
                        }
                        EconomyEvent::CraftFailed {
                            process: done,
                            reason,
                            ..
                        } if done == process => {
                            warn!(?reason, "Rope craft failed");
                            return;
                        }
                        _ => {}
                    }
                }
            };
            if tokio::time::timeout(CRAFT_WAIT, wait).await.is_err() {
                warn!(%process, "Gave up waiting for the craft");
            }
        }
        Err(e) => error!(error = %e, "Craft could not start"),
    }

    match economy.player_snapshot(player).await {
        Ok(ledger) => info!(balances = ?ledger.balances, experience = ledger.stats.experience, "Final ledger"),
        Err(e) => warn!(error = %e, "Ledger unavailable"),
    }

    economy
        .disconnect_player(player)
        .await
        .map_err(|e| e.to_string())?;
    economy
        .clear_region(&region)
        .await
        .map_err(|e| e.to_string())?;

    system.shutdown().await?;
    printer.abort();

    info!("Demo completed");
    Ok(())
}
