//! # Observability
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered by `RUST_LOG`.
//! Module paths are hidden (`with_target(false)`); the structured fields (`player`, `node`,
//! `process`, `region`) carry the context instead.
//!
//! ```bash
//! # Harvests, crafts and region changes
//! RUST_LOG=info cargo run
//!
//! # Every actor round-trip, tick and timer
//! RUST_LOG=debug cargo run
//!
//! # Only the crafting engine
//! RUST_LOG=tidepool_economy::crafting=debug cargo run
//! ```
//!
//! With `RUST_LOG=info` a harvest followed by a craft reads:
//!
//! ```text
//! INFO harvest: Harvest succeeded player=player_1 node=node_4 kind=kelp amount=3
//! INFO start_crafting: Craft started player=player_1 process=craft_1 recipe=rope quantity=1 duration=5s
//! INFO Craft completed player=player_1 process=craft_1 quality=Good output=1
//! ```

pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
