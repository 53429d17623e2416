//! # Tidepool Economy
//!
//! The server-authoritative resource economy of an underwater gathering and crafting game.
//! Resource nodes are scattered over the seabed, many connected players harvest them at once,
//! depleted nodes come back on a timer, and crafting turns harvested resources into tools,
//! buildables and decorations.
//!
//! ## Concurrency Model
//!
//! Every entity table is owned by one [`ResourceActor`](actor_framework::ResourceActor): the
//! node registry, the player ledgers and the crafting process table. Each actor handles its
//! requests one at a time, so a harvest's readiness check and the node's depletion, or a craft's
//! ingredient check and the debit, are a single step. Racing commands resolve to exactly one
//! winner; the loser sees an ordinary validation error.
//!
//! Respawn timers and running crafts are lightweight Tokio tasks, each cancellable on its own,
//! by region or all at once.
//!
//! ## Module Tour
//!
//! - [`economy`]: the [`Economy`](economy::Economy) façade, the only command entry point.
//! - [`lifecycle`]: [`EconomySystem`](lifecycle::EconomySystem) starts and stops the actors.
//! - [`placement`]: noise-weighted, constraint-checked node placement over a region.
//! - [`node_actor`], [`player_actor`], [`crafting`]: the three actor entities and their rules.
//! - [`respawn`]: per-node respawn timers.
//! - [`clients`]: typed wrappers around the generic actor clients.
//! - [`events`]: outbound events and reason codes.
//! - [`config`], [`persistence`], [`error`], [`model`]: the supporting cast.
//!
//! ## Running the Demo
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ECONOMY_CONFIG=economy.toml RUST_LOG=debug cargo run
//! ```

pub mod clients;
pub mod config;
pub mod crafting;
pub mod economy;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod model;
pub mod node_actor;
pub mod persistence;
pub mod placement;
pub mod player_actor;
pub mod respawn;
