//! # Actor Framework
//!
//! Building blocks for single-writer entity tables on top of Tokio.
//!
//! Every table of entities (resource nodes, player ledgers, crafting processes) is owned by one
//! [`ResourceActor`] running in its own task. Callers talk to it through a cloneable
//! [`ResourceClient`]; requests are processed strictly one at a time, so any check-then-mutate
//! sequence written inside an entity hook is atomic with respect to every other request for that
//! table. This is what lets the economy guarantee that a node is never harvested twice and that a
//! balance is never spent twice, without a single lock in the domain code.
//!
//! ## Layers
//!
//! 1. **Entity** ([`ActorEntity`]): the domain type and its hooks.
//! 2. **Runtime** ([`ResourceActor`]): the message loop that owns the store.
//! 3. **Interface** ([`ResourceClient`], [`ActorClient`]): typed request/response calls.
//!
//! ## Example
//!
//! ```rust
//! use actor_framework::{ActorEntity, ResourceActor};
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug)]
//! struct Stockpile { id: u32, amount: u32 }
//! #[derive(Debug)] struct StockpileCreate { amount: u32 }
//! #[derive(Debug)] enum StockpileAction { Take(u32) }
//! #[derive(Debug, thiserror::Error)] #[error("stockpile exhausted")] struct Exhausted;
//!
//! #[async_trait]
//! impl ActorEntity for Stockpile {
//!     type Id = u32;
//!     type Create = StockpileCreate;
//!     type Update = ();
//!     type Action = StockpileAction;
//!     type ActionResult = u32;
//!     type Context = ();
//!     type Error = Exhausted;
//!
//!     fn from_create_params(id: u32, params: StockpileCreate) -> Result<Self, Exhausted> {
//!         Ok(Self { id, amount: params.amount })
//!     }
//!     async fn on_update(&mut self, _: (), _: &()) -> Result<(), Exhausted> { Ok(()) }
//!     async fn handle_action(&mut self, action: StockpileAction, _: &()) -> Result<u32, Exhausted> {
//!         match action {
//!             StockpileAction::Take(n) if n <= self.amount => { self.amount -= n; Ok(self.amount) }
//!             StockpileAction::Take(_) => Err(Exhausted),
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = ResourceActor::<Stockpile>::new(16);
//!     tokio::spawn(actor.run(()));
//!
//!     let id = client.create(StockpileCreate { amount: 3 }).await.unwrap();
//!     assert_eq!(client.perform_action(id, StockpileAction::Take(2)).await.unwrap(), 1);
//!     assert!(client.perform_action(id, StockpileAction::Take(2)).await.is_err());
//! }
//! ```
//!
//! ## Testing
//!
//! See [`mock`] for utilities that exercise client wrappers without spawning actors.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;

pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
