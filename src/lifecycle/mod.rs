//! Starting, wiring and stopping the economy.
//!
//! [`EconomySystem`] creates every actor before any of them runs, then injects each one's
//! context through `run(context)`: the node registry gets the resource catalog, the player
//! ledgers get the persistence handle, the process table needs nothing. The dependency graph is
//! acyclic, so dropping the [`Economy`](crate::economy::Economy) closes every channel and the
//! actors wind down on their own.

pub mod economy_system;
pub mod tracing;

pub use self::economy_system::EconomySystem;
pub use self::tracing::setup_tracing;
