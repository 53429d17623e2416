//! Typed wrappers around [`ResourceClient`](actor_framework::ResourceClient), one per actor.

pub mod node_client;
pub mod player_client;
pub mod process_client;

pub use node_client::*;
pub use player_client::*;
pub use process_client::*;
