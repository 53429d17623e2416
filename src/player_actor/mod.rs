//! Player ledgers: balances, tools and lifetime stats of every connected player.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::PlayerClient;
use crate::model::PlayerLedger;
use actor_framework::ResourceActor;

const PLAYER_CHANNEL_CAPACITY: usize = 256;

/// Creates the player ledger actor and its client.
pub fn new() -> (ResourceActor<PlayerLedger>, PlayerClient) {
    let (actor, generic_client) = ResourceActor::new(PLAYER_CHANNEL_CAPACITY);
    (actor, PlayerClient::new(generic_client))
}
