//! The node registry: every live [`ResourceNode`](crate::model::ResourceNode), owned by one actor.
//!
//! Harvest validation runs inside the actor, so the check of a node's state and the transition
//! to depleted happen in the same step. Two players racing for one node get exactly one
//! success; the other sees [`HarvestError::NodeNotReady`].

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::NodeClient;
use crate::model::ResourceNode;
use actor_framework::ResourceActor;

const NODE_CHANNEL_CAPACITY: usize = 256;

/// Creates the node registry actor and its client.
pub fn new() -> (ResourceActor<ResourceNode>, NodeClient) {
    let (actor, generic_client) = ResourceActor::new(NODE_CHANNEL_CAPACITY);
    (actor, NodeClient::new(generic_client))
}
