//! The [`ActorEntity`] contract.

use async_trait::async_trait;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any entity must implement to be owned by a [`ResourceActor`](crate::ResourceActor).
///
/// Hooks run inside the actor's message loop, one request at a time. Anything an entity checks
/// and then mutates within a single hook cannot interleave with another request for the same
/// table.
///
/// # Context
/// `Context` is handed to every hook and is supplied when the actor is started with
/// `run(context)`, not when it is constructed. Use it for shared read-only catalogs or handles
/// to other services; use `()` when nothing is needed.
#[async_trait]
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// Identifier for this entity. Generated ids come from a `u32` counter; callers that own
    /// their ids use [`ResourceClient::insert`](crate::ResourceClient::insert) instead.
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug + From<u32>;

    /// Payload used to construct a new instance.
    type Create: Send + Sync + Debug;

    /// Payload used to update an existing instance.
    type Update: Send + Sync + Debug;

    /// Entity-specific operations beyond create/read/update/delete.
    type Action: Send + Sync + Debug;

    /// Result type returned by actions.
    type ActionResult: Send + Sync + Debug;

    /// Runtime dependencies injected into every hook.
    type Context: Send + Sync;

    /// One error type per entity. Clients recover it from
    /// [`FrameworkError::EntityError`](crate::FrameworkError::EntityError) by downcasting.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Builds the entity from its id and creation payload.
    fn from_create_params(id: Self::Id, params: Self::Create) -> Result<Self, Self::Error>;

    /// Called after construction, before the entity is stored.
    async fn on_create(&mut self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Applies an update payload.
    async fn on_update(
        &mut self,
        update: Self::Update,
        _ctx: &Self::Context,
    ) -> Result<(), Self::Error>;

    /// Called before the entity is removed. An error keeps the entity in the store.
    async fn on_delete(&self, _ctx: &Self::Context) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handles an entity-specific action.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        _ctx: &Self::Context,
    ) -> Result<Self::ActionResult, Self::Error>;
}
