use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The server half of an entity table.
///
/// Owns the `store` and the receiving end of the request channel, and processes one
/// [`ResourceRequest`] at a time inside [`run`](ResourceActor::run). Because the loop never
/// interleaves two requests, entity hooks can validate and mutate without locks.
///
/// # Operations
///
/// * **Create**: assigns the next id from the `u32` counter, builds the entity with
///   `from_create_params`, runs `on_create`, stores it.
/// * **Insert**: same as create with a caller-chosen id; fails with
///   [`FrameworkError::AlreadyExists`] when the id is taken.
/// * **Get** / **List**: return clones of stored entities.
/// * **Update**: runs `on_update` in place and returns the new state.
/// * **Delete**: runs `on_delete`, then removes. Exactly one of several racing deletes for the
///   same id succeeds; the rest see [`FrameworkError::NotFound`]. Callers use this to claim
///   ownership of an entity's final transition.
/// * **Action**: runs `handle_action` in place.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id: u32,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates the actor and its client. `buffer_size` bounds the request queue; senders wait
    /// when it is full.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id: 1,
        };
        (actor, ResourceClient::new(sender))
    }

    /// Runs the message loop until every client has been dropped.
    pub async fn run(mut self, context: T::Context) {
        // "ResourceNode" rather than "tidepool_economy::model::node::ResourceNode"
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    debug!(entity_type, ?params, "Create");
                    let id = T::Id::from(self.next_id);
                    self.next_id += 1;
                    let result = self.store_new(entity_type, id, params, &context).await;
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Insert {
                    id,
                    params,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?params, "Insert");
                    if self.store.contains_key(&id) {
                        warn!(entity_type, %id, "Already exists");
                        let _ = respond_to.send(Err(FrameworkError::AlreadyExists(id.to_string())));
                        continue;
                    }
                    let result = self.store_new(entity_type, id, params, &context).await;
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { respond_to } => {
                    debug!(entity_type, size = self.store.len(), "List");
                    let _ = respond_to.send(Ok(self.store.values().cloned().collect()));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let Some(item) = self.store.get_mut(&id) else {
                        debug!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    if let Err(e) = item.on_update(update, &context).await {
                        warn!(entity_type, %id, error = %e, "Update failed");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        continue;
                    }
                    debug!(entity_type, %id, "Updated");
                    let _ = respond_to.send(Ok(item.clone()));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    let Some(item) = self.store.get(&id) else {
                        debug!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    if let Err(e) = item.on_delete(&context).await {
                        warn!(entity_type, %id, error = %e, "on_delete failed");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        continue;
                    }
                    self.store.remove(&id);
                    info!(entity_type, %id, size = self.store.len(), "Deleted");
                    let _ = respond_to.send(Ok(()));
                }
                ResourceRequest::Action {
                    id,
                    action,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let Some(item) = self.store.get_mut(&id) else {
                        debug!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let result = item
                        .handle_action(action, &context)
                        .await
                        .map_err(|e| FrameworkError::EntityError(Box::new(e)));
                    match &result {
                        Ok(_) => debug!(entity_type, %id, "Action ok"),
                        Err(e) => debug!(entity_type, %id, error = %e, "Action rejected"),
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }

    async fn store_new(
        &mut self,
        entity_type: &str,
        id: T::Id,
        params: T::Create,
        context: &T::Context,
    ) -> Result<T::Id, FrameworkError> {
        let mut item = match T::from_create_params(id.clone(), params) {
            Ok(item) => item,
            Err(e) => {
                warn!(entity_type, error = %e, "Create failed");
                return Err(FrameworkError::EntityError(Box::new(e)));
            }
        };
        if let Err(e) = item.on_create(context).await {
            warn!(entity_type, error = %e, "on_create failed");
            return Err(FrameworkError::EntityError(Box::new(e)));
        }
        self.store.insert(id.clone(), item);
        debug!(entity_type, %id, size = self.store.len(), "Created");
        Ok(id)
    }
}
