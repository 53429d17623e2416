//! # Mocks for client wrappers
//!
//! Two styles are supported:
//!
//! - [`MockClient`]: queue scripted responses up front, hand out a [`ResourceClient`], and call
//!   [`MockClient::verify`] at the end.
//! - [`create_mock_client`] plus the `expect_*` helpers: receive the raw request on the test's
//!   side, assert on its payload, and answer through the responder.
//!
//! Use the real [`ResourceActor`](crate::ResourceActor) when the entity's own hooks are under
//! test; use mocks when only the logic wrapped around a client is.
//!
//! ```rust
//! use actor_framework::mock::MockClient;
//! use actor_framework::ActorEntity;
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug, PartialEq)] struct Beacon { id: u32, lit: bool }
//! #[derive(Debug)] struct BeaconCreate;
//! #[derive(Debug)] enum BeaconAction { Light }
//! #[derive(Debug, thiserror::Error)] #[error("beacon error")] struct BeaconError;
//!
//! #[async_trait]
//! impl ActorEntity for Beacon {
//!     type Id = u32; type Create = BeaconCreate; type Update = ();
//!     type Action = BeaconAction; type ActionResult = bool; type Context = (); type Error = BeaconError;
//!     fn from_create_params(id: u32, _: BeaconCreate) -> Result<Self, BeaconError> { Ok(Self { id, lit: false }) }
//!     async fn on_update(&mut self, _: (), _: &()) -> Result<(), BeaconError> { Ok(()) }
//!     async fn handle_action(&mut self, _: BeaconAction, _: &()) -> Result<bool, BeaconError> { Ok(true) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Beacon>::new();
//!     mock.expect_action(4).return_ok(true);
//!
//!     let client = mock.client();
//!     assert!(client.perform_action(4, BeaconAction::Light).await.unwrap());
//!     mock.verify();
//! }
//! ```

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

enum Scripted<T: ActorEntity> {
    Get(Result<Option<T>, FrameworkError>),
    Create(Result<T::Id, FrameworkError>),
    Insert(Result<T::Id, FrameworkError>),
    List(Result<Vec<T>, FrameworkError>),
    Delete(Result<(), FrameworkError>),
    Action(Result<T::ActionResult, FrameworkError>),
}

struct Expectation<T: ActorEntity> {
    id: Option<T::Id>,
    scripted: Scripted<T>,
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A scripted stand-in for a [`ResourceActor`](crate::ResourceActor).
///
/// Requests are matched against expectations in FIFO order. A request of the wrong kind or for
/// the wrong id panics the mock task, which surfaces in the test as
/// [`FrameworkError::ActorDropped`] on the caller side and as a failed [`verify`](Self::verify).
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Queue<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a mock with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let next = queue.lock().unwrap().pop_front();
                let Some(Expectation { id: want, scripted }) = next else {
                    panic!("Unexpected request: no expectation queued");
                };
                let id_ok = |id: &T::Id| want.as_ref().map_or(true, |w| w == id);

                match (request, scripted) {
                    (ResourceRequest::Get { id, respond_to }, Scripted::Get(response))
                        if id_ok(&id) =>
                    {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Create { respond_to, .. }, Scripted::Create(response)) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Insert { id, respond_to, .. }, Scripted::Insert(response))
                        if id_ok(&id) =>
                    {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::List { respond_to }, Scripted::List(response)) => {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Delete { id, respond_to }, Scripted::Delete(response))
                        if id_ok(&id) =>
                    {
                        let _ = respond_to.send(response);
                    }
                    (ResourceRequest::Action { id, respond_to, .. }, Scripted::Action(response))
                        if id_ok(&id) =>
                    {
                        let _ = respond_to.send(response);
                    }
                    _ => panic!("Unexpected request or expectation mismatch"),
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        self.builder(Some(id), Scripted::Get)
    }

    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T::Id> {
        self.builder(None, Scripted::Create)
    }

    pub fn expect_insert(&mut self, id: T::Id) -> ExpectationBuilder<T, T::Id> {
        self.builder(Some(id), Scripted::Insert)
    }

    pub fn expect_list(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(None, Scripted::List)
    }

    pub fn expect_delete(&mut self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(Some(id), Scripted::Delete)
    }

    pub fn expect_action(&mut self, id: T::Id) -> ExpectationBuilder<T, T::ActionResult> {
        self.builder(Some(id), Scripted::Action)
    }

    /// Panics if any expectation is still queued.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().unwrap().len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }

    fn builder<R>(
        &mut self,
        id: Option<T::Id>,
        wrap: fn(Result<R, FrameworkError>) -> Scripted<T>,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            id,
            wrap,
            expectations: self.expectations.clone(),
        }
    }
}

/// Completes an expectation with its scripted response.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    id: Option<T::Id>,
    wrap: fn(Result<R, FrameworkError>) -> Scripted<T>,
    expectations: Queue<T>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<R, FrameworkError>) {
        let expectation = Expectation {
            id: self.id,
            scripted: (self.wrap)(response),
        };
        self.expectations.lock().unwrap().push_back(expectation);
    }
}

/// Creates a client whose requests arrive on the returned receiver.
pub fn create_mock_client<T: ActorEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Waits for the next request and returns it if it is a `Get`.
pub async fn expect_get<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Waits for the next request and returns it if it is an `Action`.
pub async fn expect_action<T: ActorEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    T::Id,
    T::Action,
    oneshot::Sender<Result<T::ActionResult, FrameworkError>>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}
