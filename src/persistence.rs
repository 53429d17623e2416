//! Player record persistence.
//!
//! The economy never waits on storage. Ledger actors hand finished records to a
//! [`PersistenceHandle`], which queues them for a single writer task; the writer encodes them
//! as JSON and puts them into whatever [`KeyValueStore`] the host provides. Retries are the
//! store's business.

use crate::model::{PlayerId, PlayerRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Failed to encode player record: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Generic persistent key-value interface supplied by the host.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn put(&self, key: &str, value: String) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store for tests and the demo binary.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

pub fn player_key(id: PlayerId) -> String {
    format!("player:{}", id.0)
}

/// Typed access to player records in a [`KeyValueStore`].
#[derive(Clone)]
pub struct PlayerRepository {
    store: Arc<dyn KeyValueStore>,
}

impl PlayerRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, id: PlayerId) -> Result<Option<PlayerRecord>, StoreError> {
        match self.store.get(&player_key(id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn save(&self, record: &PlayerRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        self.store.put(&player_key(record.player_id), json).await
    }
}

#[derive(Debug)]
pub enum PersistenceCommand {
    Save(PlayerRecord),
    /// Answered once every earlier command has been handled.
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget sender side of the persistence writer.
#[derive(Clone, Debug)]
pub struct PersistenceHandle {
    sender: mpsc::UnboundedSender<PersistenceCommand>,
}

impl PersistenceHandle {
    pub fn new(sender: mpsc::UnboundedSender<PersistenceCommand>) -> Self {
        Self { sender }
    }

    pub fn save(&self, record: PlayerRecord) {
        let player = record.player_id;
        if self.sender.send(PersistenceCommand::Save(record)).is_err() {
            warn!(%player, "Persistence writer stopped; record dropped");
        }
    }

    /// Waits until everything queued before this call has reached the store.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(PersistenceCommand::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}

/// Spawns the writer task. It runs until every handle has been dropped and the queue is drained.
pub fn spawn_writer(repository: PlayerRepository) -> (PersistenceHandle, JoinHandle<()>) {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        info!("Persistence writer started");
        while let Some(command) = receiver.recv().await {
            match command {
                PersistenceCommand::Save(record) => match repository.save(&record).await {
                    Ok(()) => debug!(player = %record.player_id, "Player record saved"),
                    Err(e) => warn!(player = %record.player_id, error = %e, "Player record save failed"),
                },
                PersistenceCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        info!("Persistence writer stopped");
    });
    (PersistenceHandle::new(sender), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolRecord;
    use crate::model::QualityTier;

    #[tokio::test]
    async fn test_writer_saves_json_under_player_key() {
        let store = Arc::new(MemoryStore::new());
        let repository = PlayerRepository::new(store.clone());
        let (persistence, writer) = spawn_writer(repository.clone());

        let mut record = PlayerRecord::empty(PlayerId(7));
        record.balances.insert("kelp".into(), 9);
        record.tools.push(ToolRecord {
            kind: "pry_bar".into(),
            durability: 40,
            max_durability: 50,
            quality: QualityTier::Good,
        });
        persistence.save(record.clone());
        persistence.flush().await;

        let raw = store.get("player:7").await.unwrap().unwrap();
        assert!(raw.contains("\"kelp\":9"));
        assert_eq!(repository.load(PlayerId(7)).await.unwrap(), Some(record));
        assert_eq!(repository.load(PlayerId(8)).await.unwrap(), None);

        drop(persistence);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_record_is_encoding_error() {
        let store = Arc::new(MemoryStore::new());
        store.put("player:3", "{not json".into()).await.unwrap();
        let err = PlayerRepository::new(store).load(PlayerId(3)).await.unwrap_err();
        assert!(matches!(err, StoreError::Encoding(_)));
    }
}
