//! One-shot respawn timers, one task per depleted node.
//!
//! A timer that fires for a node that no longer exists is discarded; region teardown cancels
//! the region's timers in bulk so that should be rare.

use crate::clients::NodeClient;
use crate::events::{EconomyEvent, EventBus};
use crate::model::{ItemKind, NodeId, RegionId};
use crate::node_actor::HarvestError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

struct Timer {
    ticket: u64,
    region: RegionId,
    handle: JoinHandle<()>,
}

type TimerMap = Arc<Mutex<HashMap<NodeId, Timer>>>;

pub struct RespawnScheduler {
    nodes: NodeClient,
    events: EventBus,
    timers: TimerMap,
    next_ticket: AtomicU64,
}

fn lock(timers: &TimerMap) -> MutexGuard<'_, HashMap<NodeId, Timer>> {
    timers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RespawnScheduler {
    pub fn new(nodes: NodeClient, events: EventBus) -> Self {
        Self {
            nodes,
            events,
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Starts the timer for a node that was just depleted.
    pub fn schedule(&self, node: NodeId, kind: ItemKind, region: RegionId, delay: Duration) {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let nodes = self.nodes.clone();
        let events = self.events.clone();
        let timers = self.timers.clone();

        let mut map = lock(&self.timers);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut map = lock(&timers);
                if map.get(&node).map(|t| t.ticket) == Some(ticket) {
                    map.remove(&node);
                }
            }
            match nodes.respawn(node).await {
                Ok(true) => {
                    debug!(%node, "Node respawned");
                    events.publish(EconomyEvent::NodeRespawned { node, kind, region });
                }
                Ok(false) => debug!(%node, "Node was already available"),
                Err(HarvestError::NodeNotFound(_)) => debug!(%node, "Dangling respawn timer discarded"),
                Err(e) => warn!(%node, error = %e, "Respawn failed"),
            }
        });
        if let Some(previous) = map.insert(
            node,
            Timer {
                ticket,
                region,
                handle,
            },
        ) {
            warn!(%node, "Replacing an existing respawn timer");
            previous.handle.abort();
        }
        debug!(%node, ?delay, pending = map.len(), "Respawn scheduled");
    }

    pub fn cancel(&self, node: NodeId) -> bool {
        let timer = lock(&self.timers).remove(&node);
        match timer {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every pending timer of a region. Returns how many were cancelled.
    pub fn cancel_region(&self, region: RegionId) -> usize {
        let mut map = lock(&self.timers);
        let nodes: Vec<NodeId> = map
            .iter()
            .filter(|(_, t)| t.region == region)
            .map(|(id, _)| *id)
            .collect();
        for node in &nodes {
            if let Some(timer) = map.remove(node) {
                timer.handle.abort();
            }
        }
        if !nodes.is_empty() {
            info!(%region, cancelled = nodes.len(), "Respawn timers cancelled");
        }
        nodes.len()
    }

    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = lock(&self.timers).drain().collect();
        for (_, timer) in &drained {
            timer.handle.abort();
        }
        drained.len()
    }

    pub fn pending(&self) -> usize {
        lock(&self.timers).len()
    }

    pub fn is_pending(&self, node: NodeId) -> bool {
        lock(&self.timers).contains_key(&node)
    }
}
