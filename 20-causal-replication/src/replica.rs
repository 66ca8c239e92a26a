//! Request handlers for one replica: local writes, local reads, and
//! reconciliation of updates pushed by peers.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    clock::{self, VectorClock},
    error::ReplicaError,
    item::Item,
    message::{ReadReply, WriteReply},
    reconcile::{Reconciliation, reconcile},
    replication::Broadcaster,
    store::{Items, LocalStore},
};

/// Identity and peer set of a node, fixed for its lifetime.
#[derive(Debug, Clone)]
pub struct ReplicaConfig {
    pub node_id: String,
    /// Addresses of every other node, e.g. `10.0.0.2:50051`.
    pub peers: Vec<String>,
    pub replication_delay: Duration,
}

pub struct Replica {
    node_id: String,
    store: LocalStore,
    broadcaster: Broadcaster,
}

impl Replica {
    pub fn new(config: ReplicaConfig) -> Self {
        let ReplicaConfig {
            node_id,
            peers,
            replication_delay,
        } = config;
        Self {
            broadcaster: Broadcaster::new(node_id.clone(), peers, replication_delay),
            node_id,
            store: LocalStore::new(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Commits a new version of `item_id` locally and schedules replication.
    ///
    /// This node's counter advances by exactly one on top of whatever clock
    /// the previous local version carried. The reply is returned as soon as
    /// the local store is updated. A counter that cannot advance rejects the
    /// write and leaves the store unchanged.
    pub async fn write(
        &self,
        item_id: &str,
        content: &str,
        client_id: &str,
    ) -> Result<WriteReply, ReplicaError> {
        let node_id = &self.node_id;
        let item = self
            .store
            .update(|items| {
                let mut clock = items
                    .get(item_id)
                    .map(|current| current.clock.clone())
                    .unwrap_or_default();
                clock
                    .increment(node_id)
                    .ok_or_else(|| ReplicaError::CounterExhausted {
                        node_id: node_id.clone(),
                        item_id: item_id.to_string(),
                    })?;

                let item = Item::new(item_id, content, clock);
                items.insert(item.id.clone(), item.clone());
                Ok::<_, ReplicaError>(item)
            })
            .await
            .inspect_err(|error| warn!(%error, "local write rejected"))?;

        info!(node = %self.node_id, client = %client_id, item = %item.id, clock = %item.clock, "local write committed");
        self.broadcaster.spawn(item);

        Ok(WriteReply {
            item_id: item_id.to_string(),
            node_id: self.node_id.clone(),
        })
    }

    /// Serves the local version of `item_id`.
    ///
    /// When the local clock does not cover `baseline`, the stale value is
    /// still returned; the violation is only logged and flagged in the reply.
    pub async fn read(
        &self,
        item_id: &str,
        baseline: Option<&VectorClock>,
    ) -> Result<ReadReply, ReplicaError> {
        let item = self
            .store
            .get(item_id)
            .await
            .ok_or_else(|| ReplicaError::NotFound {
                item_id: item_id.to_string(),
            })?;

        let stale = !clock::dominates_or_equal(Some(&item.clock), baseline);
        if stale {
            let violation = ReplicaError::StaleRead {
                node_id: self.node_id.clone(),
                local: item.clock.clone(),
                baseline: baseline.cloned().unwrap_or_default(),
            };
            warn!(%violation, "possible monotonic read violation");
        } else {
            debug!(node = %self.node_id, item = %item_id, clock = %item.clock, "read served");
        }

        Ok(ReadReply {
            item,
            node_id: self.node_id.clone(),
            stale,
        })
    }

    /// Applies an update pushed by `sender`. Replaying the same item is a no-op.
    pub async fn replicate(&self, item: Item, sender: &str) -> Reconciliation {
        info!(node = %self.node_id, from = %sender, item = %item.id, clock = %item.clock, "replication received");
        let outcome = self.store.update(|items| reconcile(items, item)).await;
        info!(node = %self.node_id, from = %sender, "{outcome}");
        outcome
    }

    pub async fn snapshot(&self) -> Items {
        self.store.snapshot().await
    }
}
