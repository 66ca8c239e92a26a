//! Fire-and-forget propagation of local writes to peers.

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use tokio::{task::JoinHandle, time::sleep};
use tracing::{info, warn};

use crate::{error::ReplicaError, item::Item, rpc::NodeClient};

/// Pushes freshly written items to every configured peer.
///
/// Each write gets its own detached task. Peers are contacted concurrently
/// and independently: a failed send is logged and dropped, never retried,
/// and never reported back to the writer. Nothing orders deliveries across
/// peers or across writes in flight, so receivers rely on
/// [`crate::reconcile`] for correctness.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    sender_id: String,
    peers: Arc<[String]>,
    delay: Duration,
}

impl Broadcaster {
    /// `delay` is slept before any send; it simulates propagation latency so
    /// stale reads and concurrent writes are easy to observe.
    pub fn new(sender_id: impl Into<String>, peers: Vec<String>, delay: Duration) -> Self {
        Self {
            sender_id: sender_id.into(),
            peers: peers.into(),
            delay,
        }
    }

    /// Starts replicating `item` in the background and returns immediately.
    pub fn spawn(&self, item: Item) -> JoinHandle<usize> {
        let broadcaster = self.clone();
        tokio::spawn(async move { broadcaster.broadcast(item).await })
    }

    /// Sends `item` to all peers and returns how many acknowledged it.
    pub async fn broadcast(&self, item: Item) -> usize {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let sends = self.peers.iter().map(|peer| self.send_to(peer, item.clone()));
        let mut delivered = 0;
        for result in join_all(sends).await {
            match result {
                Ok(()) => delivered += 1,
                Err(error) => warn!(node = %self.sender_id, %error, "replication skipped"),
            }
        }

        info!(
            node = %self.sender_id,
            item = %item.id,
            clock = %item.clock,
            delivered,
            peers = self.peers.len(),
            "replication round finished"
        );
        delivered
    }

    async fn send_to(&self, peer: &str, item: Item) -> Result<(), ReplicaError> {
        NodeClient::new(peer)
            .replicate(item, &self.sender_id)
            .await
            .map_err(|error| ReplicaError::PeerUnreachable {
                peer: peer.to_string(),
                reason: format!("{error:#}"),
            })
    }
}
