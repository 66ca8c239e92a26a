use thiserror::Error;

use crate::clock::VectorClock;

/// Failures a replica can observe while serving a request.
///
/// [`ReplicaError::NotFound`] and [`ReplicaError::CounterExhausted`] reach
/// the caller. The other variants are built so they can be logged with a
/// consistent message and are then dropped.
#[derive(Debug, Error)]
pub enum ReplicaError {
    #[error("item '{item_id}' not found")]
    NotFound { item_id: String },

    #[error("node {node_id} cannot advance its counter for '{item_id}': already at its maximum")]
    CounterExhausted { node_id: String, item_id: String },

    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: String, reason: String },

    #[error("node {node_id} serving stale read: local clock {local} does not cover {baseline}")]
    StaleRead {
        node_id: String,
        local: VectorClock,
        baseline: VectorClock,
    },
}
