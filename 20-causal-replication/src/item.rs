use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::clock::VectorClock;

/// A versioned value held by a replica.
///
/// `timestamp` is wall-clock nanoseconds since the Unix epoch and is only
/// consulted to break ties between concurrent versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub content: String,
    pub clock: VectorClock,
    pub timestamp: i64,
}

impl Item {
    pub fn new(id: impl Into<String>, content: impl Into<String>, clock: VectorClock) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            clock,
            timestamp: now_nanos(),
        }
    }
}

pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
