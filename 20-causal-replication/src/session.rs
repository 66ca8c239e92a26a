//! Client-side session guarantees.
//!
//! Read-your-writes comes from routing reads to the node that took the
//! session's last write. Monotonic reads are requested by sending the
//! highest clock seen so far as the read baseline; nodes report, but do not
//! refuse, reads that fall behind it.

use std::time::Duration;

use anyhow::{Result, ensure};
use rand::seq::SliceRandom;

use crate::{
    clock::{self, VectorClock},
    message::ReadReply,
    rpc::NodeClient,
};

/// Outcome of a session write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub item_id: String,
    pub node_id: String,
    pub addr: String,
}

pub struct Session {
    nodes: Vec<String>,
    client_id: String,
    timeout: Duration,
    last_written_node: Option<String>,
    max_seen_clock: Option<VectorClock>,
}

impl Session {
    pub fn new(nodes: Vec<String>, client_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        ensure!(!nodes.is_empty(), "session requires at least one node address");
        Ok(Self {
            nodes,
            client_id: client_id.into(),
            timeout,
            last_written_node: None,
            max_seen_clock: None,
        })
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Address of the node that accepted the last successful write.
    pub fn last_written_node(&self) -> Option<&str> {
        self.last_written_node.as_deref()
    }

    pub fn max_seen_clock(&self) -> Option<&VectorClock> {
        self.max_seen_clock.as_ref()
    }

    /// Writes to a randomly chosen node and pins later reads to it.
    pub async fn write(&mut self, item_id: &str, content: &str) -> Result<WriteReceipt> {
        let addr = self.pick_any().to_string();
        let reply = self
            .client(&addr)
            .write(item_id, content, &self.client_id)
            .await?;

        self.last_written_node = Some(addr.clone());
        Ok(WriteReceipt {
            item_id: reply.item_id,
            node_id: reply.node_id,
            addr,
        })
    }

    /// Reads from the pinned node (or any node before the first write) and
    /// folds the returned clock into the session baseline.
    pub async fn read(&mut self, item_id: &str) -> Result<ReadReply> {
        let addr = match &self.last_written_node {
            Some(addr) => addr.clone(),
            None => self.pick_any().to_string(),
        };
        let reply = self
            .client(&addr)
            .read(
                item_id,
                self.last_written_node.as_deref(),
                self.max_seen_clock.as_ref(),
            )
            .await?;

        self.max_seen_clock = Some(clock::merge(
            self.max_seen_clock.as_ref(),
            Some(&reply.item.clock),
        ));
        Ok(reply)
    }

    fn pick_any(&self) -> &str {
        // `new` guarantees at least one node.
        self.nodes
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default()
    }

    fn client(&self, addr: &str) -> NodeClient {
        NodeClient::new(addr).with_timeout(self.timeout)
    }
}
