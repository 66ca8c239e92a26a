use std::{net::IpAddr, time::Duration};

use anyhow::{Result, ensure};
use clap::{Args, Parser, Subcommand};

use crate::replica::ReplicaConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a data node that serves reads and writes and replicates to its peers.
    Node(NodeArgs),
    /// Start an interactive session against one or more data nodes.
    Client(ClientArgs),
}

#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    /// Identifier of this node; also its key in every vector clock.
    #[arg(long, env = "NODE_ID")]
    pub id: String,

    /// Port to listen on. Use 0 for an ephemeral port.
    #[arg(long, env = "PORT")]
    pub port: u16,

    /// Interface to bind.
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Comma-separated peer addresses, e.g. 10.0.0.2:50051,10.0.0.3:50051.
    #[arg(long, env = "PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,

    /// Pause before pushing a write to peers, in milliseconds.
    #[arg(long, env = "REPLICATION_DELAY_MS", default_value_t = 2000)]
    pub replication_delay_ms: u64,
}

impl NodeArgs {
    pub fn replica_config(&self) -> Result<ReplicaConfig> {
        let node_id = self.id.trim().to_string();
        ensure!(!node_id.is_empty(), "node id cannot be empty");
        Ok(ReplicaConfig {
            node_id,
            peers: clean_addrs(&self.peers),
            replication_delay: Duration::from_millis(self.replication_delay_ms),
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Comma-separated addresses of the data nodes to talk to.
    #[arg(long, env = "NODES", value_delimiter = ',', required = true)]
    pub nodes: Vec<String>,

    /// Identifier sent along with every write.
    #[arg(long, env = "CLIENT_ID", default_value = "client-1")]
    pub client_id: String,

    /// Per-request timeout for reads and writes, in milliseconds.
    #[arg(long, env = "CLIENT_TIMEOUT_MS", default_value_t = 1000)]
    pub timeout_ms: u64,
}

impl ClientArgs {
    pub fn node_addrs(&self) -> Vec<String> {
        clean_addrs(&self.nodes)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn clean_addrs(entries: &[String]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}
