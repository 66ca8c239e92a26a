//! Shared harness for integration tests: a cluster of real nodes on
//! localhost, wired to each other over TCP.

#![allow(dead_code)]

use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Result, bail};
use causal_replication::{
    clock::VectorClock,
    replica::{Replica, ReplicaConfig},
    rpc::NodeClient,
    server::NodeServer,
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle, time::sleep};

pub struct TestCluster {
    pub addrs: Vec<String>,
    replicas: Vec<Arc<Replica>>,
    shutdowns: Vec<oneshot::Sender<()>>,
    servers: Vec<JoinHandle<()>>,
}

impl TestCluster {
    /// Starts one node per id, each peered with all the others.
    pub async fn spawn(ids: &[&str], replication_delay: Duration) -> Result<Self> {
        let mut listeners = Vec::new();
        let mut addrs = Vec::new();
        for _ in ids {
            let listener = TcpListener::bind("127.0.0.1:0").await?;
            addrs.push(listener.local_addr()?.to_string());
            listeners.push(listener);
        }

        let mut cluster = Self {
            addrs: addrs.clone(),
            replicas: Vec::new(),
            shutdowns: Vec::new(),
            servers: Vec::new(),
        };

        for (index, (id, listener)) in ids.iter().zip(listeners).enumerate() {
            let peers = addrs
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .map(|(_, addr)| addr.clone())
                .collect();
            let replica = Replica::new(ReplicaConfig {
                node_id: id.to_string(),
                peers,
                replication_delay,
            });
            let server = NodeServer::new(listener, replica);
            cluster.replicas.push(server.replica());

            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            cluster.shutdowns.push(shutdown_tx);
            cluster.servers.push(tokio::spawn(async move {
                let shutdown = async move {
                    let _ = shutdown_rx.await;
                };
                let _ = server.run_until(shutdown).await;
            }));
        }

        Ok(cluster)
    }

    pub fn replica(&self, index: usize) -> &Arc<Replica> {
        &self.replicas[index]
    }

    pub fn client(&self, index: usize) -> NodeClient {
        NodeClient::new(self.addrs[index].clone()).with_timeout(Duration::from_secs(1))
    }

    pub async fn shutdown(self) {
        for shutdown in self.shutdowns {
            let _ = shutdown.send(());
        }
        for server in self.servers {
            let _ = server.await;
        }
    }
}

pub fn clock(entries: &[(&str, u64)]) -> VectorClock {
    entries.iter().map(|&(node, counter)| (node, counter)).collect()
}

/// Polls `check` until it returns true or `timeout` elapses.
pub async fn wait_until<F, Fut>(description: &str, timeout: Duration, mut check: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    loop {
        if check().await {
            return Ok(());
        }
        if start.elapsed() > timeout {
            bail!("timeout waiting for {description}");
        }
        sleep(Duration::from_millis(20)).await;
    }
}
