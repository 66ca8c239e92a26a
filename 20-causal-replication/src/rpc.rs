//! Request/response calls against a single node.
//!
//! Every call opens a fresh TCP connection, sends one request, waits for one
//! response, and closes the connection.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::TcpStream,
    time::timeout,
};
use tracing::debug;

use crate::{
    clock::VectorClock,
    error::ReplicaError,
    item::Item,
    message::{ReadReply, Request, Response, WriteReply, read_message, write_message},
};

#[derive(Debug, Clone)]
pub struct NodeClient {
    addr: String,
    timeout: Option<Duration>,
}

impl NodeClient {
    /// Client whose calls wait as long as the peer takes.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: None,
        }
    }

    /// Bounds `write` and `read` by `limit`. Replication calls ignore it.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub async fn write(&self, item_id: &str, content: &str, client_id: &str) -> Result<WriteReply> {
        let request = Request::Write {
            item_id: item_id.to_string(),
            content: content.to_string(),
            client_id: client_id.to_string(),
        };
        match self.call_bounded(&request).await? {
            Response::Written(reply) => Ok(reply),
            other => Err(unexpected(&self.addr, other)),
        }
    }

    /// Reads `item_id`; a missing item surfaces as [`ReplicaError::NotFound`].
    pub async fn read(
        &self,
        item_id: &str,
        preferred_node: Option<&str>,
        min_clock: Option<&VectorClock>,
    ) -> Result<ReadReply> {
        let request = Request::Read {
            item_id: item_id.to_string(),
            preferred_node: preferred_node.map(str::to_string),
            min_clock: min_clock.cloned(),
        };
        match self.call_bounded(&request).await? {
            Response::Read(reply) => Ok(reply),
            Response::NotFound { item_id } => Err(ReplicaError::NotFound { item_id }.into()),
            other => Err(unexpected(&self.addr, other)),
        }
    }

    pub async fn replicate(&self, item: Item, sender_node_id: &str) -> Result<()> {
        let request = Request::Replicate {
            item,
            sender_node_id: sender_node_id.to_string(),
        };
        match call(&self.addr, &request).await? {
            Response::Ack => Ok(()),
            other => Err(unexpected(&self.addr, other)),
        }
    }

    async fn call_bounded(&self, request: &Request) -> Result<Response> {
        match self.timeout {
            Some(limit) => timeout(limit, call(&self.addr, request))
                .await
                .with_context(|| format!("request to {} timed out after {limit:?}", self.addr))?,
            None => call(&self.addr, request).await,
        }
    }
}

/// Sends `request` to `addr` over a dedicated connection and waits for the answer.
pub async fn call(addr: &str, request: &Request) -> Result<Response> {
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("failed to connect to {addr}"))?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    write_message(&mut writer, request)
        .await
        .with_context(|| format!("failed to send request to {addr}"))?;
    let response = read_message::<_, Response>(&mut reader)
        .await
        .with_context(|| format!("failed to read response from {addr}"))?
        .with_context(|| format!("{addr} closed the connection before responding"))?;

    if let Err(error) = writer.shutdown().await {
        debug!(?error, %addr, "failed to shutdown connection cleanly");
    }

    Ok(response)
}

fn unexpected(addr: &str, response: Response) -> anyhow::Error {
    match response {
        Response::Error { message } => anyhow!("{addr} rejected request: {message}"),
        other => anyhow!("unexpected response from {addr}: {other:?}"),
    }
}
