use std::{future::Future, io, net::SocketAddr, sync::Arc};

use anyhow::Result;
use tokio::{
    io::BufReader,
    net::{TcpListener, TcpStream},
    select,
};
use tracing::{debug, info, warn};

use crate::{
    error::ReplicaError,
    message::{Request, Response, read_message, write_message},
    replica::Replica,
};

/// Accepts connections for one replica and runs every request as its own task.
pub struct NodeServer {
    listener: TcpListener,
    replica: Arc<Replica>,
}

impl NodeServer {
    pub fn new(listener: TcpListener, replica: Replica) -> Self {
        Self {
            listener,
            replica: Arc::new(replica),
        }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Shared handle to the replica, e.g. for inspecting its store in tests.
    pub fn replica(&self) -> Arc<Replica> {
        Arc::clone(&self.replica)
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        let NodeServer { listener, replica } = self;
        tokio::pin!(shutdown);

        loop {
            select! {
                _ = &mut shutdown => {
                    info!(node = %replica.node_id(), "node shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    handle_accept_result(accept_result, &replica);
                }
            }
        }

        Ok(())
    }

    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

fn handle_accept_result(
    result: io::Result<(TcpStream, SocketAddr)>,
    replica: &Arc<Replica>,
) {
    match result {
        Ok((stream, peer)) => spawn_connection_handler(stream, peer, replica),
        Err(err) => warn!(error = ?err, "failed to accept connection"),
    }
}

fn spawn_connection_handler(stream: TcpStream, peer: SocketAddr, replica: &Arc<Replica>) {
    let replica = Arc::clone(replica);
    tokio::spawn(async move {
        if let Err(err) = handle_connection(stream, replica).await {
            warn!(peer = %peer, error = ?err, "connection closed with error");
        }
    });
}

async fn handle_connection(stream: TcpStream, replica: Arc<Replica>) -> Result<()> {
    let peer = stream.peer_addr().ok();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    loop {
        let response = match read_message::<_, Request>(&mut reader).await {
            Ok(Some(request)) => dispatch(&replica, request).await,
            Ok(None) => break,
            // The offending line is already consumed; the connection stays usable.
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                debug!(?peer, error = %err, "malformed request");
                Response::Error {
                    message: format!("malformed request: {err}"),
                }
            }
            Err(err) => return Err(err.into()),
        };
        write_message(&mut writer, &response).await?;
    }

    debug!(?peer, "connection finished");
    Ok(())
}

async fn dispatch(replica: &Replica, request: Request) -> Response {
    match request {
        Request::Write {
            item_id,
            content,
            client_id,
        } => {
            if item_id.trim().is_empty() {
                return Response::Error {
                    message: "item id cannot be empty".to_string(),
                };
            }
            match replica.write(&item_id, &content, &client_id).await {
                Ok(reply) => Response::Written(reply),
                Err(err) => Response::Error {
                    message: err.to_string(),
                },
            }
        }
        Request::Read {
            item_id,
            preferred_node,
            min_clock,
        } => {
            debug!(node = %replica.node_id(), ?preferred_node, "read requested");
            match replica.read(&item_id, min_clock.as_ref()).await {
                Ok(reply) => Response::Read(reply),
                Err(ReplicaError::NotFound { item_id }) => Response::NotFound { item_id },
                Err(err) => Response::Error {
                    message: err.to_string(),
                },
            }
        }
        Request::Replicate {
            item,
            sender_node_id,
        } => {
            replica.replicate(item, &sender_node_id).await;
            Response::Ack
        }
    }
}
