use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use causal_replication::{
    cli::{Cli, Command, NodeArgs},
    replica::Replica,
    server::NodeServer,
    shell,
};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Node(args) => run_node(args).await?,
        Command::Client(args) => shell::run(args).await?,
    }

    Ok(())
}

async fn run_node(args: NodeArgs) -> Result<()> {
    let config = args.replica_config()?;
    let bind = SocketAddr::new(args.host, args.port);
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to listen on {bind}"))?;

    let server = NodeServer::new(listener, Replica::new(config.clone()));
    let addr = server.local_addr()?;
    info!(peers = ?config.peers, "node {} listening on {}", config.node_id, addr);

    if let Err(err) = server.run_until_ctrl_c().await {
        warn!("node exited with error: {err:?}");
        return Err(err);
    }
    Ok(())
}
