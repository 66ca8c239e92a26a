use anyhow::Result;
use tokio::{
    io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader},
    select,
};
use tracing::warn;

use crate::{
    cli::ClientArgs,
    console::{ConsoleCommand, HELP_LINES},
    error::ReplicaError,
    session::Session,
};

pub async fn run(args: ClientArgs) -> Result<()> {
    let mut session = Session::new(args.node_addrs(), args.client_id.clone(), args.timeout())?;
    write_stdout(&format!(
        "*** session ready with {} node(s). Type HELP (or h) for commands.",
        session.nodes().len()
    ))
    .await?;

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut input = String::new();

    run_shell_loop(&mut session, &mut stdin, &mut input).await
}

async fn run_shell_loop(
    session: &mut Session,
    stdin: &mut BufReader<tokio::io::Stdin>,
    input: &mut String,
) -> Result<()> {
    loop {
        input.clear();
        select! {
            bytes_read = stdin.read_line(input) => {
                if bytes_read? == 0 {
                    break;
                }
                if !handle_line(session, input).await? {
                    break;
                }
            }
            ctrl_c = tokio::signal::ctrl_c() => {
                if let Err(error) = ctrl_c {
                    warn!(?error, "ctrl-c handler failed");
                }
                break;
            }
        }
    }
    Ok(())
}

async fn handle_line(session: &mut Session, line: &str) -> Result<bool> {
    if line.trim().is_empty() {
        return Ok(true);
    }

    match ConsoleCommand::parse(line) {
        Ok(ConsoleCommand::Write { item_id, content }) => {
            match session.write(&item_id, &content).await {
                Ok(receipt) => {
                    write_stdout(&format!(
                        "*** wrote {} at node {} via {}",
                        receipt.item_id, receipt.node_id, receipt.addr
                    ))
                    .await?
                }
                Err(err) => write_stderr(&format!("!!! write failed: {err:#}")).await?,
            }
        }
        Ok(ConsoleCommand::Read { item_id }) => match session.read(&item_id).await {
            Ok(reply) => {
                if reply.stale {
                    write_stderr(&format!(
                        "!!! stale read: node {} is behind the session clock",
                        reply.node_id
                    ))
                    .await?;
                }
                write_stdout(&format!(
                    "{} = {} (node {}, clock {})",
                    reply.item.id, reply.item.content, reply.node_id, reply.item.clock
                ))
                .await?
            }
            Err(err) => match err.downcast_ref::<ReplicaError>() {
                Some(ReplicaError::NotFound { item_id }) => {
                    write_stderr(&format!("!!! {item_id} not found")).await?
                }
                _ => write_stderr(&format!("!!! read failed: {err:#}")).await?,
            },
        },
        Ok(ConsoleCommand::Session) => {
            let last = session.last_written_node().unwrap_or("none");
            let seen = session
                .max_seen_clock()
                .map(ToString::to_string)
                .unwrap_or_else(|| "none".to_string());
            write_stdout(&format!("*** last written node: {last}, max seen clock: {seen}")).await?
        }
        Ok(ConsoleCommand::Help) => {
            for line in HELP_LINES {
                write_stdout(line).await?;
            }
        }
        Ok(ConsoleCommand::Exit) => {
            write_stdout("*** leaving session").await?;
            return Ok(false);
        }
        Err(err) => write_stderr(&format!("!!! {err}")).await?,
    }

    Ok(true)
}

async fn write_stdout(line: &str) -> io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

async fn write_stderr(line: &str) -> io::Result<()> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(line.as_bytes()).await?;
    stderr.write_all(b"\n").await?;
    stderr.flush().await
}
