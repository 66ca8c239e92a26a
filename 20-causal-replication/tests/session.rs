//! Read-your-writes and monotonic-read behaviour as seen by a client.

mod common;

use std::time::Duration;

use anyhow::Result;
use causal_replication::{clock::VectorClock, error::ReplicaError, session::Session};
use common::{TestCluster, clock, wait_until};

#[tokio::test]
async fn session_reads_its_own_write_before_replication() -> Result<()> {
    // Replication is slow enough that only the written node has the item.
    let cluster = TestCluster::spawn(&["A", "B"], Duration::from_secs(10)).await?;
    let mut session = Session::new(cluster.addrs.clone(), "client-1", Duration::from_secs(1))?;

    let receipt = session.write("review-1", "x").await?;
    assert_eq!(session.last_written_node(), Some(receipt.addr.as_str()));

    let reply = session.read("review-1").await?;
    assert_eq!(reply.item.content, "x");
    assert_eq!(reply.node_id, receipt.node_id);
    assert!(!reply.stale);
    assert_eq!(
        session.max_seen_clock(),
        Some(&clock(&[(receipt.node_id.as_str(), 1)]))
    );

    cluster.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn read_with_pre_write_baseline_is_not_stale() -> Result<()> {
    let cluster = TestCluster::spawn(&["A"], Duration::ZERO).await?;
    let node = cluster.client(0);

    let before = VectorClock::new();
    node.write("review-1", "x", "client-1").await?;
    let reply = node.read("review-1", Some(node.addr()), Some(&before)).await?;

    assert_eq!(reply.item.content, "x");
    assert!(!reply.stale);

    cluster.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn lagging_node_reports_not_found_for_unseen_item() -> Result<()> {
    let cluster = TestCluster::spawn(&["A", "B"], Duration::from_secs(10)).await?;

    cluster.client(0).write("review-1", "x", "client-1").await?;
    let err = cluster
        .client(1)
        .read("review-1", Some(&cluster.addrs[0]), None)
        .await
        .expect_err("B has not seen the item yet");

    assert!(matches!(
        err.downcast_ref::<ReplicaError>(),
        Some(ReplicaError::NotFound { item_id }) if item_id == "review-1"
    ));

    cluster.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn lagging_node_serves_stale_value_instead_of_failing() -> Result<()> {
    let cluster = TestCluster::spawn(&["A", "B"], Duration::from_millis(400)).await?;
    let a = cluster.client(0);
    let b = cluster.client(1);

    a.write("review-1", "v1", "client-1").await?;
    let replica_b = cluster.replica(1).clone();
    wait_until("B to receive v1", Duration::from_secs(5), move || {
        let replica = replica_b.clone();
        async move { replica.snapshot().await.contains_key("review-1") }
    })
    .await?;

    a.write("review-1", "v2", "client-1").await?;
    let seen = a.read("review-1", None, None).await?.item.clock;
    assert_eq!(seen, clock(&[("A", 2)]));

    // B still holds v1 and the client has already seen v2.
    let stale = b.read("review-1", None, Some(&seen)).await?;
    assert_eq!(stale.item.content, "v1");
    assert!(stale.stale);

    let b_for_wait = b.clone();
    let seen_for_wait = seen.clone();
    wait_until("B to catch up to v2", Duration::from_secs(5), move || {
        let b = b_for_wait.clone();
        let seen = seen_for_wait.clone();
        async move {
            b.read("review-1", None, Some(&seen))
                .await
                .is_ok_and(|reply| !reply.stale && reply.item.content == "v2")
        }
    })
    .await?;

    cluster.shutdown().await;
    Ok(())
}
