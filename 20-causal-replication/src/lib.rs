//! Replicated item store with vector-clock causality and last-writer-wins
//! conflict resolution.
//!
//! Every node keeps a full copy of the data. A write is committed on the
//! node that receives it and then pushed to all peers in the background;
//! peers reconcile what they receive against their own copy. Nothing is
//! coordinated: replicas converge once every update has been delivered.
//!
//! - [`clock`] is the vector clock algebra: merge and causal dominance.
//! - [`store`] holds one node's items behind a single mutex.
//! - [`replica`] implements the write, read and replicate handlers.
//! - [`reconcile`] classifies incoming updates and resolves conflicts.
//! - [`replication`] broadcasts local writes to peers, fire-and-forget.
//! - [`server`] and [`rpc`] carry requests over newline-delimited JSON on TCP,
//!   using the types in [`message`].
//! - [`session`], [`console`] and [`shell`] make up the interactive client,
//!   which tracks read-your-writes and monotonic-read state.
//! - [`cli`] parses command-line flags and environment configuration.

pub mod cli;
pub mod clock;
pub mod console;
pub mod error;
pub mod item;
pub mod message;
pub mod reconcile;
pub mod replica;
pub mod replication;
pub mod rpc;
pub mod server;
pub mod session;
pub mod shell;
pub mod store;
