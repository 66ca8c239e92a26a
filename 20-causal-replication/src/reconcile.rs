//! Conflict detection and resolution for replicated updates.
//!
//! An incoming item is classified against the local copy by comparing
//! vector clocks:
//!
//! | incoming vs. local | action                                          |
//! |--------------------|-------------------------------------------------|
//! | no local copy      | store incoming                                  |
//! | after              | store incoming                                  |
//! | before             | drop incoming                                   |
//! | equal              | nothing to do                                   |
//! | concurrent         | last writer wins on timestamp, clocks merged    |
//!
//! For concurrent updates the surviving item always carries the merge of
//! both clocks, so a later replay of the losing branch is recognised as
//! already seen.
//!
//! Timestamp ties keep the local copy. Two nodes that tie on timestamp with
//! different content therefore keep diverging content under identical
//! clocks; wall clocks are not synchronised across machines and nothing here
//! breaks that tie.

use std::fmt;

use crate::{clock::CausalOrder, item::Item, store::Items};

/// What reconciling one incoming item did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Inserted,
    Advanced,
    Stale,
    Converged,
    ConflictIncomingWon,
    ConflictLocalWon,
}

impl fmt::Display for Reconciliation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Reconciliation::Inserted => "new item accepted",
            Reconciliation::Advanced => "update accepted (later clock)",
            Reconciliation::Stale => "update ignored (stale clock)",
            Reconciliation::Converged => "update ignored (already converged)",
            Reconciliation::ConflictIncomingWon => "conflict resolved: incoming wins (LWW), clocks merged",
            Reconciliation::ConflictLocalWon => "conflict resolved: local wins (LWW), clocks merged",
        };
        f.write_str(text)
    }
}

/// Applies `incoming` to `items` and reports the decision taken.
///
/// Must run with the store lock held.
pub fn reconcile(items: &mut Items, mut incoming: Item) -> Reconciliation {
    let Some(current) = items.get_mut(&incoming.id) else {
        items.insert(incoming.id.clone(), incoming);
        return Reconciliation::Inserted;
    };

    match incoming.clock.compare(&current.clock) {
        CausalOrder::After => {
            *current = incoming;
            Reconciliation::Advanced
        }
        CausalOrder::Before => Reconciliation::Stale,
        CausalOrder::Equal => Reconciliation::Converged,
        CausalOrder::Concurrent if incoming.timestamp > current.timestamp => {
            incoming.clock = current.clock.merged(&incoming.clock);
            *current = incoming;
            Reconciliation::ConflictIncomingWon
        }
        CausalOrder::Concurrent => {
            current.clock.merge(&incoming.clock);
            Reconciliation::ConflictLocalWon
        }
    }
}
