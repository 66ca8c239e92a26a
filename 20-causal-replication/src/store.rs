//! In-memory item storage for a single replica.
//!
//! Every access to the map, whether a local write, a read, or a
//! reconciliation of a remote update, goes through one mutex, so all of them
//! are serialized on a given node.

use std::collections::BTreeMap;

use tokio::sync::Mutex;

use crate::item::Item;

pub type Items = BTreeMap<String, Item>;

/// Map from item identifier to its current version, owned by one node.
///
/// Access is closure-scoped: the lock is released when the closure returns,
/// which keeps callers from holding it across an `.await` on the network.
///
/// `BTreeMap` keeps snapshots in a stable order for status output and tests.
#[derive(Default)]
pub struct LocalStore {
    items: Mutex<Items>,
}

impl LocalStore {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
        }
    }

    /// Runs `f` with exclusive access to the map.
    pub async fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Items) -> R,
    {
        let mut items = self.items.lock().await;
        f(&mut items)
    }

    pub async fn get(&self, item_id: &str) -> Option<Item> {
        self.items.lock().await.get(item_id).cloned()
    }

    /// Clones the entire map so the caller can iterate without the lock.
    pub async fn snapshot(&self) -> Items {
        self.items.lock().await.clone()
    }
}
