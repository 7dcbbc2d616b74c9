//! Registry partition
//!
//! One partition maps subscriber ids to (topic key, sender) entries. The
//! broker owns two of these (per-channel and per-user channel-list), each
//! behind its own lock. A handle lives in at most one partition and never
//! twice in the same one (ids are never reused).

use std::collections::HashMap;

use tokio::sync::mpsc;

use super::event::Event;
use super::handle::SubscriberId;

struct Entry {
    key: String,
    tx: mpsc::Sender<Event>,
}

/// One registry partition
///
/// All methods are plain map operations; the caller holds the partition's
/// lock only for their duration, never across a send.
pub(super) struct Registry {
    entries: HashMap<SubscriberId, Entry>,
}

impl Registry {
    pub(super) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub(super) fn insert(&mut self, id: SubscriberId, key: String, tx: mpsc::Sender<Event>) {
        self.entries.insert(id, Entry { key, tx });
    }

    /// Idempotent removal; returns whether the id was present
    ///
    /// Dropping the entry drops its sender, which closes the handle: a
    /// concurrent publish observes a closed queue instead of blocking.
    pub(super) fn remove(&mut self, id: SubscriberId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Point-in-time snapshot of the senders registered under `key`
    pub(super) fn snapshot_matching(&self, key: &str) -> Vec<(SubscriberId, mpsc::Sender<Event>)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.key == key)
            .map(|(id, entry)| (*id, entry.tx.clone()))
            .collect()
    }

    /// Point-in-time snapshot of every sender in the partition
    pub(super) fn snapshot_all(&self) -> Vec<(SubscriberId, mpsc::Sender<Event>)> {
        self.entries
            .iter()
            .map(|(id, entry)| (*id, entry.tx.clone()))
            .collect()
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop every entry, closing all handles; returns how many were removed
    pub(super) fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }
}
