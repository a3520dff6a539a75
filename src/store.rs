//! The Tick Store: last-writer-wins cache of the latest known tick per
//! instrument, shared read-mostly between the rotation/scheduler machinery
//! and the egress adapter.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::egress::Snapshot;
use crate::types::tick::{Tick, TickEntry};

/// Concurrent, last-writer-wins store of the most recent [`TickEntry`] per
/// instrument. Entries are never evicted — an instrument dropped from
/// rotation simply stops receiving updates and its last value goes stale.
///
/// Every [`update`](Self::update) publishes the full resulting snapshot on
/// a `watch` channel. Downstream subscribers always see the latest
/// snapshot, never every intermediate one — slow or absent subscribers
/// simply miss intermediate publishes rather than backing up a queue.
#[derive(Debug)]
pub struct TickStore {
    entries: DashMap<u32, TickEntry>,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl Default for TickStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TickStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        let (snapshot_tx, _rx) = watch::channel(Arc::new(HashMap::new()));
        Self {
            entries: DashMap::new(),
            snapshot_tx,
        }
    }

    /// Subscribe to snapshot-updated notifications, e.g. for the egress
    /// adapter's realtime channel.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Apply a batch of raw ticks, deriving and overwriting each
    /// instrument's stored entry, then publish the updated snapshot.
    /// Snapshotting happens after the dashmap writes are released, never
    /// while holding a shard lock.
    pub fn update(&self, ticks: &[Tick]) {
        for tick in ticks {
            let entry = TickEntry::derive(tick);
            self.entries.insert(entry.instrument_token, entry);
        }
        let _ = self.snapshot_tx.send(self.snapshot());
    }

    /// Look up the latest entry for a single instrument.
    pub fn get(&self, instrument_id: u32) -> Option<TickEntry> {
        self.entries.get(&instrument_id).map(|e| *e)
    }

    /// Number of instruments currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A point-in-time copy of every stored entry, keyed by instrument id.
    /// Used by the egress adapter to publish a snapshot.
    pub fn snapshot(&self) -> Arc<HashMap<u32, TickEntry>> {
        Arc::new(
            self.entries
                .iter()
                .map(|r| (*r.key(), *r.value()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_overwrites_prior_entry_for_same_instrument() {
        let store = TickStore::new();
        store.update(&[Tick {
            instrument_id: 1,
            last_price: 10.0,
            close_price: Some(9.0),
            change: None,
        }]);
        store.update(&[Tick {
            instrument_id: 1,
            last_price: 11.0,
            close_price: Some(9.0),
            change: None,
        }]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(1).unwrap().last_price, 11.0);
    }

    #[test]
    fn snapshot_reflects_all_instruments() {
        let store = TickStore::new();
        store.update(&[
            Tick {
                instrument_id: 1,
                last_price: 10.0,
                close_price: None,
                change: None,
            },
            Tick {
                instrument_id: 2,
                last_price: 20.0,
                close_price: None,
                change: None,
            },
        ]);
        let snap = store.snapshot();
        assert_eq!(snap.len(), 2);
        assert!(snap.contains_key(&1) && snap.contains_key(&2));
    }
}
