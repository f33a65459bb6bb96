//! Per-character locks serializing votes
//!
//! A vote holds the locks of both participants from the rating read until the
//! vote record is written, so two votes sharing a character cannot compute
//! from the same stale rating. Locks are taken in id order.

use crate::types::CharacterId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as TableMutex, MutexGuard};
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = HashMap<CharacterId, Arc<Mutex<()>>>;

/// Lock table keyed by character id. An entry lives only while some vote
/// holds or waits for it.
#[derive(Debug, Default)]
pub struct CharacterLocks {
    table: Arc<TableMutex<LockTable>>,
}

/// Guard holding the locks of both participants of a vote
#[derive(Debug)]
pub struct PairGuard {
    table: Arc<TableMutex<LockTable>>,
    ids: Vec<CharacterId>,
    guards: Vec<OwnedMutexGuard<()>>,
}

fn lock_table(table: &TableMutex<LockTable>) -> MutexGuard<'_, LockTable> {
    // The table is never left half-updated, so a poisoned lock is still usable
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl CharacterLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: CharacterId) -> Arc<Mutex<()>> {
        lock_table(&self.table).entry(id).or_default().clone()
    }

    /// Acquire the locks of both characters, lowest id first
    pub async fn acquire_pair(&self, a: CharacterId, b: CharacterId) -> PairGuard {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let ids = if low == high { vec![low] } else { vec![low, high] };

        let mut guard = PairGuard {
            table: self.table.clone(),
            ids: Vec::with_capacity(ids.len()),
            guards: Vec::with_capacity(ids.len()),
        };
        for id in ids {
            let lock = self.lock_for(id);
            guard.ids.push(id);
            guard.guards.push(lock.lock_owned().await);
        }
        guard
    }

    /// Number of characters currently locked or awaited
    pub fn tracked(&self) -> usize {
        lock_table(&self.table).len()
    }
}

impl Drop for PairGuard {
    fn drop(&mut self) {
        self.guards.clear();

        let mut table = lock_table(&self.table);
        for id in &self.ids {
            if table.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
                table.remove(id);
            }
        }
    }
}
