//! crates/course_core/src/locks.rs
//!
//! Keyed async mutexes. Callers holding the guard for a key run one at a time;
//! different keys never contend. Entries are weak; dead ones are swept whenever
//! the map doubles past its size after the previous sweep.

use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Smallest map size that triggers a sweep of dead entries.
const MIN_PRUNE_AT: usize = 64;

pub struct KeyedLocks<K> {
    locks: DashMap<K, Weak<Mutex<()>>>,
    prune_at: AtomicUsize,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
            prune_at: AtomicUsize::new(MIN_PRUNE_AT),
        }
    }

    /// Waits until the lock for `key` is free and returns its guard.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut slot = self.locks.entry(key).or_insert_with(Weak::new);
            match slot.upgrade() {
                Some(existing) => existing,
                None => {
                    let fresh = Arc::new(Mutex::new(()));
                    *slot = Arc::downgrade(&fresh);
                    fresh
                }
            }
        };

        // Shard guard is released above; pruning here cannot deadlock.
        if self.locks.len() >= self.prune_at.load(Ordering::Relaxed) {
            self.prune();
        }

        mutex.lock_owned().await
    }

    fn prune(&self) {
        self.locks.retain(|_, weak| weak.strong_count() > 0);
        let next = (self.locks.len() * 2).max(MIN_PRUNE_AT);
        self.prune_at.store(next, Ordering::Relaxed);
    }

    /// Number of tracked keys, including dead ones not yet swept.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}
