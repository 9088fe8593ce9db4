//! Per-key async locks.
//!
//! Callers working on the same key queue behind one mutex; different keys
//! never contend. Entries are dropped from the map once the last holder or
//! waiter is gone, so the map only grows with in-flight keys.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of per-key mutexes.
pub struct KeyedLocks<K> {
    locks: StdMutex<HashMap<K, Slot>>,
}

/// One key's mutex plus the number of holders and waiters registered on it.
#[derive(Default)]
struct Slot {
    lock: Arc<Mutex<()>>,
    users: usize,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            locks: StdMutex::new(HashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`.
    ///
    /// Cancel safe: dropping the returned future while it waits deregisters
    /// the caller, so an abandoned wait never pins the entry.
    pub async fn acquire(&self, key: K) -> KeyGuard<'_, K> {
        let lock = {
            let mut locks = self.map();
            let slot = locks.entry(key.clone()).or_default();
            slot.users += 1;
            Arc::clone(&slot.lock)
        };

        // Registered before waiting; its Drop deregisters on cancellation too.
        let mut hold = KeyGuard {
            owner: self,
            key,
            guard: None,
        };
        hold.guard = Some(lock.lock_owned().await);
        hold
    }

    /// Number of keys currently held or awaited.
    pub fn in_flight(&self) -> usize {
        self.map().len()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<K, Slot>> {
        self.locks.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration on one key; exclusive once `acquire` resolves, released on drop.
pub struct KeyGuard<'a, K: Eq + Hash + Clone> {
    owner: &'a KeyedLocks<K>,
    key: K,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for KeyGuard<'_, K> {
    fn drop(&mut self) {
        let mut locks = self.owner.map();
        self.guard.take();
        if let Some(slot) = locks.get_mut(&self.key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                locks.remove(&self.key);
            }
        }
    }
}
