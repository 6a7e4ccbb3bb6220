/**
 * Keyed Async Locks
 *
 * One async mutex per key (a thread id, a user id, a pair of user ids),
 * created on demand and dropped again once nobody holds or waits for it.
 * Operations on the same key run one at a time; operations on different
 * keys never wait for each other.
 */

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Cell = Arc<AsyncMutex<()>>;

pub struct KeyedLocks<K> {
    cells: Mutex<HashMap<K, Cell>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn cells(&self) -> MutexGuard<'_, HashMap<K, Cell>> {
        self.cells.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: K) -> KeyedGuard<'_, K> {
        let cell = self.cells().entry(key.clone()).or_default().clone();
        let guard = cell.clone().lock_owned().await;
        KeyedGuard {
            owner: self,
            key,
            cell,
            guard: Some(guard),
        }
    }

    /// Keys currently held or awaited
    pub fn active(&self) -> usize {
        self.cells().len()
    }
}

/// Exclusive access to one key; released on drop
pub struct KeyedGuard<'a, K: Eq + Hash + Clone> {
    owner: &'a KeyedLocks<K>,
    key: K,
    cell: Cell,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<K: Eq + Hash + Clone> Drop for KeyedGuard<'_, K> {
    fn drop(&mut self) {
        self.guard.take();
        let mut cells = self.owner.cells();
        // map + this guard: nobody else is waiting
        if Arc::strong_count(&self.cell) == 2 {
            cells.remove(&self.key);
        }
    }
}
