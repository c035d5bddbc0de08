//! Per-identifier advisory locks
//!
//! The orchestrator serializes its own create/update/delete sequence per
//! resource id: the integrity guard's check and the subsequent status
//! transition must be one logical step with respect to any concurrent
//! mutation of the same id. Lock entries are keyed by `kind:id` so a
//! dependent create and its parent share's delete contend on the same key.

use crate::model::ResourceKind;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Advisory lock map over resource identifiers
pub struct LockManager {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the lock for a resource id, waiting if another operation on
    /// the same id is in flight. Entries are retained for the life of the
    /// process; the key space is bounded by the set of live resource ids.
    pub async fn acquire(&self, kind: ResourceKind, id: &str) -> OwnedMutexGuard<()> {
        let key = format!("{}:{}", kind, id);
        // Clone the Arc out of the shard before awaiting.
        let lock = self.locks.entry(key).or_default().clone();
        lock.lock_owned().await
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_id_serializes() {
        let manager = Arc::new(LockManager::new());
        let counter = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _guard = manager.acquire(ResourceKind::FileShare, "s-1").await;
                // Nobody else may be inside the critical section.
                let prev = counter.fetch_add(1, Ordering::SeqCst);
                assert_eq!(prev, 0);
                tokio::time::sleep(Duration::from_millis(2)).await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_distinct_ids_do_not_block() {
        let manager = LockManager::new();
        let _a = manager.acquire(ResourceKind::FileShare, "s-1").await;
        // Different id: must not deadlock.
        let _b = manager.acquire(ResourceKind::FileShare, "s-2").await;
        // Same id, different kind: separate key.
        let _c = manager.acquire(ResourceKind::FileShareSnapshot, "s-1").await;
    }
}
