//! Per-key async exclusion.
//!
//! The orchestrator holds one of these per kind of key (order id, payment id)
//! so that a read-check-call-write sequence against one payment never
//! interleaves with another on the same key. Entries are dropped once no task
//! holds or waits on them.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `work` while holding the lock for `key`.
    ///
    /// Calls with different keys run concurrently.
    pub async fn run<F, T>(&self, key: &str, work: F) -> T
    where
        F: Future<Output = T>,
    {
        let lock = self.acquire(key).await;
        let result = {
            let _guard = lock.lock().await;
            work.await
        };
        self.release(key, lock).await;
        result
    }

    async fn acquire(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn release(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map plus ours: nobody else is waiting.
        if Arc::strong_count(&lock) == 2
            && locks.get(key).is_some_and(|existing| Arc::ptr_eq(existing, &lock))
        {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}
