use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-aggregate mutexes. All writes to one technician's
/// inventory, or to one part request, go through the lock registered under
/// that aggregate's id, so concurrent callers observe serialized updates
/// instead of lost read-modify-write interleavings.
#[derive(Clone, Default)]
pub struct AggregateLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl AggregateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for a single aggregate id.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            self.locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Acquires locks for a set of aggregate ids in sorted order, so two
    /// callers locking overlapping sets cannot deadlock.
    pub async fn acquire_many(&self, keys: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<String> = keys.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in &sorted {
            guards.push(self.acquire(key).await);
        }
        guards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[tokio::test]
    async fn serializes_writers_on_the_same_key() {
        let locks = AggregateLocks::new();
        let counter = Arc::new(AtomicI32::new(0));

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let locks = locks.clone();
            let counter = counter.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.acquire("EMP1").await;
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                // No other task may have entered the section meanwhile.
                assert_eq!(counter.load(Ordering::SeqCst), 1);
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
    }

    #[tokio::test]
    async fn acquire_many_deduplicates_keys() {
        let locks = AggregateLocks::new();
        let guards = locks
            .acquire_many(&["R2".to_string(), "R1".to_string(), "R2".to_string()])
            .await;
        assert_eq!(guards.len(), 2);
    }
}
