//! Per-collection mutation locking.
//!
//! At most one indexing job may mutate a given collection at a time. Locks
//! are acquired with a bounded timeout; hitting the timeout fails the job
//! without touching the store. The registry is an explicit, injected object
//! with one instance per process.

use grounder_core::Error;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// Guard proving exclusive mutation rights over one collection.
pub type MutationGuard = OwnedMutexGuard<()>;

/// Registry of per-collection mutation locks.
#[derive(Debug, Default)]
pub struct MutationLocks {
    locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl MutationLocks {
    /// Create an empty lock registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the mutation lock for `collection`, waiting at most
    /// `timeout`.
    ///
    /// Returns [`Error::LockTimeout`] when another job holds the lock for
    /// the whole wait, leaving the store untouched.
    pub async fn acquire(
        &self,
        collection: &str,
        timeout: Duration,
    ) -> Result<MutationGuard, Error> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                locks
                    .entry(collection.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };

        debug!(collection, ?timeout, "waiting for mutation lock");
        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => {
                debug!(collection, "mutation lock acquired");
                Ok(guard)
            }
            Err(_) => {
                warn!(collection, ?timeout, "timed out waiting for mutation lock");
                Err(Error::LockTimeout {
                    collection: collection.to_string(),
                    waited: timeout,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_uncontended() {
        let locks = MutationLocks::new();
        let guard = locks
            .acquire("docs", Duration::from_millis(50))
            .await
            .unwrap();
        drop(guard);
    }

    #[tokio::test]
    async fn test_contended_acquire_times_out() {
        let locks = MutationLocks::new();
        let _held = locks
            .acquire("docs", Duration::from_millis(50))
            .await
            .unwrap();

        let err = locks
            .acquire("docs", Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::LockTimeout { .. }));
    }

    #[tokio::test]
    async fn test_release_allows_reacquire() {
        let locks = MutationLocks::new();
        let guard = locks
            .acquire("docs", Duration::from_millis(50))
            .await
            .unwrap();
        drop(guard);

        assert!(locks
            .acquire("docs", Duration::from_millis(50))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_distinct_collections_do_not_contend() {
        let locks = MutationLocks::new();
        let _a = locks
            .acquire("user_1", Duration::from_millis(50))
            .await
            .unwrap();
        // A different collection's lock is free
        assert!(locks
            .acquire("user_2", Duration::from_millis(20))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_waiter_proceeds_once_released() {
        let locks = Arc::new(MutationLocks::new());
        let guard = locks
            .acquire("docs", Duration::from_millis(50))
            .await
            .unwrap();

        let locks2 = Arc::clone(&locks);
        let waiter = tokio::spawn(async move {
            locks2.acquire("docs", Duration::from_secs(5)).await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(guard);

        assert!(waiter.await.unwrap().is_ok());
    }
}
