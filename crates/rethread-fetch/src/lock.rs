use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Mutex as KeyMutex, OwnedMutexGuard};

/// Registry of per-key async locks
///
/// Holding the guard serializes every plan-resolve, fetch and commit
/// sequence for one key. Keys of different targets never contend.
#[derive(Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Weak<KeyMutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder of `key` remains
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = self.lock_for(key);
        lock.lock_owned().await
    }

    /// Number of keys with a live lock
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.values().filter(|weak| weak.strong_count() > 0).count()
    }

    fn lock_for(&self, key: &str) -> Arc<KeyMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        // Prune dead weak refs once the map grows
        if locks.len() > 128 {
            locks.retain(|_, weak| weak.strong_count() > 0);
        }

        if let Some(existing) = locks.get(key).and_then(Weak::upgrade) {
            return existing;
        }

        let lock = Arc::new(KeyMutex::new(()));
        locks.insert(key.to_string(), Arc::downgrade(&lock));
        lock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = Arc::new(KeyLocks::new());
        let guard = locks.acquire("thread:abc123").await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("thread:abc123").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_contend() {
        let locks = KeyLocks::new();
        let _alice = locks.acquire("author:alice").await;
        let bob = tokio::time::timeout(Duration::from_millis(50), locks.acquire("author:bob")).await;
        assert!(bob.is_ok());
    }

    #[tokio::test]
    async fn test_released_keys_are_dropped() {
        let locks = KeyLocks::new();
        {
            let _guard = locks.acquire("thread:t").await;
            assert_eq!(locks.active(), 1);
        }
        assert_eq!(locks.active(), 0);
    }
}
