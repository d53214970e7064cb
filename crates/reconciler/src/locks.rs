use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Serializes reconciliation passes that touch the same label key.
///
/// Passes for different keys run independently; two passes for one key take
/// turns so the read-decide-act sequence never interleaves. A key's entry is
/// dropped once no pass holds or waits for it.
#[derive(Clone, Default)]
pub struct KeyLocks {
    inner: Arc<LockMap>,
}

/// Held for the duration of one pass.
pub struct KeyGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    map: Arc<LockMap>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold their own clone, so a count of one means nobody else
        // needs the entry. The shard lock makes this atomic with `lock`.
        self.map
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> KeyGuard {
        let mutex = Arc::clone(self.inner.entry(key.to_string()).or_default().value());
        let guard = mutex.lock_owned().await;
        KeyGuard {
            guard: Some(guard),
            key: key.to_string(),
            map: Arc::clone(&self.inner),
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.inner.len()
    }
}
