//! Cache storage trait and in-memory implementation.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// A single cached payload.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  /// The serialized payload
  pub value: Value,
  /// When the payload was stored
  pub stored_at: Instant,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Get the entry stored under `key`, fresh or not.
  fn get(&self, key: &str) -> Option<CachedEntry>;

  /// Store a payload under `key`, replacing any previous entry.
  fn store(&self, key: &str, value: Value);

  /// Remove the entry under `key`. Returns whether one was present.
  fn invalidate(&self, key: &str) -> bool;

  /// Remove every entry.
  fn clear(&self);

  /// Remove entries stored at least `ttl` ago. Returns how many went.
  fn prune(&self, ttl: Duration) -> usize;

  /// Number of stored entries.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

macro_rules! forward_storage {
  ($ptr:ident) => {
    impl<S: CacheStorage + ?Sized> CacheStorage for $ptr<S> {
      fn get(&self, key: &str) -> Option<CachedEntry> {
        (**self).get(key)
      }

      fn store(&self, key: &str, value: Value) {
        (**self).store(key, value)
      }

      fn invalidate(&self, key: &str) -> bool {
        (**self).invalidate(key)
      }

      fn clear(&self) {
        (**self).clear()
      }

      fn prune(&self, ttl: Duration) -> usize {
        (**self).prune(ttl)
      }

      fn len(&self) -> usize {
        (**self).len()
      }
    }
  };
}

forward_storage!(Box);
forward_storage!(Arc);

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Option<CachedEntry> {
    None // Always miss
  }

  fn store(&self, _key: &str, _value: Value) {
    // Discard
  }

  fn invalidate(&self, _key: &str) -> bool {
    false
  }

  fn clear(&self) {}

  fn prune(&self, _ttl: Duration) -> usize {
    0
  }

  fn len(&self) -> usize {
    0
  }
}

/// Process-local cache storage.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, CachedEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedEntry>> {
    // Entries are plain data, a panic mid-update cannot leave them half-written.
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &str) -> Option<CachedEntry> {
    self.entries().get(key).cloned()
  }

  fn store(&self, key: &str, value: Value) {
    let entry = CachedEntry {
      value,
      stored_at: Instant::now(),
    };
    self.entries().insert(key.to_string(), entry);
  }

  fn invalidate(&self, key: &str) -> bool {
    self.entries().remove(key).is_some()
  }

  fn clear(&self) {
    self.entries().clear();
  }

  fn prune(&self, ttl: Duration) -> usize {
    let mut entries = self.entries();
    let before = entries.len();
    entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    before - entries.len()
  }

  fn len(&self) -> usize {
    self.entries().len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_memory_store_and_get() {
    let storage = MemoryStorage::new();
    assert!(storage.get("book-1").is_none());

    storage.store("book-1", json!({"id": 1}));
    let entry = storage.get("book-1").expect("entry should be stored");
    assert_eq!(entry.value, json!({"id": 1}));
    assert_eq!(storage.len(), 1);
  }

  #[test]
  fn test_memory_invalidate() {
    let storage = MemoryStorage::new();
    storage.store("all-books", json!([]));

    assert!(storage.invalidate("all-books"));
    assert!(!storage.invalidate("all-books"));
    assert!(storage.is_empty());
  }

  #[test]
  fn test_memory_clear() {
    let storage = MemoryStorage::new();
    storage.store("book-1", json!({"id": 1}));
    storage.store("book-2", json!({"id": 2}));

    storage.clear();
    assert!(storage.is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn test_memory_prune_drops_only_stale() {
    let storage = MemoryStorage::new();
    storage.store("old", json!(1));
    tokio::time::advance(Duration::from_secs(30)).await;
    storage.store("new", json!(2));
    tokio::time::advance(Duration::from_secs(30)).await;

    assert_eq!(storage.prune(Duration::from_secs(60)), 1);
    assert!(storage.get("old").is_none());
    assert!(storage.get("new").is_some());
  }

  #[test]
  fn test_noop_never_stores() {
    let storage = NoopStorage;
    storage.store("book-1", json!({"id": 1}));

    assert!(storage.get("book-1").is_none());
    assert!(storage.is_empty());
  }
}
