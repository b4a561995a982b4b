//! Cache layer that orchestrates caching logic with network fetching.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::storage::CacheStorage;
use super::traits::{CacheResult, Cacheable, QueryKey};
use crate::error::ApiError;

/// Default freshness window for cached reads.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

type SharedFetch = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

type PendingMap = Arc<Mutex<HashMap<String, PendingFetch>>>;

/// An in-flight read. The ticket tells a settling request whether its
/// registration survived until it finished.
struct PendingFetch {
  ticket: u64,
  fetch: SharedFetch,
}

/// Cache layer that manages caching logic and network fetching.
///
/// Reads are served from a fresh cache entry when one exists; otherwise
/// concurrent reads of the same key share a single fetch. Lock order is
/// always pending registry first, then storage.
pub struct CacheLayer<S: CacheStorage> {
  storage: Arc<S>,
  pending: PendingMap,
  next_ticket: Arc<AtomicU64>,
  /// How long a stored entry stays fresh
  ttl: Duration,
}

impl<S: CacheStorage + 'static> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      storage: Arc::new(storage),
      pending: Arc::new(Mutex::new(HashMap::new())),
      next_ticket: Arc::new(AtomicU64::new(0)),
      ttl: DEFAULT_TTL,
    }
  }

  /// Set the freshness window for cached data.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  fn is_stale(&self, stored_at: Instant) -> bool {
    stored_at.elapsed() >= self.ttl
  }

  fn pending(&self) -> MutexGuard<'_, HashMap<String, PendingFetch>> {
    lock_pending(&self.pending)
  }

  /// Fetch with cache-first strategy and request coalescing.
  ///
  /// 1. Fresh cache entry - return it without calling `fetcher`
  /// 2. Request already in flight for the key - wait for its result
  /// 3. Otherwise start `fetcher` on a spawned task and register it
  ///
  /// The fetch runs on a spawned task (so this must be called inside a Tokio
  /// runtime) and completes even if every caller goes away.
  /// When it settles it drops its pending registration and, on success,
  /// stores the payload. Errors are never stored. A stale entry found on
  /// the way is dropped.
  pub async fn fetch<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<T>, ApiError>
  where
    T: Cacheable,
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let cache_key = key.cache_key();

    let (fetch, wrap): (SharedFetch, fn(T) -> CacheResult<T>) = {
      let mut pending = self.pending();

      // Check cache first
      if let Some(entry) = self.storage.get(&cache_key) {
        if !self.is_stale(entry.stored_at) {
          debug!("Cache hit for {}", key.description());
          return decode(entry.value).map(CacheResult::from_cache);
        }
        self.storage.invalidate(&cache_key);
      }

      if let Some(in_flight) = pending.get(&cache_key) {
        debug!("Joining in-flight request for {}", key.description());
        (in_flight.fetch.clone(), CacheResult::joined as fn(T) -> CacheResult<T>)
      } else {
        debug!("Cache miss for {}", key.description());
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let task = tokio::spawn(settle(
          Arc::clone(&self.storage),
          Arc::clone(&self.pending),
          cache_key.clone(),
          ticket,
          self.ttl,
          fetcher(),
        ));

        // A panicked fetch never reaches its own cleanup in `settle`.
        let registry = Arc::clone(&self.pending);
        let task_key = cache_key.clone();
        let fetch = async move {
          task.await.unwrap_or_else(|e| {
            release(&mut lock_pending(&registry), &task_key, ticket);
            Err(ApiError::unexpected(format!("fetch task failed: {}", e)))
          })
        }
        .boxed()
        .shared();

        pending.insert(
          cache_key,
          PendingFetch {
            ticket,
            fetch: fetch.clone(),
          },
        );
        (fetch, CacheResult::from_network as fn(T) -> CacheResult<T>)
      }
    };

    let value = fetch.await?;
    let data = decode(value)?;

    Ok(wrap(data))
  }

  /// Drop the entry for `key`, forcing the next read to refetch.
  ///
  /// A read of `key` already in flight still answers its callers, but its
  /// result predates this call and is not stored. Returns whether anything
  /// was dropped.
  pub fn invalidate(&self, key: &str) -> bool {
    let mut pending = self.pending();
    let forgotten = pending.remove(key).is_some();
    let removed = self.storage.invalidate(key);
    if removed || forgotten {
      debug!("Invalidated {}", key);
    }
    removed || forgotten
  }

  /// Drop every cached entry and forget every in-flight request.
  ///
  /// Requests already on the wire still finish, but their results are
  /// not stored.
  pub fn clear(&self) {
    let mut pending = self.pending();
    pending.clear();
    self.storage.clear();
  }

  /// Whether a fresh entry exists for `key`.
  pub fn is_cached(&self, key: &str) -> bool {
    self
      .storage
      .get(key)
      .is_some_and(|entry| !self.is_stale(entry.stored_at))
  }

  /// Whether a request for `key` is currently in flight.
  pub fn is_pending(&self, key: &str) -> bool {
    self.pending().contains_key(key)
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      pending: Arc::clone(&self.pending),
      next_ticket: Arc::clone(&self.next_ticket),
      ttl: self.ttl,
    }
  }
}

/// Await the fetch, then release the registration and store the result.
async fn settle<S, T, Fut>(
  storage: Arc<S>,
  pending: PendingMap,
  key: String,
  ticket: u64,
  ttl: Duration,
  fetch: Fut,
) -> Result<Value, ApiError>
where
  S: CacheStorage,
  T: Cacheable,
  Fut: Future<Output = Result<T, ApiError>>,
{
  let result = fetch.await.and_then(|data| {
    serde_json::to_value(data)
      .map_err(|e| ApiError::unexpected(format!("failed to encode payload: {}", e)))
  });

  let mut pending = lock_pending(&pending);

  if release(&mut pending, &key, ticket) {
    match &result {
      Ok(value) => {
        storage.prune(ttl);
        storage.store(&key, value.clone());
      }
      Err(e) => warn!("Fetch for {} failed: {}", key, e),
    }
  } else {
    debug!("Discarding result for {}, invalidated in flight", key);
  }

  result
}

/// Remove the registration for `key` if it still belongs to `ticket`.
fn release(pending: &mut HashMap<String, PendingFetch>, key: &str, ticket: u64) -> bool {
  let registered = pending
    .get(key)
    .is_some_and(|entry| entry.ticket == ticket);
  if registered {
    pending.remove(key);
  }
  registered
}

fn lock_pending(
  pending: &Mutex<HashMap<String, PendingFetch>>,
) -> MutexGuard<'_, HashMap<String, PendingFetch>> {
  pending.lock().unwrap_or_else(PoisonError::into_inner)
}

fn decode<T: Cacheable>(value: Value) -> Result<T, ApiError> {
  serde_json::from_value(value)
    .map_err(|e| ApiError::unexpected(format!("failed to decode payload: {}", e)))
}
