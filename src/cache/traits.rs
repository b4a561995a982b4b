//! Core traits and types for the caching system.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for payloads that can be cached.
///
/// Payloads are stored as JSON values, so anything that round-trips through
/// serde qualifies.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

impl<T> Cacheable for T where T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

/// Deterministic identity of a cacheable read.
pub trait QueryKey {
  /// Key used for both the cache and the pending-request registry.
  fn cache_key(&self) -> String;

  /// Human readable description for logs.
  fn description(&self) -> String;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Data fetched by this caller's own transport call.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Data served from a fresh cache entry.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }

  /// Data delivered by a request another caller already had in flight.
  pub fn joined(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Joined,
    }
  }
}

/// Indicates where a read result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Fresh cache entry, no transport call
  Cache,
  /// Shared result of an in-flight request started by another caller
  Joined,
}
