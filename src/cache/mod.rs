//! Generic caching layer for API reads.
//!
//! This module provides a domain-agnostic caching mechanism that:
//! - Caches serialized payloads under deterministic string keys
//! - Treats entries older than the freshness window as absent
//! - Coalesces concurrent reads of the same key into one fetch
//! - Lets callers invalidate single keys or clear everything

mod layer;
mod storage;
mod traits;

pub use layer::{CacheLayer, DEFAULT_TTL};
pub use storage::{CacheStorage, CachedEntry, MemoryStorage, NoopStorage};
pub use traits::{CacheResult, CacheSource, Cacheable, QueryKey};
