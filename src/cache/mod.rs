//! Generic in-process response cache.
//!
//! This module provides a transport-agnostic memoization layer that:
//! - Keys results by a deterministic hash of the request parameters
//! - Stores every result, including "no result" failures
//! - Single-flights concurrent requests for the same key
//! - Applies an explicit eviction policy (default: never evict)

mod layer;
mod traits;

pub use layer::ResponseCache;
pub use traits::{CacheEntry, CacheKey, CacheStats, EvictionPolicy};
