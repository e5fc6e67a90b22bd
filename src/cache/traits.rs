//! Core traits and types for the caching system.

use chrono::{DateTime, Duration, Utc};

/// Identifies a cached request.
///
/// Two keys with the same `cache_hash` are the same request, so the hash must
/// cover every parameter that can change the response.
pub trait CacheKey {
  /// Stable, deterministic identifier
  fn cache_hash(&self) -> String;

  /// Human-readable form for logs
  fn description(&self) -> String;
}

/// A stored result together with when it was produced.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
  pub key: String,
  pub value: V,
  pub created_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
  pub fn new(key: String, value: V) -> Self {
    Self {
      key,
      value,
      created_at: Utc::now(),
    }
  }
}

/// When a stored entry stops being served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvictionPolicy {
  /// Keep every entry for the lifetime of the cache
  #[default]
  Never,
  /// Produce the value again once the entry is at least this old
  MaxAge(Duration),
}

impl EvictionPolicy {
  pub fn is_expired(&self, created_at: DateTime<Utc>) -> bool {
    match self {
      Self::Never => false,
      Self::MaxAge(max_age) => Utc::now() - created_at >= *max_age,
    }
  }
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub hits: u64,
  pub misses: u64,
  pub entries: usize,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_never_policy_keeps_old_entries() {
    let created = Utc::now() - Duration::days(365);
    assert!(!EvictionPolicy::Never.is_expired(created));
  }

  #[test]
  fn test_max_age_policy() {
    let policy = EvictionPolicy::MaxAge(Duration::minutes(5));
    assert!(!policy.is_expired(Utc::now()));
    assert!(policy.is_expired(Utc::now() - Duration::minutes(6)));
  }
}
