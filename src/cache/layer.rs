//! In-process memoization of fetch results.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tracing::debug;

use super::traits::{CacheEntry, CacheKey, CacheStats, EvictionPolicy};

type Slot<V> = Arc<OnceCell<CacheEntry<V>>>;

/// Memoizes the result of a fetch per [`CacheKey`].
///
/// Whatever the producer returns is stored, failures included: a `None`
/// stays `None` until the entry is evicted. Concurrent callers for the same
/// key share one in-flight producer.
pub struct ResponseCache<V> {
  entries: Mutex<HashMap<String, Slot<V>>>,
  policy: EvictionPolicy,
  hits: AtomicU64,
  misses: AtomicU64,
}

impl<V: Clone> ResponseCache<V> {
  pub fn new() -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      policy: EvictionPolicy::Never,
      hits: AtomicU64::new(0),
      misses: AtomicU64::new(0),
    }
  }

  /// Set the eviction policy.
  pub fn with_policy(mut self, policy: EvictionPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Return the stored value for `key`, running `producer` only on a miss.
  pub async fn get_or_fetch<K, F, Fut>(&self, key: &K, producer: F) -> V
  where
    K: CacheKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = V>,
  {
    let hash = key.cache_hash();
    let slot = self.slot(&hash);

    if let Some(entry) = slot.get() {
      self.hits.fetch_add(1, Ordering::Relaxed);
      debug!(key = %key.description(), "cache hit");
      return entry.value.clone();
    }

    let description = key.description();
    let entry = slot
      .get_or_init(|| async move {
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %description, "cache miss, fetching");
        CacheEntry::new(hash, producer().await)
      })
      .await;

    entry.value.clone()
  }

  /// Look up or create the slot for `hash`, dropping it first if expired.
  fn slot(&self, hash: &str) -> Slot<V> {
    let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

    let expired = entries
      .get(hash)
      .and_then(|slot| slot.get())
      .is_some_and(|entry| self.policy.is_expired(entry.created_at));
    if expired {
      debug!(key = hash, "evicting expired cache entry");
      entries.remove(hash);
    }

    Arc::clone(entries.entry(hash.to_string()).or_default())
  }

  pub fn len(&self) -> usize {
    self
      .entries
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn stats(&self) -> CacheStats {
    CacheStats {
      hits: self.hits.load(Ordering::Relaxed),
      misses: self.misses.load(Ordering::Relaxed),
      entries: self.len(),
    }
  }
}

impl<V: Clone> Default for ResponseCache<V> {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::AtomicU32;
  use std::time::Duration;

  struct TestKey(&'static str);

  impl CacheKey for TestKey {
    fn cache_hash(&self) -> String {
      self.0.to_string()
    }

    fn description(&self) -> String {
      format!("test {}", self.0)
    }
  }

  #[tokio::test]
  async fn test_second_call_served_from_cache() {
    let cache: ResponseCache<Arc<Vec<i64>>> = ResponseCache::new();
    let calls = AtomicU32::new(0);
    let counter = &calls;

    let first = cache
      .get_or_fetch(&TestKey("likes:1:10"), || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(vec![1, 2])
      })
      .await;
    let second = cache
      .get_or_fetch(&TestKey("likes:1:10"), || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Arc::new(vec![99])
      })
      .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(
      cache.stats(),
      CacheStats {
        hits: 1,
        misses: 1,
        entries: 1
      }
    );
  }

  #[tokio::test]
  async fn test_failure_is_cached_too() {
    let cache: ResponseCache<Option<u32>> = ResponseCache::new();
    let calls = AtomicU32::new(0);
    let counter = &calls;

    for _ in 0..3 {
      let value = cache
        .get_or_fetch(&TestKey("posts:5"), || async move {
          counter.fetch_add(1, Ordering::SeqCst);
          None
        })
        .await;
      assert!(value.is_none());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_distinct_keys_fetch_separately() {
    let cache: ResponseCache<&'static str> = ResponseCache::new();

    let a = cache.get_or_fetch(&TestKey("a"), || async { "a" }).await;
    let b = cache.get_or_fetch(&TestKey("b"), || async { "b" }).await;

    assert_eq!((a, b), ("a", "b"));
    assert_eq!(cache.len(), 2);
  }

  #[tokio::test]
  async fn test_expired_entry_is_fetched_again() {
    let cache: ResponseCache<u32> =
      ResponseCache::new().with_policy(EvictionPolicy::MaxAge(chrono::Duration::zero()));
    let calls = AtomicU32::new(0);
    let counter = &calls;

    for _ in 0..2 {
      cache
        .get_or_fetch(&TestKey("k"), || async move {
          counter.fetch_add(1, Ordering::SeqCst) + 1
        })
        .await;
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 1);
  }

  #[tokio::test]
  async fn test_concurrent_callers_share_one_fetch() {
    let cache: ResponseCache<u32> = ResponseCache::new();
    let calls = AtomicU32::new(0);
    let counter = &calls;
    let key = TestKey("shared");

    let fetch = || {
      cache.get_or_fetch(&key, move || async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        counter.fetch_add(1, Ordering::SeqCst) + 40
      })
    };

    let (a, b) = futures::future::join(fetch(), fetch()).await;

    assert_eq!((a, b), (40, 40));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
