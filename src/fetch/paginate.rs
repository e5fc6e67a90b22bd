//! Offset-cursor pagination over an unbounded result set.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use tracing::{debug, warn};

use super::retry::RetryExecutor;

/// Container that pages are folded into.
pub trait PageSink: Default {
  type Item;

  fn absorb(&mut self, items: Vec<Self::Item>);
}

impl<T> PageSink for Vec<T> {
  type Item = T;

  fn absorb(&mut self, items: Vec<T>) {
    self.extend(items);
  }
}

/// Later pages overwrite earlier entries for the same key.
impl<K: Eq + Hash, V> PageSink for HashMap<K, V> {
  type Item = (K, V);

  fn absorb(&mut self, items: Vec<(K, V)>) {
    self.extend(items);
  }
}

/// One slice of a paginated result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub has_more: bool,
}

impl<T> Page<T> {
  /// A page is the last one when it is empty or shorter than requested.
  pub fn new(items: Vec<T>, page_size: u32) -> Self {
    let has_more = !items.is_empty() && items.len() >= page_size as usize;
    Self { items, has_more }
  }
}

/// Walks an offset cursor in `page_size` steps until the data runs out.
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
  page_size: u32,
}

impl Paginator {
  pub fn new(page_size: u32) -> Self {
    Self {
      page_size: page_size.max(1),
    }
  }

  /// Fetch every page and fold the items into `C`.
  ///
  /// Each page goes through `retry`. A page that still fails after retrying
  /// ends the walk exactly like an empty page would, so the result may be
  /// partial. The caller is not told.
  pub async fn fetch_all<C, F, Fut>(&self, retry: &RetryExecutor, mut page_fetch: F) -> C
  where
    C: PageSink,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = color_eyre::Result<Vec<C::Item>>>,
  {
    let mut acc = C::default();
    let mut offset = 0u32;
    let mut pages = 0u32;

    loop {
      let Some(items) = retry.run(|| page_fetch(offset)).await else {
        warn!(offset, pages, "page fetch failed, keeping what was collected");
        break;
      };

      let page = Page::new(items, self.page_size);
      if page.items.is_empty() {
        break;
      }

      pages += 1;
      acc.absorb(page.items);
      if !page.has_more {
        break;
      }
      offset += self.page_size;
    }

    debug!(pages, last_offset = offset, "pagination finished");
    acc
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::fetch::RetryPolicy;
  use color_eyre::eyre::eyre;
  use std::sync::Mutex;
  use std::time::Duration;

  fn retry() -> RetryExecutor {
    RetryExecutor::new(RetryPolicy::new(5, Duration::ZERO))
  }

  #[tokio::test]
  async fn test_short_final_page_ends_walk() {
    let sizes = [100usize, 100, 37];
    let offsets = Mutex::new(Vec::new());
    let seen = &offsets;

    let items: Vec<u32> = Paginator::new(100)
      .fetch_all(&retry(), move |offset| async move {
        let mut log = seen.lock().unwrap();
        let page = log.len();
        log.push(offset);
        Ok(vec![offset; sizes.get(page).copied().unwrap_or(0)])
      })
      .await;

    assert_eq!(items.len(), 237);
    assert_eq!(*offsets.lock().unwrap(), vec![0, 100, 200]);
  }

  #[tokio::test]
  async fn test_empty_page_ends_walk() {
    let calls = Mutex::new(0u32);
    let counter = &calls;

    let items: Vec<u32> = Paginator::new(2)
      .fetch_all(&retry(), move |offset| async move {
        *counter.lock().unwrap() += 1;
        Ok(if offset < 4 { vec![offset, offset + 1] } else { vec![] })
      })
      .await;

    assert_eq!(items, vec![0, 1, 2, 3]);
    assert_eq!(*calls.lock().unwrap(), 3);
  }

  #[tokio::test]
  async fn test_first_page_empty() {
    let items: Vec<u32> = Paginator::new(10)
      .fetch_all(&retry(), |_| async { Ok(Vec::new()) })
      .await;

    assert!(items.is_empty());
  }

  #[tokio::test]
  async fn test_failed_page_truncates_silently() {
    let calls = Mutex::new(0u32);
    let counter = &calls;

    let items: Vec<u32> = Paginator::new(2)
      .fetch_all(&retry(), move |offset| async move {
        *counter.lock().unwrap() += 1;
        if offset == 0 {
          Ok(vec![1, 2])
        } else {
          Err(eyre!("rate limited"))
        }
      })
      .await;

    assert_eq!(items, vec![1, 2]);
    // One good page, then five attempts at the second.
    assert_eq!(*calls.lock().unwrap(), 6);
  }

  #[tokio::test]
  async fn test_page_recovering_within_budget_continues_walk() {
    let calls = Mutex::new(Vec::new());
    let log = &calls;

    let items: Vec<u32> = Paginator::new(2)
      .fetch_all(&retry(), move |offset| async move {
        let mut log = log.lock().unwrap();
        log.push(offset);
        let failures_at_two = log.iter().filter(|&&o| o == 2).count();
        match offset {
          0 => Ok(vec![0, 1]),
          2 if failures_at_two <= 2 => Err(eyre!("flaky")),
          2 => Ok(vec![2, 3]),
          _ => Ok(vec![4]),
        }
      })
      .await;

    assert_eq!(items, vec![0, 1, 2, 3, 4]);
    // offset 0 once, offset 2 twice failing then once succeeding, offset 4 once
    assert_eq!(*calls.lock().unwrap(), vec![0, 2, 2, 2, 4]);
  }

  #[tokio::test]
  async fn test_map_sink_keeps_later_page_value() {
    let comments: HashMap<i64, String> = Paginator::new(2)
      .fetch_all(&retry(), |offset| async move {
        Ok(match offset {
          0 => vec![(7, "first".to_string()), (8, "other".to_string())],
          2 => vec![(7, "second".to_string())],
          _ => vec![],
        })
      })
      .await;

    assert_eq!(comments.len(), 2);
    assert_eq!(comments[&7], "second");
    assert_eq!(comments[&8], "other");
  }

  #[test]
  fn test_page_has_more() {
    assert!(Page::new(vec![1, 2], 2).has_more);
    assert!(!Page::new(vec![1], 2).has_more);
    assert!(!Page::new(Vec::<u8>::new(), 2).has_more);
  }
}
