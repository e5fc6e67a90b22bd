//! VK client with retry, pagination and memoization.

use color_eyre::Result;
use std::future::Future;
use std::sync::Arc;

use crate::activity::EngagementSource;
use crate::cache::{CacheStats, EvictionPolicy, ResponseCache};
use crate::config::Config;
use crate::fetch::{Paginator, RetryExecutor};

use super::client::VkClient;
use super::request::{FetchRequest, COMMENTS_PAGE_SIZE, LIKES_PAGE_SIZE};
use super::types::{AudioTrack, CommentIndex, Group, LikeSet, Post, UserProfile};

/// VK client whose methods never fail.
///
/// Every call goes through the retry executor, so callers get `None` (or an
/// empty/partial collection for paginated resources) instead of an error.
/// Wall posts, likes and comments are cached for the lifetime of the client.
#[derive(Clone)]
pub struct CachedVkClient {
  inner: VkClient,
  retry: RetryExecutor,
  posts_per_group: u32,
  posts: Arc<ResponseCache<Option<Arc<Vec<Post>>>>>,
  likes: Arc<ResponseCache<Arc<LikeSet>>>,
  comments: Arc<ResponseCache<Arc<CommentIndex>>>,
}

impl CachedVkClient {
  /// Create a client using the access token from the environment.
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_access_token()?;
    Self::with_token(config, token)
  }

  pub fn with_token(config: &Config, token: String) -> Result<Self> {
    let eviction = config.cache.eviction_policy()?;
    let inner = VkClient::new(&config.api, token)?;

    Ok(Self::from_parts(
      inner,
      RetryExecutor::new(config.retry.policy()),
      config.harvest.posts_per_group,
      eviction,
    ))
  }

  pub fn from_parts(
    inner: VkClient,
    retry: RetryExecutor,
    posts_per_group: u32,
    eviction: EvictionPolicy,
  ) -> Self {
    Self {
      inner,
      retry,
      posts_per_group,
      posts: Arc::new(ResponseCache::new().with_policy(eviction)),
      likes: Arc::new(ResponseCache::new().with_policy(eviction)),
      comments: Arc::new(ResponseCache::new().with_policy(eviction)),
    }
  }

  /// Get user profiles (not cached - requested once per run).
  pub async fn get_users(&self, user_ids: &[String]) -> Option<Vec<UserProfile>> {
    self
      .retry
      .run(|| self.inner.get_users(user_ids))
      .await
      .flatten()
  }

  /// Get a user's groups (not cached - requested once per user).
  pub async fn get_user_groups(&self, user_id: i64) -> Option<Vec<Group>> {
    self
      .retry
      .run(|| self.inner.get_user_groups(user_id))
      .await
      .flatten()
  }

  /// Get a user's audio list (not cached).
  pub async fn get_user_audio(&self, user_id: i64) -> Option<Vec<AudioTrack>> {
    self
      .retry
      .run(|| self.inner.get_user_audio(user_id))
      .await
      .flatten()
  }

  /// Get a group's latest posts with caching.
  ///
  /// A failed fetch is cached as `None` as well.
  pub async fn get_posts(&self, group_id: i64) -> Option<Arc<Vec<Post>>> {
    let count = self.posts_per_group;
    let key = FetchRequest::wall_posts(group_id, count);

    self
      .posts
      .get_or_fetch(&key, || async move {
        self
          .retry
          .run(|| self.inner.get_posts(group_id, count))
          .await
          .map(Arc::new)
      })
      .await
  }

  /// Get everyone who liked a post, walking all pages, with caching.
  pub async fn get_post_likes(&self, group_id: i64, post_id: i64) -> Arc<LikeSet> {
    let key = FetchRequest::wall_likes(group_id, post_id);

    self
      .likes
      .get_or_fetch(&key, || async move {
        let likes: LikeSet = Paginator::new(LIKES_PAGE_SIZE)
          .fetch_all(&self.retry, |offset| {
            self.inner.get_likes_page(group_id, post_id, offset)
          })
          .await;
        Arc::new(likes)
      })
      .await
  }

  /// Get every comment on a post, walking all pages, with caching.
  pub async fn get_post_comments(&self, group_id: i64, post_id: i64) -> Arc<CommentIndex> {
    let key = FetchRequest::wall_comments(group_id, post_id);

    self
      .comments
      .get_or_fetch(&key, || async move {
        let comments: CommentIndex = Paginator::new(COMMENTS_PAGE_SIZE)
          .fetch_all(&self.retry, |offset| {
            self.inner.get_comments_page(group_id, post_id, offset)
          })
          .await;
        Arc::new(comments)
      })
      .await
  }

  /// Hit/miss counters for the posts, likes and comments caches.
  pub fn cache_stats(&self) -> [CacheStats; 3] {
    [
      self.posts.stats(),
      self.likes.stats(),
      self.comments.stats(),
    ]
  }
}

impl EngagementSource for CachedVkClient {
  fn post_likes(&self, group_id: i64, post_id: i64) -> impl Future<Output = Arc<LikeSet>> {
    self.get_post_likes(group_id, post_id)
  }

  fn post_comments(&self, group_id: i64, post_id: i64) -> impl Future<Output = Arc<CommentIndex>> {
    self.get_post_comments(group_id, post_id)
  }
}
