//! Cross-references a user against the likes and comments of group posts.

use std::future::Future;
use std::sync::Arc;
use tracing::debug;

use crate::vk::types::{ActivityRecord, CommentIndex, LikeSet, Post};

/// Where per-post likes and comments come from.
///
/// Implementations are expected to memoize, since the same post is queried
/// once per user being checked.
pub trait EngagementSource {
  fn post_likes(&self, group_id: i64, post_id: i64) -> impl Future<Output = Arc<LikeSet>>;

  fn post_comments(&self, group_id: i64, post_id: i64) -> impl Future<Output = Arc<CommentIndex>>;
}

/// Builds [`ActivityRecord`]s for one user over a list of posts.
pub struct ActivityAggregator<S> {
  source: S,
}

impl<S: EngagementSource> ActivityAggregator<S> {
  pub fn new(source: S) -> Self {
    Self { source }
  }

  pub fn source(&self) -> &S {
    &self.source
  }

  /// One record per post the user liked or left a non-empty comment on,
  /// in the order `posts` were given.
  pub async fn aggregate(&self, group_id: i64, user_id: i64, posts: &[Post]) -> Vec<ActivityRecord> {
    let mut records = Vec::new();

    for post in posts {
      let liked = self
        .source
        .post_likes(group_id, post.id)
        .await
        .contains(user_id);
      let comment = self
        .source
        .post_comments(group_id, post.id)
        .await
        .get(user_id)
        .filter(|text| !text.is_empty())
        .map(String::from);

      if liked || comment.is_some() {
        debug!(user_id, group_id, post_id = post.id, liked, "engagement found");
        records.push(ActivityRecord {
          user_id,
          group_id,
          post_id: post.id,
          date: post.date,
          comment,
          liked,
          post_text: post.text.clone(),
        });
      }
    }

    records
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;
  use std::sync::Mutex;

  /// In-memory source that counts how often each post is asked for.
  #[derive(Default)]
  struct FakeSource {
    likes: HashMap<i64, Arc<LikeSet>>,
    comments: HashMap<i64, Arc<CommentIndex>>,
    requests: Mutex<Vec<(&'static str, i64)>>,
  }

  impl FakeSource {
    fn liked(mut self, post_id: i64, users: &[i64]) -> Self {
      self
        .likes
        .insert(post_id, Arc::new(users.iter().copied().collect()));
      self
    }

    fn commented(mut self, post_id: i64, comments: &[(i64, &str)]) -> Self {
      let index = comments
        .iter()
        .map(|(user, text)| (*user, text.to_string()))
        .collect();
      self.comments.insert(post_id, Arc::new(index));
      self
    }
  }

  impl EngagementSource for FakeSource {
    async fn post_likes(&self, _group_id: i64, post_id: i64) -> Arc<LikeSet> {
      self.requests.lock().unwrap().push(("likes", post_id));
      self.likes.get(&post_id).cloned().unwrap_or_default()
    }

    async fn post_comments(&self, _group_id: i64, post_id: i64) -> Arc<CommentIndex> {
      self.requests.lock().unwrap().push(("comments", post_id));
      self.comments.get(&post_id).cloned().unwrap_or_default()
    }
  }

  fn post(id: i64) -> Post {
    Post {
      id,
      date: 1_700_000_000 + id,
      comments_count: 0,
      likes_count: 0,
      views_count: 0,
      text: format!("post {}", id),
    }
  }

  #[tokio::test]
  async fn test_only_engaged_posts_in_input_order() {
    let source = FakeSource::default()
      .liked(4, &[9, 42])
      .commented(2, &[(42, "nice")])
      .liked(3, &[9]);
    let posts: Vec<Post> = [5, 4, 3, 2, 1].into_iter().map(post).collect();

    let records = ActivityAggregator::new(source)
      .aggregate(100, 42, &posts)
      .await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].post_id, 4);
    assert!(records[0].liked);
    assert_eq!(records[0].comment, None);
    assert_eq!(records[1].post_id, 2);
    assert!(!records[1].liked);
    assert_eq!(records[1].comment.as_deref(), Some("nice"));
    assert_eq!(records[1].date, 1_700_000_002);
    assert_eq!(records[1].post_text, "post 2");
  }

  #[tokio::test]
  async fn test_like_and_comment_make_one_record() {
    let source = FakeSource::default()
      .liked(1, &[7])
      .commented(1, &[(7, "me too")]);

    let records = ActivityAggregator::new(source)
      .aggregate(5, 7, &[post(1)])
      .await;

    assert_eq!(records.len(), 1);
    assert!(records[0].liked);
    assert_eq!(records[0].comment.as_deref(), Some("me too"));
    assert_eq!(records[0].group_id, 5);
  }

  #[tokio::test]
  async fn test_empty_comment_does_not_count() {
    let source = FakeSource::default().commented(1, &[(7, "")]);

    let records = ActivityAggregator::new(source)
      .aggregate(5, 7, &[post(1)])
      .await;

    assert!(records.is_empty());
  }

  #[tokio::test]
  async fn test_every_post_checked_once_for_both_kinds() {
    let aggregator = ActivityAggregator::new(FakeSource::default());

    let records = aggregator.aggregate(5, 7, &[post(1), post(2)]).await;

    assert!(records.is_empty());
    assert_eq!(
      *aggregator.source().requests.lock().unwrap(),
      vec![("likes", 1), ("comments", 1), ("likes", 2), ("comments", 2)]
    );
  }
}
