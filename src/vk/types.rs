use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::fetch::PageSink;

/// User profile as returned by users.get
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
  pub id: i64,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub is_closed: bool,
  pub bdate: Option<String>,
  pub sex: Option<u8>, // 1 = female, 2 = male
  pub city: Option<String>,
  pub country: Option<String>,
  pub home_town: Option<String>,
  pub mobile_phone: Option<String>,
  pub home_phone: Option<String>,
  pub site: Option<String>,
  pub status: Option<String>,
  pub occupation: Option<String>,
  pub activities: Option<String>,
  pub interests: Option<String>,
  pub music: Option<String>,
  pub movies: Option<String>,
  pub tv: Option<String>,
  pub books: Option<String>,
  pub games: Option<String>,
  pub about: Option<String>,
  pub quotes: Option<String>,
}

impl UserProfile {
  pub fn full_name(&self) -> String {
    format!(
      "{} {}",
      self.first_name.as_deref().unwrap_or_default(),
      self.last_name.as_deref().unwrap_or_default()
    )
    .trim()
    .to_string()
  }
}

/// Community the user belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
  pub id: i64,
  pub name: String,
  pub kind: Option<String>, // "group", "page" or "event"
  pub description: Option<String>,
}

/// Wall post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
  pub id: i64,
  /// Unix timestamp
  pub date: i64,
  pub comments_count: u64,
  pub likes_count: u64,
  pub views_count: u64,
  pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
  pub id: i64,
  pub artist: String,
  pub title: String,
  /// Seconds
  pub duration: u32,
}

/// Distinct users who liked one post.
///
/// A uid repeated on a later page (the offset shifts when likes arrive during
/// the walk) is counted once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikeSet {
  users: HashSet<i64>,
}

impl LikeSet {
  pub fn contains(&self, user_id: i64) -> bool {
    self.users.contains(&user_id)
  }

  pub fn len(&self) -> usize {
    self.users.len()
  }

  pub fn is_empty(&self) -> bool {
    self.users.is_empty()
  }

  pub fn users(&self) -> impl Iterator<Item = i64> + '_ {
    self.users.iter().copied()
  }
}

impl PageSink for LikeSet {
  type Item = i64;

  fn absorb(&mut self, items: Vec<i64>) {
    self.users.extend(items);
  }
}

impl FromIterator<i64> for LikeSet {
  fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
    Self {
      users: iter.into_iter().collect(),
    }
  }
}

/// Comment text per commenter on one post.
///
/// A user who commented more than once keeps only their last comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentIndex {
  by_author: HashMap<i64, String>,
}

impl CommentIndex {
  pub fn get(&self, user_id: i64) -> Option<&str> {
    self.by_author.get(&user_id).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.by_author.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_author.is_empty()
  }
}

impl PageSink for CommentIndex {
  type Item = (i64, String);

  fn absorb(&mut self, items: Vec<(i64, String)>) {
    self.by_author.absorb(items);
  }
}

impl FromIterator<(i64, String)> for CommentIndex {
  fn from_iter<I: IntoIterator<Item = (i64, String)>>(iter: I) -> Self {
    Self {
      by_author: iter.into_iter().collect(),
    }
  }
}

/// One post the target user engaged with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
  pub user_id: i64,
  pub group_id: i64,
  pub post_id: i64,
  pub date: i64,
  pub comment: Option<String>,
  pub liked: bool,
  pub post_text: String,
}

impl ActivityRecord {
  pub fn published_at(&self) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(self.date, 0)
  }
}
