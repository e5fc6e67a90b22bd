//! Request descriptions for VK API methods.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::cache::CacheKey;

/// Profile fields requested from users.get.
pub const USER_FIELDS: &str = "bdate,education,followers_count,sex,city,country,home_town,contacts,site,status,occupation,activities,interests,music,movies,tv,books,games,about,quotes";

pub const LIKES_PAGE_SIZE: u32 = 1000;
pub const COMMENTS_PAGE_SIZE: u32 = 100;

/// One API method call: method name, parameters and an optional offset.
///
/// Parameters live in a sorted map so the serialized form does not depend on
/// the order they were added in. The access token and API version are added
/// by the client when sending and are not part of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
  method: &'static str,
  params: BTreeMap<&'static str, String>,
  offset: Option<u32>,
}

impl FetchRequest {
  pub fn new(method: &'static str) -> Self {
    Self {
      method,
      params: BTreeMap::new(),
      offset: None,
    }
  }

  pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
    self.params.insert(name, value.to_string());
    self
  }

  /// Same request positioned at `offset`.
  pub fn at_offset(&self, offset: u32) -> Self {
    Self {
      offset: Some(offset),
      ..self.clone()
    }
  }

  pub fn users(user_ids: &[String]) -> Self {
    Self::new("users.get")
      .param("user_ids", user_ids.join(","))
      .param("fields", USER_FIELDS)
  }

  pub fn user_groups(user_id: i64) -> Self {
    Self::new("groups.get")
      .param("user_id", user_id)
      .param("extended", 1)
      .param("fields", "description")
  }

  pub fn user_audio(owner_id: i64) -> Self {
    Self::new("audio.get").param("owner_id", owner_id)
  }

  /// Group walls are addressed by the negated group id.
  pub fn wall_posts(group_id: i64, count: u32) -> Self {
    Self::new("wall.get")
      .param("owner_id", -group_id)
      .param("count", count)
  }

  pub fn wall_likes(group_id: i64, post_id: i64) -> Self {
    Self::new("wall.getLikes")
      .param("owner_id", -group_id)
      .param("post_id", post_id)
      .param("count", LIKES_PAGE_SIZE)
  }

  pub fn wall_comments(group_id: i64, post_id: i64) -> Self {
    Self::new("wall.getComments")
      .param("owner_id", -group_id)
      .param("post_id", post_id)
      .param("count", COMMENTS_PAGE_SIZE)
  }

  pub fn method(&self) -> &'static str {
    self.method
  }

  /// Query string pairs, offset included when set.
  pub fn query(&self) -> Vec<(&'static str, String)> {
    let mut pairs: Vec<_> = self
      .params
      .iter()
      .map(|(name, value)| (*name, value.clone()))
      .collect();
    if let Some(offset) = self.offset {
      pairs.push(("offset", offset.to_string()));
    }
    pairs
  }

  /// Deterministic `method?k=v&...` form.
  pub fn canonical(&self) -> String {
    let query: Vec<String> = self
      .query()
      .into_iter()
      .map(|(name, value)| format!("{}={}", name, value))
      .collect();
    format!("{}?{}", self.method, query.join("&"))
  }
}

impl CacheKey for FetchRequest {
  fn cache_hash(&self) -> String {
    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(self.canonical().as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    self.canonical()
  }
}
