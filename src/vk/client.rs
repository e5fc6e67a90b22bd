use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::trace;
use url::Url;

use crate::config::ApiConfig;
use crate::vk::api_types::{
  ApiAudio, ApiComment, ApiEnvelope, ApiGroup, ApiItems, ApiLikes, ApiPost, ApiUser,
};
use crate::vk::request::FetchRequest;
use crate::vk::types::{AudioTrack, Group, Post, UserProfile};

/// VK API client wrapper. One method call per request, no retries.
#[derive(Clone)]
pub struct VkClient {
  http: reqwest::Client,
  base_url: Url,
  token: String,
  version: String,
}

impl VkClient {
  pub fn new(config: &ApiConfig, token: String) -> Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    // Url::join drops the last path segment unless the base ends with a slash
    let mut base = config.base_url.clone();
    if !base.ends_with('/') {
      base.push('/');
    }
    let base_url =
      Url::parse(&base).map_err(|e| eyre!("Invalid API base url {}: {}", config.base_url, e))?;

    Ok(Self {
      http,
      base_url,
      token,
      version: config.version.clone(),
    })
  }

  /// Perform one method call.
  ///
  /// A body carrying `error` is a failure whatever the HTTP status. A body
  /// without `response` yields `Ok(None)`.
  pub async fn call<T: DeserializeOwned>(&self, request: &FetchRequest) -> Result<Option<T>> {
    let method = request.method();
    let url = self
      .base_url
      .join(method)
      .map_err(|e| eyre!("Invalid method name {}: {}", method, e))?;

    trace!(request = %request.canonical(), "calling VK API");

    let response = self
      .http
      .get(url)
      .query(&request.query())
      .query(&[("access_token", self.token.as_str()), ("v", self.version.as_str())])
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", method, e))?;

    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read {} response: {}", method, e))?;
    let envelope: ApiEnvelope<T> = serde_json::from_slice(&body)
      .map_err(|e| eyre!("Failed to decode {} response: {}", method, e))?;

    if let Some(error) = envelope.error {
      return Err(eyre!(
        "{} returned error {}: {}",
        method,
        error.error_code,
        error.error_msg
      ));
    }

    Ok(envelope.response)
  }

  /// Get profiles for several users (ids or screen names)
  pub async fn get_users(&self, user_ids: &[String]) -> Result<Option<Vec<UserProfile>>> {
    let users: Option<Vec<ApiUser>> = self.call(&FetchRequest::users(user_ids)).await?;
    Ok(users.map(|users| users.into_iter().map(UserProfile::from).collect()))
  }

  /// Get the communities a user belongs to
  pub async fn get_user_groups(&self, user_id: i64) -> Result<Option<Vec<Group>>> {
    let groups: Option<ApiItems<ApiGroup>> =
      self.call(&FetchRequest::user_groups(user_id)).await?;
    Ok(groups.map(|g| g.items.into_iter().map(Group::from).collect()))
  }

  /// Get a user's audio list
  pub async fn get_user_audio(&self, owner_id: i64) -> Result<Option<Vec<AudioTrack>>> {
    let audio: Option<ApiItems<ApiAudio>> =
      self.call(&FetchRequest::user_audio(owner_id)).await?;
    Ok(audio.map(|a| a.items.into_iter().map(AudioTrack::from).collect()))
  }

  /// Get the latest `count` posts from a group wall
  pub async fn get_posts(&self, group_id: i64, count: u32) -> Result<Vec<Post>> {
    let posts: Option<ApiItems<ApiPost>> =
      self.call(&FetchRequest::wall_posts(group_id, count)).await?;
    Ok(
      posts
        .map(|p| p.items.into_iter().map(Post::from).collect())
        .unwrap_or_default(),
    )
  }

  /// Get one page of user ids who liked a post
  pub async fn get_likes_page(&self, group_id: i64, post_id: i64, offset: u32) -> Result<Vec<i64>> {
    let request = FetchRequest::wall_likes(group_id, post_id).at_offset(offset);
    let likes: Option<ApiLikes> = self.call(&request).await?;
    Ok(
      likes
        .map(|l| l.users.into_iter().map(|u| u.uid).collect())
        .unwrap_or_default(),
    )
  }

  /// Get one page of (author, text) pairs for a post's comments
  pub async fn get_comments_page(
    &self,
    group_id: i64,
    post_id: i64,
    offset: u32,
  ) -> Result<Vec<(i64, String)>> {
    let request = FetchRequest::wall_comments(group_id, post_id).at_offset(offset);
    let comments: Option<ApiItems<ApiComment>> = self.call(&request).await?;
    Ok(
      comments
        .map(|c| c.items.into_iter().map(|c| (c.from_id, c.text)).collect())
        .unwrap_or_default(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(base_url: &str) -> ApiConfig {
    ApiConfig {
      base_url: base_url.to_string(),
      ..ApiConfig::default()
    }
  }

  #[test]
  fn test_base_url_gains_trailing_slash() {
    let client = VkClient::new(&config("https://api.vk.com/method"), "t".into()).unwrap();
    let url = client.base_url.join("wall.get").unwrap();
    assert_eq!(url.as_str(), "https://api.vk.com/method/wall.get");
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(VkClient::new(&config("not a url"), "t".into()).is_err());
  }
}
