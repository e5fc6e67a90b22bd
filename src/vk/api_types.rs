//! Serde-deserializable types matching VK API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

use super::types::{AudioTrack, Group, Post, UserProfile};

// ============================================================================
// Envelope
// ============================================================================

/// Every method answers with either `response` or `error`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
  pub response: Option<T>,
  pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
  #[serde(default)]
  pub error_code: i64,
  #[serde(default)]
  pub error_msg: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiItems<T> {
  #[serde(default = "Vec::new")]
  pub items: Vec<T>,
}

// ============================================================================
// users.get
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiTitled {
  pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiNamed {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  pub id: i64,
  pub first_name: Option<String>,
  pub last_name: Option<String>,
  pub is_closed: Option<bool>,
  pub bdate: Option<String>,
  pub sex: Option<u8>,
  pub city: Option<ApiTitled>,
  pub country: Option<ApiTitled>,
  pub home_town: Option<String>,
  pub mobile_phone: Option<String>,
  pub home_phone: Option<String>,
  pub site: Option<String>,
  pub status: Option<String>,
  pub occupation: Option<ApiNamed>,
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

impl From<ApiUser> for UserProfile {
  fn from(user: ApiUser) -> Self {
    Self {
      id: user.id,
      first_name: user.first_name,
      last_name: user.last_name,
      is_closed: user.is_closed.unwrap_or(false),
      bdate: user.bdate,
      sex: user.sex,
      city: user.city.map(|c| c.title),
      country: user.country.map(|c| c.title),
      home_town: user.home_town,
      mobile_phone: user.mobile_phone,
      home_phone: user.home_phone,
      site: user.site,
      status: user.status,
      occupation: user.occupation.map(|o| o.name),
      activities: user.activities,
      interests: user.interests,
      music: user.music,
      movies: user.movies,
      tv: user.tv,
      books: user.books,
      games: user.games,
      about: user.about,
      quotes: user.quotes,
    }
  }
}

// ============================================================================
// groups.get (extended)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiGroup {
  pub id: i64,
  #[serde(default)]
  pub name: String,
  #[serde(rename = "type")]
  pub kind: Option<String>,
  pub description: Option<String>,
}

impl From<ApiGroup> for Group {
  fn from(group: ApiGroup) -> Self {
    Self {
      id: group.id,
      name: group.name,
      kind: group.kind,
      description: group.description,
    }
  }
}

// ============================================================================
// audio.get
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiAudio {
  pub id: i64,
  #[serde(default)]
  pub artist: String,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub duration: u32,
}

impl From<ApiAudio> for AudioTrack {
  fn from(audio: ApiAudio) -> Self {
    Self {
      id: audio.id,
      artist: audio.artist,
      title: audio.title,
      duration: audio.duration,
    }
  }
}

// ============================================================================
// wall.get
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ApiCount {
  #[serde(default)]
  pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ApiPost {
  pub id: i64,
  #[serde(default)]
  pub date: i64,
  #[serde(default)]
  pub comments: ApiCount,
  #[serde(default)]
  pub likes: ApiCount,
  #[serde(default)]
  pub views: ApiCount,
  #[serde(default)]
  pub text: String,
}

impl From<ApiPost> for Post {
  fn from(post: ApiPost) -> Self {
    Self {
      id: post.id,
      date: post.date,
      comments_count: post.comments.count,
      likes_count: post.likes.count,
      views_count: post.views.count,
      text: post.text,
    }
  }
}

// ============================================================================
// wall.getLikes / wall.getComments
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiLikes {
  #[serde(default)]
  pub users: Vec<ApiLiker>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLiker {
  pub uid: i64,
}

#[derive(Debug, Deserialize)]
pub struct ApiComment {
  pub from_id: i64,
  #[serde(default)]
  pub text: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_envelope() {
    let body = r#"{"error":{"error_code":6,"error_msg":"Too many requests per second"}}"#;
    let envelope: ApiEnvelope<ApiLikes> = serde_json::from_str(body).unwrap();

    assert!(envelope.response.is_none());
    let error = envelope.error.unwrap();
    assert_eq!(error.error_code, 6);
    assert_eq!(error.error_msg, "Too many requests per second");
  }

  #[test]
  fn test_post_without_views() {
    let body = r#"{"id":10,"date":1700000000,"comments":{"count":2},"likes":{"count":5},"text":"hello"}"#;
    let post: Post = serde_json::from_str::<ApiPost>(body).unwrap().into();

    assert_eq!(post.id, 10);
    assert_eq!(post.comments_count, 2);
    assert_eq!(post.likes_count, 5);
    assert_eq!(post.views_count, 0);
  }

  #[test]
  fn test_user_nested_fields_flatten() {
    let body = r#"{"id":1,"first_name":"Pavel","city":{"id":2,"title":"Saint Petersburg"},"occupation":{"type":"work","name":"VK"},"sex":2}"#;
    let user: UserProfile = serde_json::from_str::<ApiUser>(body).unwrap().into();

    assert_eq!(user.city.as_deref(), Some("Saint Petersburg"));
    assert_eq!(user.occupation.as_deref(), Some("VK"));
    assert!(user.country.is_none());
    assert!(!user.is_closed);
  }

  #[test]
  fn test_likes_without_users_field() {
    let likes: ApiLikes = serde_json::from_str(r#"{"count":0}"#).unwrap();
    assert!(likes.users.is_empty());
  }
}
