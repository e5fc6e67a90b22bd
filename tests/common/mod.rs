#![allow(dead_code)]

use serde_json::{json, Value};
use vk_harvest::config::Config;
use vk_harvest::vk::CachedVkClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";

/// Config pointed at the mock server, with no pause between retries.
pub fn config_for(server: &MockServer) -> Config {
  let mut config = Config::default();
  config.api.base_url = server.uri();
  config.retry.backoff_secs = 0;
  config
}

pub fn client_for(server: &MockServer) -> CachedVkClient {
  CachedVkClient::with_token(&config_for(server), TOKEN.to_string()).unwrap()
}

pub fn ok(response: Value) -> ResponseTemplate {
  ResponseTemplate::new(200).set_body_json(json!({ "response": response }))
}

pub fn api_error(code: i64, msg: &str) -> ResponseTemplate {
  ResponseTemplate::new(200).set_body_json(json!({
    "error": { "error_code": code, "error_msg": msg }
  }))
}

/// Empty pages for any likes/comments request not matched by a more specific mock.
pub async fn mount_empty_engagement(server: &MockServer) {
  Mock::given(method("GET"))
    .and(path("/wall.getLikes"))
    .respond_with(ok(json!({ "count": 0, "users": [] })))
    .with_priority(10)
    .mount(server)
    .await;
  Mock::given(method("GET"))
    .and(path("/wall.getComments"))
    .respond_with(ok(json!({ "count": 0, "items": [] })))
    .with_priority(10)
    .mount(server)
    .await;
}
