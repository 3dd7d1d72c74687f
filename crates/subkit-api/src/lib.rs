//! JSON REST API for subkit.
//!
//! Exposes an axum [`Router`] backed by a [`Registry`] over any
//! [`subkit_core::store::SubscriberStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", subkit_api::api_router(registry.clone()))
//! ```

pub mod error;
pub mod etag;
pub mod registry;
pub mod subscribe;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use subkit_core::store::SubscriberStore;

pub use error::Error;
pub use registry::Registry;

/// Build a fully-materialised API router for `registry`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(registry: Arc<Registry<S>>) -> Router<()>
where
  S: SubscriberStore + 'static,
{
  Router::new()
    // Subscribers
    .route("/users", get(users::list::<S>))
    .route("/user", post(users::create::<S>))
    .route("/user/{uuid}", get(users::get_one::<S>).delete(users::delete_one::<S>))
    // Artifacts
    .route("/subscribe/{kind}/{uuid}", get(subscribe::handler::<S>))
    .with_state(registry)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use serde_json::Value;
  use subkit_core::{memory::MemoryStore, params::ConnectionParams};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use super::*;

  fn app() -> Router {
    let registry = Registry::new(
      Arc::new(MemoryStore::new()),
      ConnectionParams::new("proxy.example.com"),
    );
    Router::new().nest("/api", api_router(Arc::new(registry)))
  }

  async fn send(
    app:     &Router,
    method:  &str,
    uri:     &str,
    headers: Vec<(header::HeaderName, &str)>,
    body:    &str,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    app.clone().oneshot(req).await.unwrap()
  }

  async fn body_string(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_string(resp).await).unwrap()
  }

  async fn create(app: &Router, body: &str) -> Response {
    send(
      app,
      "POST",
      "/api/user",
      vec![(header::CONTENT_TYPE, "application/json")],
      body,
    )
    .await
  }

  async fn create_uuid(app: &Router, remark: &str) -> String {
    let resp = create(app, &serde_json::json!({ "remark": remark }).to_string()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["uuid"].as_str().unwrap().to_owned()
  }

  // ── Subscribers ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn alice_end_to_end() {
    let app = app();
    let u1 = create_uuid(&app, "alice").await;

    let resp = send(&app, "GET", "/api/users", vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let users = body_json(resp).await;
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["uuid"], u1.as_str());
    assert_eq!(users[0]["remark"], "alice");

    let resp = send(&app, "GET", &format!("/api/subscribe/uri/{u1}"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let link = body_json(resp).await["config"].as_str().unwrap().to_owned();
    assert!(link.starts_with(&format!("vless://{u1}@proxy.example.com:443")), "{link}");

    let resp = send(&app, "DELETE", &format!("/api/user/{u1}"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "success");

    let resp = send(&app, "GET", &format!("/api/subscribe/uri/{u1}"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn get_one_returns_remark() {
    let app = app();
    let id = create_uuid(&app, "bob").await;
    let resp = send(&app, "GET", &format!("/api/user/{id}"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["uuid"], id.as_str());
    assert_eq!(json["remark"], "bob");
    assert!(json["created_at"].is_string());
  }

  #[tokio::test]
  async fn missing_remark_is_stored_empty() {
    let app = app();
    for body in ["{}", r#"{"remark":null}"#] {
      let resp = create(&app, body).await;
      assert_eq!(resp.status(), StatusCode::OK);
      assert_eq!(body_json(resp).await["remark"], "");
    }
  }

  #[tokio::test]
  async fn malformed_create_body_is_400() {
    let app = app();
    for body in ["{not json", r#"{"remark":5}"#, r#""alice""#] {
      let resp = create(&app, body).await;
      assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body {body}");
      assert!(body_json(resp).await["error"].is_string());
    }

    let resp = send(&app, "POST", "/api/user", vec![], r#"{"remark":"x"}"#).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "missing content type");

    let resp = send(&app, "GET", "/api/users", vec![], "").await;
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn unknown_and_malformed_ids_are_404() {
    let app = app();
    let missing = Uuid::new_v4();
    for uri in [
      format!("/api/user/{missing}"),
      "/api/user/not-a-uuid".to_owned(),
      format!("/api/subscribe/clash/{missing}"),
      "/api/subscribe/v2ray/not-a-uuid".to_owned(),
    ] {
      let resp = send(&app, "GET", &uri, vec![], "").await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let resp = send(&app, "DELETE", &format!("/api/user/{missing}"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn second_delete_is_404() {
    let app = app();
    let id = create_uuid(&app, "carol").await;
    let first = send(&app, "DELETE", &format!("/api/user/{id}"), vec![], "").await;
    let second = send(&app, "DELETE", &format!("/api/user/{id}"), vec![], "").await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
  }

  // ── Subscriptions ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn clash_and_v2ray_configs_embed_uuid() {
    let app = app();
    let id = create_uuid(&app, "dave").await;

    let resp = send(&app, "GET", &format!("/api/subscribe/clash/{id}"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let yaml = body_json(resp).await["config"].as_str().unwrap().to_owned();
    let tree: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(tree["proxies"][0]["uuid"].as_str(), Some(id.as_str()));

    let resp = send(&app, "GET", &format!("/api/subscribe/v2ray/{id}"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc = body_json(resp).await["config"].as_str().unwrap().to_owned();
    let tree: Value = serde_json::from_str(&doc).unwrap();
    assert_eq!(tree["outbounds"][0]["settings"]["vnext"][0]["users"][0]["id"], id.as_str());
  }

  #[tokio::test]
  async fn unknown_kind_is_404() {
    let app = app();
    let id = create_uuid(&app, "erin").await;
    let resp = send(&app, "GET", &format!("/api/subscribe/surge/{id}"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn raw_and_base64_formats() {
    let app = app();
    let id = create_uuid(&app, "frank").await;

    let resp = send(&app, "GET", &format!("/api/subscribe/clash/{id}?format=raw"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      resp.headers().get(header::CONTENT_TYPE).unwrap(),
      "text/yaml; charset=utf-8"
    );
    assert!(body_string(resp).await.contains(&id));

    let resp = send(&app, "GET", &format!("/api/subscribe/uri/{id}?format=base64"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let decoded = B64.decode(body_string(resp).await).unwrap();
    let link = String::from_utf8(decoded).unwrap();
    assert!(link.starts_with(&format!("vless://{id}@")), "{link}");

    let resp = send(&app, "GET", &format!("/api/subscribe/uri/{id}?format=xml"), vec![], "").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
      resp.headers().get(header::CONTENT_TYPE).unwrap(),
      "application/json"
    );
    assert!(body_json(resp).await["error"].as_str().unwrap().contains("format"));
  }

  #[tokio::test]
  async fn etag_is_stable_and_honours_if_none_match() {
    let app = app();
    let id = create_uuid(&app, "grace").await;
    let uri = format!("/api/subscribe/v2ray/{id}");

    let first = send(&app, "GET", &uri, vec![], "").await;
    let etag = first.headers().get(header::ETAG).unwrap().to_str().unwrap().to_owned();
    let first_body = body_string(first).await;

    let second = send(&app, "GET", &uri, vec![], "").await;
    assert_eq!(second.headers().get(header::ETAG).unwrap(), etag.as_str());
    assert_eq!(body_string(second).await, first_body);

    let cached = send(&app, "GET", &uri, vec![(header::IF_NONE_MATCH, etag.as_str())], "").await;
    assert_eq!(cached.status(), StatusCode::NOT_MODIFIED);
    assert!(body_string(cached).await.is_empty());
  }
}
