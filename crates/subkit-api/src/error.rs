//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Every failure the registry can report to a caller.
#[derive(Debug, Error)]
pub enum Error {
  /// The identifier has no live record.
  #[error("not found: {0}")]
  NotFound(String),

  /// The request payload could not be understood.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// A stored record could not be rendered. Never expected for records that
  /// went through the store's `create`.
  #[error("invalid subscriber: {0}")]
  InvalidSubscriber(String),

  /// The backing store failed; the caller may retry.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  pub fn status(&self) -> StatusCode {
    match self {
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
      Error::InvalidSubscriber(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    // Internal failures are logged where they occur; callers only see a
    // generic message.
    let message = match &self {
      Error::NotFound(m) | Error::InvalidInput(m) => m.clone(),
      Error::InvalidSubscriber(_) => "internal error".to_owned(),
      Error::StoreUnavailable(_) => "store unavailable".to_owned(),
    };
    (self.status(), Json(json!({ "error": message }))).into_response()
  }
}
