//! Error types for the artifact generators.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid subscriber: {0}")]
  InvalidSubscriber(String),

  #[error("invalid connection URI: {0}")]
  Url(#[from] url::ParseError),

  #[error("YAML error: {0}")]
  Yaml(#[from] serde_yaml::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
