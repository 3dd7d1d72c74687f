//! Error types for `subkit-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid connection parameters: {0}")]
  InvalidParams(String),

  #[error("allocator produced no fresh id in {0} draws")]
  AllocatorExhausted(usize),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
