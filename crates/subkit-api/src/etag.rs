//! Strong ETags for subscription responses.
//!
//! Artifacts are deterministic, so a SHA-256 over the response body changes
//! exactly when the subscriber or the connection parameters do.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};

/// Quoted hex SHA-256 of `body`.
pub fn compute_etag(body: &[u8]) -> String {
  format!("\"{}\"", hex::encode(Sha256::digest(body)))
}

/// Whether the request's `If-None-Match` header already names `etag`.
///
/// Weak comparison: a `W/` prefix on a candidate is ignored.
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(str::trim)
    .any(|tag| tag == "*" || tag.strip_prefix("W/").unwrap_or(tag) == etag)
}
