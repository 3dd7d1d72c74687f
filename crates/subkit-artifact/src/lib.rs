//! Subscription artifact generators for subkit.
//!
//! Renders a [`Subscriber`] plus the deployment's [`ConnectionParams`] into
//! documents that proxy clients consume. Pure synchronous; no HTTP or
//! database dependencies, and no state: the same inputs always render to
//! byte-identical output, so clients polling a subscription URL only see a
//! change when the subscriber or the parameters change.
//!
//! # Quick start
//!
//! ```no_run
//! use subkit_artifact::{ArtifactKind, render};
//! # fn demo(
//! #   subscriber: &subkit_core::subscriber::Subscriber,
//! #   params: &subkit_core::params::ConnectionParams,
//! # ) -> subkit_artifact::Result<()> {
//! let link = render(ArtifactKind::Uri, subscriber, params)?;
//! println!("{link}");
//! # Ok(())
//! # }
//! ```

pub mod clash;
pub mod error;
pub mod uri;
pub mod v2ray;

pub use error::{Error, Result};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantArray};
use subkit_core::{params::ConnectionParams, subscriber::Subscriber};

// ─── ArtifactKind ────────────────────────────────────────────────────────────

/// The closed set of artifacts a subscriber can be rendered into.
///
/// The serialised names are the path segments used by the HTTP API.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Display,
  EnumString,
  VariantArray,
  Serialize,
  Deserialize,
)]
pub enum ArtifactKind {
  /// A single `vless://` connection link.
  #[serde(rename = "uri")]
  #[strum(serialize = "uri")]
  Uri,
  /// A Clash (rule-based client) YAML document.
  #[serde(rename = "clash")]
  #[strum(serialize = "clash")]
  RuleBased,
  /// A V2Ray/Xray (generic client) JSON document.
  #[serde(rename = "v2ray")]
  #[strum(serialize = "v2ray")]
  Generic,
}

impl ArtifactKind {
  /// Every kind, in declaration order.
  pub fn all() -> &'static [ArtifactKind] { Self::VARIANTS }

  /// MIME type for serving the rendered document directly.
  pub fn content_type(self) -> &'static str {
    match self {
      Self::Uri => "text/plain; charset=utf-8",
      Self::RuleBased => "text/yaml; charset=utf-8",
      Self::Generic => "application/json",
    }
  }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Render `subscriber` as the artifact named by `kind`.
pub fn render(
  kind: ArtifactKind,
  subscriber: &Subscriber,
  params: &ConnectionParams,
) -> Result<String> {
  match kind {
    ArtifactKind::Uri => uri::render(subscriber, params),
    ArtifactKind::RuleBased => clash::render(subscriber, params),
    ArtifactKind::Generic => v2ray::render(subscriber, params),
  }
}

/// A subscriber without an id (the nil UUID) cannot be rendered.
pub(crate) fn require_id(subscriber: &Subscriber) -> Result<String> {
  if subscriber.id.is_nil() {
    return Err(Error::InvalidSubscriber("subscriber has no id".into()));
  }
  Ok(subscriber.id.hyphenated().to_string())
}
