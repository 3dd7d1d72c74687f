//! Connection parameters shared by every generated artifact.
//!
//! Loaded once from deployment configuration and read-only afterwards.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

// ─── Enums ───────────────────────────────────────────────────────────────────

/// The transport carried between client and server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
  #[default]
  Tcp,
  Ws,
  Grpc,
}

impl Network {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Tcp => "tcp",
      Self::Ws => "ws",
      Self::Grpc => "grpc",
    }
  }
}

/// Transport-layer security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
  None,
  #[default]
  Tls,
}

impl Security {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::None => "none",
      Self::Tls => "tls",
    }
  }

  pub fn is_tls(self) -> bool { matches!(self, Self::Tls) }
}

// ─── ConnectionParams ────────────────────────────────────────────────────────

fn default_port() -> u16 { 443 }

/// WebSocket path used when `network = "ws"` and no `path` is configured.
pub const DEFAULT_WS_PATH: &str = "/";

/// Deployment-wide connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
  /// Public host or domain clients connect to. No default is assumed.
  pub host:        String,
  #[serde(default = "default_port")]
  pub port:        u16,
  #[serde(default)]
  pub network:     Network,
  #[serde(default)]
  pub security:    Security,
  /// WebSocket path (`ws`) or gRPC service name (`grpc`).
  #[serde(default)]
  pub path:        Option<String>,
  /// TLS server name; artifacts fall back to `host` when unset.
  #[serde(default)]
  pub sni:         Option<String>,
  /// VLESS flow control, e.g. `xtls-rprx-vision`.
  #[serde(default)]
  pub flow:        Option<String>,
  /// TLS client fingerprint, e.g. `chrome`.
  #[serde(default)]
  pub fingerprint: Option<String>,
}

impl ConnectionParams {
  /// Minimal parameters for `host`, everything else at its default.
  pub fn new(host: impl Into<String>) -> Self {
    Self {
      host:        host.into(),
      port:        default_port(),
      network:     Network::default(),
      security:    Security::default(),
      path:        None,
      sni:         None,
      flow:        None,
      fingerprint: None,
    }
  }

  /// The server name presented during the TLS handshake.
  pub fn server_name(&self) -> &str {
    self.sni.as_deref().unwrap_or(&self.host)
  }

  /// The transport path: the WebSocket path (never empty, see
  /// [`DEFAULT_WS_PATH`]) or the gRPC service name. `None` for plain tcp.
  pub fn transport_path(&self) -> Option<&str> {
    match self.network {
      Network::Tcp => None,
      Network::Ws => Some(self.path.as_deref().unwrap_or(DEFAULT_WS_PATH)),
      Network::Grpc => self.path.as_deref(),
    }
  }

  /// `host` as written inside a URL authority; bare IPv6 literals are
  /// bracketed.
  pub fn authority_host(&self) -> Cow<'_, str> {
    if self.host.contains(':') && !self.host.starts_with('[') {
      Cow::Owned(format!("[{}]", self.host))
    } else {
      Cow::Borrowed(&self.host)
    }
  }

  /// Reject values that would render into a broken artifact.
  pub fn validate(&self) -> Result<()> {
    if self.host.is_empty() {
      return Err(Error::InvalidParams("host must not be empty".into()));
    }
    if self
      .host
      .chars()
      .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@'))
    {
      return Err(Error::InvalidParams(format!(
        "host {:?} contains characters not allowed in a host",
        self.host
      )));
    }
    if self.port == 0 {
      return Err(Error::InvalidParams("port must be non-zero".into()));
    }
    // Same parse the `vless://` link goes through.
    let authority = format!("vless://{}:{}", self.authority_host(), self.port);
    match Url::parse(&authority) {
      Ok(url) if url.host_str().is_some() => Ok(()),
      Ok(_) => Err(Error::InvalidParams(format!("host {:?} is empty", self.host))),
      Err(e) => Err(Error::InvalidParams(format!(
        "host {:?} is not a valid URL host: {e}",
        self.host
      ))),
    }
  }
}
