//! HTTP server assembly for subkit.
//!
//! Loads [`ServerConfig`], opens the SQLite store, and mounts the JSON API
//! under `/api` with request tracing and CORS.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{
  Router,
  http::{HeaderValue, Method, header},
  routing::get,
};
use config::{Config, ConfigBuilder, ConfigError, Environment, builder::DefaultState};
use serde::Deserialize;
use subkit_api::Registry;
use subkit_core::{params::ConnectionParams, store::SubscriberStore};
use subkit_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

/// `store_path` value that selects an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration.
///
/// Layered lowest to highest: built-in defaults, the TOML file, then
/// `SUBKIT_*` environment variables (`__` separates nested keys, e.g.
/// `SUBKIT_CONNECTION__HOST`).
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub listen_host:  String,
  pub listen_port:  u16,
  pub store_path:   PathBuf,
  #[serde(default)]
  pub cors_origins: Vec<String>,
  pub connection:   ConnectionParams,
}

impl ServerConfig {
  /// Load from `path` (optional on disk) plus the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(
      Config::builder().add_source(config::File::from(path).required(false)),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder
      .set_default("listen_host", "0.0.0.0")?
      .set_default("listen_port", 8000)?
      .set_default("store_path", "subkit.db")?
      .add_source(
        Environment::with_prefix("SUBKIT")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins"),
      )
      .build()?
      .try_deserialize()
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The complete application router: `/healthz` plus the API under `/api`.
pub fn router<S>(registry: Arc<Registry<S>>, cors: CorsLayer) -> Router
where
  S: SubscriberStore + 'static,
{
  Router::new()
    .route("/healthz", get(|| async { "ok" }))
    .nest("/api", subkit_api::api_router(registry))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
}

/// CORS policy for `origins`; empty or `"*"` allows any origin.
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
  let allow = if origins.is_empty() || origins.iter().any(|o| o == "*") {
    AllowOrigin::any()
  } else {
    let values = origins
      .iter()
      .map(|o| {
        HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin {o:?}"))
      })
      .collect::<anyhow::Result<Vec<_>>>()?;
    AllowOrigin::list(values)
  };

  Ok(
    CorsLayer::new()
      .allow_origin(allow)
      .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
      .allow_headers([header::CONTENT_TYPE, header::IF_NONE_MATCH])
      .expose_headers([header::ETAG]),
  )
}

// ─── Serve ────────────────────────────────────────────────────────────────────

/// Open the store described by `config` and serve until a shutdown signal.
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
  config
    .connection
    .validate()
    .context("invalid [connection] settings")?;
  let cors = cors_layer(&config.cors_origins)?;

  let opened = if config.store_path.as_os_str() == IN_MEMORY {
    tracing::warn!("using an in-memory store; subscribers will not survive a restart");
    SqliteStore::open_in_memory().await
  } else {
    let path = expand_tilde(&config.store_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)
        .with_context(|| format!("failed to create {parent:?}"))?;
    }
    tracing::info!(path = %path.display(), "opening store");
    SqliteStore::open(&path).await
  };
  let store = opened.context("failed to open store")?;

  let registry = Arc::new(Registry::new(Arc::new(store), config.connection.clone()));
  let app = router(registry, cors);

  let address = format!("{}:{}", config.listen_host, config.listen_port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!(
    "Listening on http://{address} (artifacts for {}:{})",
    config.connection.host,
    config.connection.port
  );

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  tracing::info!("server shut down");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl+C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to install SIGTERM handler");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    () = ctrl_c => tracing::info!("received Ctrl+C"),
    () = terminate => tracing::info!("received SIGTERM"),
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
