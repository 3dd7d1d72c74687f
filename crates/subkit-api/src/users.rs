//! Handlers for subscriber endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/users` | All subscribers, insertion order |
//! | `POST`   | `/user` | Body: `{"remark":"..."}`; `remark` optional |
//! | `GET`    | `/user/{uuid}` | 404 if not found |
//! | `DELETE` | `/user/{uuid}` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use subkit_core::{store::SubscriberStore, subscriber::Subscriber};
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  registry::Registry,
};

// ─── Wire types ───────────────────────────────────────────────────────────────

/// A subscriber as the API exposes it: `uuid` is the id, `remark` the label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberBody {
  pub uuid:       Uuid,
  pub remark:     String,
  pub created_at: DateTime<Utc>,
}

impl From<Subscriber> for SubscriberBody {
  fn from(s: Subscriber) -> Self {
    SubscriberBody {
      uuid:       s.id,
      remark:     s.label,
      created_at: s.created_at,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub remark: Option<String>,
}

/// Parse a `{uuid}` path segment. Anything that is not a UUID cannot name a
/// live subscriber, so it is reported as not found.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
  Uuid::parse_str(raw).map_err(|_| Error::NotFound(format!("subscriber {raw} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list<S>(
  State(registry): State<Arc<Registry<S>>>,
) -> Result<Json<Vec<SubscriberBody>>>
where
  S: SubscriberStore + 'static,
{
  let subscribers = registry.list_subscribers().await?;
  Ok(Json(subscribers.into_iter().map(SubscriberBody::from).collect()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /user`, body: `{"remark":"..."}`
pub async fn create<S>(
  State(registry): State<Arc<Registry<S>>>,
  body: std::result::Result<Json<CreateBody>, JsonRejection>,
) -> Result<Json<SubscriberBody>>
where
  S: SubscriberStore + 'static,
{
  let Json(body) = body.map_err(|rejection| {
    tracing::debug!(%rejection, "rejected create payload");
    Error::InvalidInput(rejection.body_text())
  })?;

  let subscriber = registry
    .add_subscriber(body.remark.unwrap_or_default())
    .await?;
  Ok(Json(subscriber.into()))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /user/{uuid}`
pub async fn get_one<S>(
  State(registry): State<Arc<Registry<S>>>,
  Path(raw): Path<String>,
) -> Result<Json<SubscriberBody>>
where
  S: SubscriberStore + 'static,
{
  let subscriber = registry.get_subscriber(parse_id(&raw)?).await?;
  Ok(Json(subscriber.into()))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /user/{uuid}`
pub async fn delete_one<S>(
  State(registry): State<Arc<Registry<S>>>,
  Path(raw): Path<String>,
) -> Result<Json<Value>>
where
  S: SubscriberStore + 'static,
{
  registry.delete_subscriber(parse_id(&raw)?).await?;
  Ok(Json(json!({ "status": "success" })))
}
