//! Handler for `GET /subscribe/{kind}/{uuid}`.
//!
//! `kind` is one of `uri`, `clash` or `v2ray`. The default response is
//! `{"config": "<document>"}`; `?format=raw` serves the document itself and
//! `?format=base64` its base64 encoding, which is what most subscription
//! clients poll. Every response carries a strong `ETag`.

use std::{str::FromStr, sync::Arc};

use axum::{
  extract::{Path, Query, State, rejection::QueryRejection},
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use serde::Deserialize;
use serde_json::json;
use subkit_artifact::ArtifactKind;
use subkit_core::store::SubscriberStore;

use crate::{
  error::{Error, Result},
  etag::{compute_etag, if_none_match},
  registry::Registry,
  users::parse_id,
};

/// Response encoding selected by `?format=`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
  #[default]
  Json,
  Raw,
  Base64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscribeParams {
  #[serde(default)]
  pub format: Format,
}

/// `GET /subscribe/{kind}/{uuid}[?format=json|raw|base64]`
pub async fn handler<S>(
  State(registry): State<Arc<Registry<S>>>,
  Path((kind, raw_id)): Path<(String, String)>,
  query: std::result::Result<Query<SubscribeParams>, QueryRejection>,
  headers: HeaderMap,
) -> Result<Response>
where
  S: SubscriberStore + 'static,
{
  let Query(params) = query.map_err(|rejection| {
    tracing::debug!(%rejection, "rejected subscribe query");
    Error::InvalidInput(rejection.body_text())
  })?;
  let kind = ArtifactKind::from_str(&kind)
    .map_err(|_| Error::NotFound(format!("unknown artifact kind {kind:?}")))?;
  let id = parse_id(&raw_id)?;

  let document = registry.get_artifact(kind, id).await?;

  let (content_type, body) = match params.format {
    Format::Json => ("application/json", json!({ "config": document }).to_string()),
    Format::Raw => (kind.content_type(), document),
    Format::Base64 => ("text/plain; charset=utf-8", B64.encode(document)),
  };

  let etag = compute_etag(body.as_bytes());
  let etag_value = HeaderValue::from_str(&etag)
    .map_err(|e| Error::InvalidSubscriber(format!("unrepresentable etag: {e}")))?;

  if if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
  }

  Ok(
    (
      [
        (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
        (header::ETAG, etag_value),
      ],
      body,
    )
      .into_response(),
  )
}
