//! `vless://` connection links.
//!
//! Layout: `vless://{id}@{host}:{port}?{query}#{label}`. Query pairs appear
//! in a fixed order and are form-encoded; the fragment carries the
//! percent-encoded display label.

use subkit_core::{
  params::{ConnectionParams, Network},
  subscriber::Subscriber,
};
use url::Url;

use crate::{Result, require_id};

/// Render the connection link for `subscriber`.
pub fn render(subscriber: &Subscriber, params: &ConnectionParams) -> Result<String> {
  let id = require_id(subscriber)?;

  let mut url = Url::parse(&format!(
    "vless://{id}@{}:{}",
    params.authority_host(),
    params.port
  ))?;

  {
    let mut query = url.query_pairs_mut();
    query
      .append_pair("encryption", "none")
      .append_pair("security", params.security.as_str())
      .append_pair("type", params.network.as_str());

    match (params.network, params.transport_path()) {
      (Network::Ws, Some(path)) => {
        query.append_pair("path", path);
      }
      (Network::Grpc, Some(path)) => {
        query.append_pair("serviceName", path);
      }
      _ => {}
    }
    if params.security.is_tls() {
      query.append_pair("sni", params.server_name());
      if let Some(fp) = &params.fingerprint {
        query.append_pair("fp", fp);
      }
    }
    if let Some(flow) = &params.flow {
      query.append_pair("flow", flow);
    }
  }

  url.set_fragment(Some(&urlencoding::encode(subscriber.display_label())));
  Ok(url.into())
}
