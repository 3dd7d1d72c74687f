//! V2Ray/Xray (generic client) JSON documents.
//!
//! Local socks and http inbounds, a `proxy` vless outbound built from the
//! subscriber and connection parameters, plus `direct` and `block`
//! outbounds used by the routing rules.

use serde::Serialize;
use subkit_core::{
  params::{ConnectionParams, Network},
  subscriber::Subscriber,
};

use crate::{Result, require_id};

// ─── Document model ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct V2rayConfig<'a> {
  log:       Log,
  inbounds:  Vec<Inbound>,
  outbounds: Vec<Outbound<'a>>,
  routing:   Routing,
}

#[derive(Debug, Serialize)]
struct Log {
  loglevel: &'static str,
}

#[derive(Debug, Serialize)]
struct Inbound {
  tag:      &'static str,
  port:     u16,
  listen:   &'static str,
  protocol: &'static str,
  settings: InboundSettings,
}

#[derive(Debug, Serialize)]
struct InboundSettings {
  udp: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Outbound<'a> {
  tag:             &'static str,
  protocol:        &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  settings:        Option<VlessSettings<'a>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  stream_settings: Option<StreamSettings<'a>>,
}

#[derive(Debug, Serialize)]
struct VlessSettings<'a> {
  vnext: Vec<VlessServer<'a>>,
}

#[derive(Debug, Serialize)]
struct VlessServer<'a> {
  address: &'a str,
  port:    u16,
  users:   Vec<VlessUser<'a>>,
}

#[derive(Debug, Serialize)]
struct VlessUser<'a> {
  id:         String,
  encryption: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  flow:       Option<&'a str>,
  /// Xray uses `email` as the per-user stats key; the label fills it.
  email:      &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamSettings<'a> {
  network:       &'static str,
  security:      &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  tls_settings:  Option<TlsSettings<'a>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  ws_settings:   Option<WsSettings<'a>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  grpc_settings: Option<GrpcSettings<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TlsSettings<'a> {
  server_name: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  fingerprint: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct WsSettings<'a> {
  path: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GrpcSettings<'a> {
  service_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Routing {
  domain_strategy: &'static str,
  rules:           Vec<RoutingRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoutingRule {
  #[serde(rename = "type")]
  kind:         &'static str,
  ip:           Vec<&'static str>,
  outbound_tag: &'static str,
}

// ─── Render ──────────────────────────────────────────────────────────────────

/// Render the V2Ray document for `subscriber`.
pub fn render(subscriber: &Subscriber, params: &ConnectionParams) -> Result<String> {
  let id = require_id(subscriber)?;
  let tls = params.security.is_tls();
  let path = params.transport_path();

  let proxy = Outbound {
    tag:             "proxy",
    protocol:        "vless",
    settings:        Some(VlessSettings {
      vnext: vec![VlessServer {
        address: &params.host,
        port:    params.port,
        users:   vec![VlessUser {
          id,
          encryption: "none",
          flow: params.flow.as_deref(),
          email: subscriber.display_label(),
        }],
      }],
    }),
    stream_settings: Some(StreamSettings {
      network:       params.network.as_str(),
      security:      params.security.as_str(),
      tls_settings:  tls.then(|| TlsSettings {
        server_name: params.server_name(),
        fingerprint: params.fingerprint.as_deref(),
      }),
      ws_settings:   match (params.network, path) {
        (Network::Ws, Some(path)) => Some(WsSettings { path }),
        _ => None,
      },
      grpc_settings: match (params.network, path) {
        (Network::Grpc, Some(service)) => Some(GrpcSettings { service_name: service }),
        _ => None,
      },
    }),
  };

  let config = V2rayConfig {
    log:       Log { loglevel: "warning" },
    inbounds:  vec![
      local_inbound("socks", 10808, "socks"),
      local_inbound("http", 10809, "http"),
    ],
    outbounds: vec![
      proxy,
      bare_outbound("direct", "freedom"),
      bare_outbound("block", "blackhole"),
    ],
    routing:   Routing {
      domain_strategy: "IPIfNonMatch",
      rules:           vec![RoutingRule {
        kind:         "field",
        ip:           vec!["geoip:private"],
        outbound_tag: "direct",
      }],
    },
  };

  Ok(serde_json::to_string_pretty(&config)?)
}

fn local_inbound(tag: &'static str, port: u16, protocol: &'static str) -> Inbound {
  Inbound {
    tag,
    port,
    listen: "127.0.0.1",
    protocol,
    settings: InboundSettings { udp: true },
  }
}

fn bare_outbound(tag: &'static str, protocol: &'static str) -> Outbound<'static> {
  Outbound { tag, protocol, settings: None, stream_settings: None }
}
