//! Clash (rule-based client) YAML documents.
//!
//! One `vless` proxy entry for the subscriber, a `select` group wrapping it,
//! and a short rule list that keeps private ranges direct and sends
//! everything else through the proxy.

use serde::Serialize;
use subkit_core::{
  params::{ConnectionParams, Network},
  subscriber::Subscriber,
};

use crate::{Result, require_id};

/// Name of the proxy group every non-direct rule points at.
pub const PROXY_GROUP: &str = "Proxy";

/// Names Clash resolves to built-in policies or groups.
const BUILTIN_NAMES: &[&str] =
  &["DIRECT", "REJECT", "REJECT-DROP", "PASS", "COMPATIBLE", "GLOBAL"];

const RULES: &[&str] = &[
  "IP-CIDR,127.0.0.0/8,DIRECT,no-resolve",
  "IP-CIDR,10.0.0.0/8,DIRECT,no-resolve",
  "IP-CIDR,172.16.0.0/12,DIRECT,no-resolve",
  "IP-CIDR,192.168.0.0/16,DIRECT,no-resolve",
  "GEOIP,LAN,DIRECT",
];

// ─── Document model ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct ClashConfig<'a> {
  port:         u16,
  socks_port:   u16,
  allow_lan:    bool,
  mode:         &'static str,
  log_level:    &'static str,
  proxies:      Vec<Proxy<'a>>,
  proxy_groups: Vec<ProxyGroup<'a>>,
  rules:        Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct Proxy<'a> {
  name:               &'a str,
  #[serde(rename = "type")]
  kind:               &'static str,
  server:             &'a str,
  port:               u16,
  uuid:               String,
  network:            &'static str,
  udp:                bool,
  tls:                bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  servername:         Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  client_fingerprint: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  flow:               Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  ws_opts:            Option<WsOpts<'a>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  grpc_opts:          Option<GrpcOpts<'a>>,
}

#[derive(Debug, Serialize)]
struct WsOpts<'a> {
  path: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct GrpcOpts<'a> {
  grpc_service_name: &'a str,
}

#[derive(Debug, Serialize)]
struct ProxyGroup<'a> {
  name:    &'static str,
  #[serde(rename = "type")]
  kind:    &'static str,
  proxies: Vec<&'a str>,
}

// ─── Render ──────────────────────────────────────────────────────────────────

/// Render the Clash document for `subscriber`.
pub fn render(subscriber: &Subscriber, params: &ConnectionParams) -> Result<String> {
  let uuid = require_id(subscriber)?;
  let unique = proxy_name(subscriber.display_label(), &uuid);
  let name = unique.as_str();
  let tls = params.security.is_tls();
  let path = params.transport_path();

  let proxy = Proxy {
    name,
    kind: "vless",
    server: &params.host,
    port: params.port,
    uuid,
    network: params.network.as_str(),
    udp: true,
    tls,
    servername: tls.then(|| params.server_name()),
    client_fingerprint: params.fingerprint.as_deref().filter(|_| tls),
    flow: params.flow.as_deref(),
    ws_opts: match (params.network, path) {
      (Network::Ws, Some(path)) => Some(WsOpts { path }),
      _ => None,
    },
    grpc_opts: match (params.network, path) {
      (Network::Grpc, Some(service)) => Some(GrpcOpts { grpc_service_name: service }),
      _ => None,
    },
  };

  let config = ClashConfig {
    port:         7890,
    socks_port:   7891,
    allow_lan:    false,
    mode:         "rule",
    log_level:    "info",
    proxies:      vec![proxy],
    proxy_groups: vec![ProxyGroup {
      name:    PROXY_GROUP,
      kind:    "select",
      proxies: vec![name],
    }],
    rules:        RULES
      .iter()
      .map(|r| (*r).to_owned())
      .chain(std::iter::once(format!("MATCH,{PROXY_GROUP}")))
      .collect(),
  };

  Ok(serde_yaml::to_string(&config)?)
}

/// The proxy entry's name: the label, suffixed with the id's first group
/// when it would shadow the proxy group or a built-in policy.
fn proxy_name(label: &str, uuid: &str) -> String {
  let reserved = label.eq_ignore_ascii_case(PROXY_GROUP)
    || BUILTIN_NAMES.iter().any(|b| label.eq_ignore_ascii_case(b));
  if reserved {
    let short = uuid.split('-').next().unwrap_or(uuid);
    format!("{label}-{short}")
  } else {
    label.to_owned()
  }
}
