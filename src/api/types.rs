// Wire types for the agent's control plane
//
// These match the JSON the daemon's local API speaks. The client hands
// transport-level responses back to callers; these types exist so callers
// (and tests) can decode the bodies they care about.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Definition of a tunnel to create. `name`, `proto`, and `addr` are
/// required and validated client-side before any call is made; the
/// optional fields are left off the wire entirely when unset.
#[derive(Debug, Clone, Serialize)]
pub struct TunnelRequest {
    /// Unique key the daemon uses to address the tunnel.
    pub name: String,
    /// Tunnel protocol, e.g. "http" or "tcp".
    pub proto: String,
    /// Local forwarding target: "host:port" or a bare port.
    pub addr: String,
    /// Reserved subdomain (paid agent feature).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    /// Custom hostname (paid agent feature).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl TunnelRequest {
    pub fn new(
        name: impl Into<String>,
        proto: impl Into<String>,
        addr: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            proto: proto.into(),
            addr: addr.into(),
            subdomain: None,
            hostname: None,
        }
    }

    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }
}

/// One tunnel as the daemon reports it. Read-only projection of server
/// state; only ever built by deserializing a response.
#[derive(Debug, Clone, Deserialize)]
pub struct TunnelDescriptor {
    pub name: String,
    /// Daemon-assigned resource URI, e.g. "/api/tunnels/my-tunnel".
    #[serde(default)]
    pub uri: String,
    pub public_url: String,
    pub proto: String,
    /// Echo of the forwarding configuration the tunnel was created with.
    #[serde(default)]
    pub config: TunnelForwarding,
}

/// Forwarding half of a tunnel descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TunnelForwarding {
    #[serde(default)]
    pub addr: String,
    #[serde(default)]
    pub inspect: bool,
}

/// Envelope returned by the tunnel-listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TunnelList {
    pub tunnels: Vec<TunnelDescriptor>,
    #[serde(default)]
    pub uri: String,
}

/// Envelope returned by the captured-request listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CapturedRequestList {
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub requests: Vec<CapturedRequest>,
}

/// One HTTP transaction the daemon buffered for inspection. Retention and
/// eviction are the daemon's business; this is a snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct CapturedRequest {
    pub id: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub tunnel_name: String,
    #[serde(default)]
    pub remote_addr: String,
    pub start: DateTime<Utc>,
    /// Handling time in nanoseconds.
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub request: Option<CapturedHttpRequest>,
    #[serde(default)]
    pub response: Option<CapturedHttpResponse>,
}

/// Request half of a captured transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct CapturedHttpRequest {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub proto: String,
    #[serde(default)]
    pub headers: HashMap<String, Vec<String>>,
    /// Base64 of the raw bytes on the wire.
    #[serde(default)]
    pub raw: String,
}

/// Response half of a captured transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct CapturedHttpResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub proto: String,
    #[serde(default)]
    pub headers: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub raw: String,
}
