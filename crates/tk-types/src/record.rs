//! Canonical server descriptor.
//!
//! A [`ServerRecord`] is the protocol-agnostic superset of everything a
//! share-link, subscription entry or manual form can carry. Fields that do
//! not apply to a given protocol stay `None`; the record is value data and
//! is only mutated through the store (favorite toggle, latency update,
//! last-used timestamp).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Sentinel country code for "could not be determined".
pub const UNKNOWN_COUNTRY: &str = "UN";

/// Latency sentinel: never measured or all probes failed.
pub const LATENCY_UNKNOWN: i64 = -1;

/// Closed set of supported proxy/tunnel protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Vmess,
    Vless,
    Trojan,
    Shadowsocks,
    Ssh,
    Udp,
}

impl Protocol {
    /// Share-link scheme prefix, without `://`. UDP has no link format.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Vmess => "vmess",
            Self::Vless => "vless",
            Self::Trojan => "trojan",
            Self::Shadowsocks => "ss",
            Self::Ssh => "ssh",
            Self::Udp => "udp",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vmess => "vmess",
            Self::Vless => "vless",
            Self::Trojan => "trojan",
            Self::Shadowsocks => "shadowsocks",
            Self::Ssh => "ssh",
            Self::Udp => "udp",
        }
    }

    /// Protocols dialed through the external proxy engine (as opposed to
    /// the SSH tunnel or UDP relay collaborators).
    pub fn uses_engine(&self) -> bool {
        matches!(
            self,
            Self::Vmess | Self::Vless | Self::Trojan | Self::Shadowsocks
        )
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream transport carried under the proxy protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Tcp,
    Ws,
    Kcp,
    Http,
    Quic,
    Grpc,
    H2,
}

impl TransportKind {
    /// Parse a transport name. Unknown values normalize to TCP; subscription
    /// sources are untrusted and frequently send garbage, so this never
    /// rejects.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "ws" | "websocket" => Self::Ws,
            "kcp" | "mkcp" => Self::Kcp,
            "http" => Self::Http,
            "quic" => Self::Quic,
            "grpc" | "gun" => Self::Grpc,
            "h2" | "http2" => Self::H2,
            _ => Self::Tcp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Ws => "ws",
            Self::Kcp => "kcp",
            Self::Http => "http",
            Self::Quic => "quic",
            Self::Grpc => "grpc",
            Self::H2 => "h2",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical normalized server descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    /// Opaque stable identifier, assigned at creation, never rewritten.
    pub id: String,
    /// Display label, from the URI fragment or user input.
    #[serde(default)]
    pub name: String,
    pub address: String,
    pub port: u16,
    pub protocol: Protocol,
    /// ISO alpha-2 or the "UN" sentinel. Heuristic, never authoritative.
    #[serde(default = "default_country")]
    pub country_code: String,

    // Credentials. Which ones are mandatory depends on `protocol`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub alter_id: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// VMess user security / cipher ("auto" when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_private_key: Option<String>,

    // Transport.
    #[serde(default)]
    pub network: TransportKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Shadowsocks SIP003 plugin string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,

    // Security.
    #[serde(default)]
    pub tls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpn: Option<String>,
    /// XTLS flow tag. Absent means no flow control; presence disables mux.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reality_short_id: Option<String>,

    // Telemetry / UX.
    #[serde(default = "default_latency")]
    pub latency_ms: i64,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub last_used_at: i64,
}

fn default_country() -> String {
    UNKNOWN_COUNTRY.to_string()
}

fn default_latency() -> i64 {
    LATENCY_UNKNOWN
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl ServerRecord {
    /// Create a blank record for the given endpoint. Generates the stable id
    /// and the creation timestamp; everything else starts at its default.
    pub fn new(protocol: Protocol, address: impl Into<String>, port: u16) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: String::new(),
            address: address.into(),
            port,
            protocol,
            country_code: default_country(),
            uuid: None,
            alter_id: 0,
            password: None,
            method: None,
            security: None,
            ssh_user: None,
            ssh_password: None,
            ssh_private_key: None,
            network: TransportKind::Tcp,
            header_type: None,
            host: None,
            path: None,
            plugin: None,
            tls: false,
            sni: None,
            fingerprint: None,
            alpn: None,
            flow: None,
            reality_public_key: None,
            reality_short_id: None,
            latency_ms: LATENCY_UNKNOWN,
            is_favorite: false,
            created_at: now_millis(),
            last_used_at: 0,
        }
    }

    /// Display name, falling back to `host:port` when unnamed.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("{}:{}", self.address, self.port)
        } else {
            self.name.clone()
        }
    }

    /// Whether the record uses Reality TLS camouflage.
    pub fn has_reality(&self) -> bool {
        self.reality_public_key
            .as_deref()
            .is_some_and(|k| !k.is_empty())
    }

    /// Whether the record carries a non-empty XTLS flow tag.
    pub fn has_flow(&self) -> bool {
        self.flow.as_deref().is_some_and(|f| !f.is_empty())
    }

    /// Effective SNI: the explicit value, the transport host header, or the
    /// server address, in that order.
    pub fn effective_sni(&self) -> &str {
        self.sni
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.host.as_deref().filter(|h| !h.is_empty()))
            .unwrap_or(&self.address)
    }

    pub fn touch_last_used(&mut self) {
        self.last_used_at = now_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_unknown_normalizes_to_tcp() {
        assert_eq!(TransportKind::from_str_lossy("ws"), TransportKind::Ws);
        assert_eq!(TransportKind::from_str_lossy("GRPC"), TransportKind::Grpc);
        assert_eq!(TransportKind::from_str_lossy("banana"), TransportKind::Tcp);
        assert_eq!(TransportKind::from_str_lossy(""), TransportKind::Tcp);
    }

    #[test]
    fn record_ids_are_unique() {
        let a = ServerRecord::new(Protocol::Vmess, "a.example", 443);
        let b = ServerRecord::new(Protocol::Vmess, "a.example", 443);
        assert_ne!(a.id, b.id);
        assert!(a.created_at > 0);
        assert_eq!(a.latency_ms, LATENCY_UNKNOWN);
        assert_eq!(a.country_code, UNKNOWN_COUNTRY);
    }

    #[test]
    fn effective_sni_fallback_chain() {
        let mut r = ServerRecord::new(Protocol::Vless, "1.2.3.4", 443);
        assert_eq!(r.effective_sni(), "1.2.3.4");
        r.host = Some("cdn.example.com".into());
        assert_eq!(r.effective_sni(), "cdn.example.com");
        r.sni = Some("sni.example.com".into());
        assert_eq!(r.effective_sni(), "sni.example.com");
    }

    #[test]
    fn record_roundtrips_through_json() {
        let mut r = ServerRecord::new(Protocol::Trojan, "t.example", 443);
        r.password = Some("secret".into());
        r.tls = true;
        let json = serde_json::to_string(&r).unwrap();
        let back: ServerRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
