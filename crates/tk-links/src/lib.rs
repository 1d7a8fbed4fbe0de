//! Share-link codecs: one parser/serializer pair per protocol family.
//!
//! Parsing is pure and total over untrusted input: every malformed link is a
//! [`LinkError`] value, never a panic, and one bad entry never aborts a
//! subscription batch. Serialization is the faithful inverse for every
//! materially significant field; display-only fields may be normalized.
//!
//! Codecs are selected by case-insensitive scheme prefix in a fixed priority
//! order. There is no content sniffing across protocols.

pub mod base64x;
pub mod http;
pub mod query;
pub mod shadowsocks;
pub mod ssh;
pub mod subscription;
pub mod trojan;
pub mod vless;
pub mod vmess;

use thiserror::Error;
use tk_types::{Protocol, ServerRecord};

/// Malformed or unsupported share-link. Always recoverable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("unsupported scheme")]
    UnsupportedScheme,

    #[error("malformed link: {0}")]
    Malformed(String),

    #[error("invalid base64 payload")]
    Base64,

    #[error("missing mandatory credential for {0}")]
    MissingCredential(&'static str),

    #[error("port missing, non-numeric or out of range")]
    InvalidPort,

    #[error("empty host")]
    EmptyHost,
}

impl LinkError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Parse any supported share-link into a normalized record.
///
/// Codecs are tried strictly by prefix match, in fixed priority order.
pub fn parse_uri(uri: &str) -> Result<ServerRecord, LinkError> {
    let trimmed = uri.trim();
    if has_scheme(trimmed, "vmess") {
        vmess::parse(trimmed)
    } else if has_scheme(trimmed, "vless") {
        vless::parse(trimmed)
    } else if has_scheme(trimmed, "trojan") {
        trojan::parse(trimmed)
    } else if has_scheme(trimmed, "ss") {
        shadowsocks::parse(trimmed)
    } else if has_scheme(trimmed, "ssh") {
        ssh::parse(trimmed)
    } else {
        Err(LinkError::UnsupportedScheme)
    }
}

/// Serialize a record back into its share-link form.
///
/// UDP has no link format; its serialization is the empty string by design,
/// not an error.
pub fn serialize_record(record: &ServerRecord) -> String {
    match record.protocol {
        Protocol::Vmess => vmess::serialize(record),
        Protocol::Vless => vless::serialize(record),
        Protocol::Trojan => trojan::serialize(record),
        Protocol::Shadowsocks => shadowsocks::serialize(record),
        Protocol::Ssh => ssh::serialize(record),
        Protocol::Udp => String::new(),
    }
}

/// Case-insensitive scheme prefix check. `ss` must not match `ssh://`.
fn has_scheme(uri: &str, scheme: &str) -> bool {
    uri.len() > scheme.len() + 3
        && uri[..scheme.len()].eq_ignore_ascii_case(scheme)
        && uri[scheme.len()..].starts_with("://")
}

/// Strip the scheme prefix after [`has_scheme`] matched.
pub(crate) fn strip_scheme<'a>(uri: &'a str, scheme: &str) -> &'a str {
    &uri[scheme.len() + 3..]
}

/// Split off the `#fragment`, percent-decoding it into a display name.
pub(crate) fn split_fragment(uri: &str) -> (&str, String) {
    match uri.rfind('#') {
        Some(idx) => {
            let name = urlencoding::decode(&uri[idx + 1..])
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| uri[idx + 1..].to_string());
            (&uri[..idx], name)
        }
        None => (uri, String::new()),
    }
}

/// Split `host:port`, tolerating IPv6 bracket literals (`[::1]:443`).
pub(crate) fn split_host_port(s: &str) -> Result<(String, u16), LinkError> {
    let s = s.trim_end_matches('/');
    let (host, port_str) = if let Some(rest) = s.strip_prefix('[') {
        // IPv6 literal
        let end = rest.find(']').ok_or_else(|| LinkError::malformed("unterminated ipv6 literal"))?;
        let host = &rest[..end];
        let tail = &rest[end + 1..];
        let port = tail
            .strip_prefix(':')
            .ok_or_else(|| LinkError::malformed("missing port after ipv6 literal"))?;
        (host, port)
    } else {
        s.rsplit_once(':')
            .ok_or_else(|| LinkError::malformed("missing port"))?
    };

    if host.is_empty() {
        return Err(LinkError::EmptyHost);
    }
    let port: u16 = port_str.parse().map_err(|_| LinkError::InvalidPort)?;
    if port == 0 {
        return Err(LinkError::InvalidPort);
    }
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_matching_is_exact_and_case_insensitive() {
        assert!(has_scheme("VMESS://abc", "vmess"));
        assert!(has_scheme("ss://abc", "ss"));
        assert!(!has_scheme("ssh://abc", "ss"));
        assert!(!has_scheme("ss//abc", "ss"));
    }

    #[test]
    fn host_port_splitting() {
        assert_eq!(split_host_port("example.com:443").unwrap(), ("example.com".into(), 443));
        assert_eq!(split_host_port("[::1]:8443").unwrap(), ("::1".into(), 8443));
        assert_eq!(split_host_port("example.com:0"), Err(LinkError::InvalidPort));
        assert_eq!(split_host_port("example.com:99999"), Err(LinkError::InvalidPort));
        assert_eq!(split_host_port("example.com:abc"), Err(LinkError::InvalidPort));
        assert_eq!(split_host_port(":443"), Err(LinkError::EmptyHost));
    }

    #[test]
    fn unknown_scheme_is_an_error_value() {
        assert_eq!(parse_uri("wireguard://x"), Err(LinkError::UnsupportedScheme));
    }

    #[test]
    fn fragment_is_percent_decoded() {
        let (main, name) = split_fragment("host:1#My%20Server");
        assert_eq!(main, "host:1");
        assert_eq!(name, "My Server");
    }
}
