//! Trojan share-link codec.
//!
//! Shape: `trojan://password@host:port?query#name` with query keys
//! `security,type,headerType,host,path,sni,fp,alpn`. Trojan is TLS-native:
//! TLS stays on unless the link says `security=none` explicitly. The same
//! three transport path conventions as VLESS apply.

use tk_types::country::country_from_name;
use tk_types::{Protocol, ServerRecord, TransportKind};

use crate::query::{self, QueryBuilder};
use crate::{split_fragment, split_host_port, strip_scheme, vless, LinkError};

const SCHEME: &str = "trojan";

pub fn parse(uri: &str) -> Result<ServerRecord, LinkError> {
    let rest = strip_scheme(uri, SCHEME);
    let (main, name) = split_fragment(rest);
    let (main, query_str) = main.split_once('?').unwrap_or((main, ""));

    let (userinfo, host_port) = main
        .split_once('@')
        .ok_or_else(|| LinkError::malformed("trojan link missing password"))?;
    let password = urlencoding::decode(userinfo)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| userinfo.to_string());
    if password.is_empty() {
        return Err(LinkError::MissingCredential("trojan"));
    }
    let (address, port) = split_host_port(host_port)?;

    let params = query::parse(query_str);
    let mut record = ServerRecord::new(Protocol::Trojan, address, port);
    record.country_code = country_from_name(&name);
    record.name = name;
    record.password = Some(password);
    record.network = TransportKind::from_str_lossy(params.get("type").map_or("", String::as_str));
    record.header_type = params.get("headerType").cloned();
    record.host = params.get("host").cloned();
    record.sni = params.get("sni").cloned();
    record.fingerprint = params.get("fp").cloned();
    record.alpn = params.get("alpn").cloned();
    record.path = match record.network {
        TransportKind::Grpc => params
            .get("serviceName")
            .or_else(|| params.get("path"))
            .cloned(),
        _ => params.get("path").cloned(),
    };

    record.tls = params.get("security").map_or("", String::as_str) != "none";

    Ok(record)
}

pub fn serialize(record: &ServerRecord) -> String {
    let mut q = QueryBuilder::new();

    // TLS is the protocol default; only its absence is worth a parameter.
    if !record.tls {
        q.push("security", "none");
    }
    if record.network != TransportKind::Tcp {
        q.push("type", record.network.as_str());
    }
    q.push_opt("headerType", record.header_type.as_deref());
    q.push_opt("host", record.host.as_deref());
    match record.network {
        TransportKind::Grpc => q.push_opt("serviceName", record.path.as_deref()),
        _ => q.push_opt("path", record.path.as_deref()),
    };
    q.push_opt("sni", record.sni.as_deref());
    q.push_opt("fp", record.fingerprint.as_deref());
    q.push_opt("alpn", record.alpn.as_deref());

    vless::render(record, &q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_defaults_on() {
        let rec = parse("trojan://pw@srv.example.com:443#US-East").unwrap();
        assert!(rec.tls);
        assert_eq!(rec.password.as_deref(), Some("pw"));
        assert_eq!(rec.country_code, "US");
    }

    #[test]
    fn security_none_disables_tls() {
        let rec = parse("trojan://pw@srv.example.com:8080?security=none").unwrap();
        assert!(!rec.tls);
        let out = serialize(&rec);
        assert!(out.contains("security=none"));
    }

    #[test]
    fn password_is_percent_decoded() {
        let rec = parse("trojan://p%40ss%3Aword@h.example:443").unwrap();
        assert_eq!(rec.password.as_deref(), Some("p@ss:word"));
        // and re-encoded on the way back out
        let out = serialize(&rec);
        assert!(out.starts_with("trojan://p%40ss%3Aword@"));
    }

    #[test]
    fn ws_transport_carries_path_and_host() {
        let rec =
            parse("trojan://pw@h.example:443?type=ws&path=%2Ftun&host=cdn.example.com").unwrap();
        assert_eq!(rec.network, TransportKind::Ws);
        assert_eq!(rec.path.as_deref(), Some("/tun"));
        assert_eq!(rec.host.as_deref(), Some("cdn.example.com"));
    }

    #[test]
    fn rejects_missing_password_and_empty_host() {
        assert_eq!(
            parse("trojan://@h.example:443"),
            Err(LinkError::MissingCredential("trojan"))
        );
        assert_eq!(parse("trojan://pw@:443"), Err(LinkError::EmptyHost));
    }
}
