//! VLESS share-link codec.
//!
//! Shape: `vless://uuid@host:port?query#name` with query keys
//! `security,type,headerType,host,path,sni,fp,alpn,flow` plus the Reality
//! pair `pbk`/`sid` and `serviceName` for gRPC. Three transport conventions
//! apply: `ws` uses `path` + `host` header, `grpc` carries its service name
//! in the same `path` field, everything else uses `path` verbatim.

use tk_types::country::country_from_name;
use tk_types::{Protocol, ServerRecord, TransportKind};

use crate::query::{self, QueryBuilder};
use crate::{split_fragment, split_host_port, strip_scheme, LinkError};

const SCHEME: &str = "vless";

pub fn parse(uri: &str) -> Result<ServerRecord, LinkError> {
    let rest = strip_scheme(uri, SCHEME);
    let (main, name) = split_fragment(rest);
    let (main, query_str) = main.split_once('?').unwrap_or((main, ""));

    let (userinfo, host_port) = main
        .split_once('@')
        .ok_or_else(|| LinkError::malformed("vless link missing userinfo"))?;
    let uuid = urlencoding::decode(userinfo)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| userinfo.to_string());
    if uuid.is_empty() {
        return Err(LinkError::MissingCredential("vless"));
    }
    let (address, port) = split_host_port(host_port)?;

    let params = query::parse(query_str);
    let mut record = ServerRecord::new(Protocol::Vless, address, port);
    record.country_code = country_from_name(&name);
    record.name = name;
    record.uuid = Some(uuid);
    record.network = TransportKind::from_str_lossy(params.get("type").map_or("", String::as_str));
    record.header_type = params.get("headerType").cloned();
    record.host = params.get("host").cloned();
    record.sni = params.get("sni").cloned();
    record.fingerprint = params.get("fp").cloned();
    record.alpn = params.get("alpn").cloned();
    record.flow = params.get("flow").cloned().filter(|f| !f.is_empty());

    // Transport path conventions.
    record.path = match record.network {
        TransportKind::Grpc => params
            .get("serviceName")
            .or_else(|| params.get("path"))
            .cloned(),
        _ => params.get("path").cloned(),
    };

    let security = params.get("security").map_or("", String::as_str);
    record.tls = matches!(security, "tls" | "xtls" | "reality");
    if security == "reality" {
        record.reality_public_key = params.get("pbk").cloned();
        record.reality_short_id = params.get("sid").cloned();
    }

    Ok(record)
}

pub fn serialize(record: &ServerRecord) -> String {
    let mut q = QueryBuilder::new();

    let security = if record.has_reality() {
        "reality"
    } else if record.tls {
        "tls"
    } else {
        ""
    };
    q.push("security", security);
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
    q.push_opt("flow", record.flow.as_deref());
    if record.has_reality() {
        q.push_opt("pbk", record.reality_public_key.as_deref());
        q.push_opt("sid", record.reality_short_id.as_deref());
    }

    render(record, &q)
}

/// Shared `userinfo@host:port?query#name` renderer for VLESS-shaped links.
pub(crate) fn render(record: &ServerRecord, q: &QueryBuilder) -> String {
    let host = if record.address.contains(':') {
        format!("[{}]", record.address)
    } else {
        record.address.clone()
    };
    let mut out = format!(
        "{}://{}@{}:{}",
        record.protocol.scheme(),
        urlencoding::encode(credential(record)),
        host,
        record.port
    );
    if !q.is_empty() {
        out.push('?');
        out.push_str(&q.build());
    }
    if !record.name.is_empty() {
        out.push('#');
        out.push_str(&urlencoding::encode(&record.name));
    }
    out
}

fn credential(record: &ServerRecord) -> &str {
    match record.protocol {
        Protocol::Trojan => record.password.as_deref().unwrap_or(""),
        _ => record.uuid.as_deref().unwrap_or(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reality_link() {
        let uri = "vless://uuid-1@srv.example.com:443?security=reality&pbk=KEY&sid=ID&flow=xtls-rprx-vision&sni=cdn.example.com#IR%20Node";
        let rec = parse(uri).unwrap();
        assert_eq!(rec.uuid.as_deref(), Some("uuid-1"));
        assert!(rec.tls);
        assert_eq!(rec.reality_public_key.as_deref(), Some("KEY"));
        assert_eq!(rec.reality_short_id.as_deref(), Some("ID"));
        assert_eq!(rec.flow.as_deref(), Some("xtls-rprx-vision"));
        assert_eq!(rec.name, "IR Node");
    }

    #[test]
    fn grpc_service_name_maps_to_path() {
        let uri = "vless://u@h.example:443?type=grpc&serviceName=TunSvc&security=tls";
        let rec = parse(uri).unwrap();
        assert_eq!(rec.network, TransportKind::Grpc);
        assert_eq!(rec.path.as_deref(), Some("TunSvc"));

        let out = serialize(&rec);
        assert!(out.contains("serviceName=TunSvc"));
        assert!(!out.contains("path="));
    }

    #[test]
    fn ipv6_host_roundtrip() {
        let uri = "vless://u@[2001:db8::1]:8443?security=tls";
        let rec = parse(uri).unwrap();
        assert_eq!(rec.address, "2001:db8::1");
        let out = serialize(&rec);
        assert!(out.contains("@[2001:db8::1]:8443"));
    }

    #[test]
    fn defaults_are_omitted_on_serialize() {
        let mut rec = ServerRecord::new(Protocol::Vless, "h.example", 443);
        rec.uuid = Some("u".into());
        let out = serialize(&rec);
        // tcp transport and security=none produce no query at all
        assert_eq!(out, "vless://u@h.example:443");
    }

    #[test]
    fn rejects_empty_uuid() {
        assert_eq!(
            parse("vless://@h.example:443"),
            Err(LinkError::MissingCredential("vless"))
        );
    }
}
