//! VMess share-link codec.
//!
//! The payload is `vmess://base64(JSON)` with the de-facto key set
//! `v,ps,add,port,id,aid,scy,net,type,host,path,tls,sni,fp,alpn`. Feeds are
//! sloppy about types (`port`/`aid` arrive as strings or numbers, `tls` as
//! `"tls"` or a bool), so extraction goes through tolerant helpers.

use serde_json::Value;
use tk_types::country::country_from_name;
use tk_types::{Protocol, ServerRecord, TransportKind};

use crate::{base64x, strip_scheme, LinkError};

const SCHEME: &str = "vmess";

pub fn parse(uri: &str) -> Result<ServerRecord, LinkError> {
    let payload = strip_scheme(uri, SCHEME);
    if payload.trim().is_empty() {
        return Err(LinkError::malformed("vmess link missing payload"));
    }

    let decoded = base64x::decode(payload)?;
    let json: Value = serde_json::from_slice(&decoded)
        .map_err(|e| LinkError::malformed(format!("vmess payload is not json: {e}")))?;
    let obj = json
        .as_object()
        .ok_or_else(|| LinkError::malformed("vmess payload is not a json object"))?;

    let address = str_field(obj, "add");
    if address.is_empty() {
        return Err(LinkError::EmptyHost);
    }
    let port = port_field(obj, "port")?;
    let uuid = str_field(obj, "id");
    if uuid.is_empty() {
        return Err(LinkError::MissingCredential("vmess"));
    }

    let name = str_field(obj, "ps");
    let mut record = ServerRecord::new(Protocol::Vmess, address, port);
    record.country_code = country_from_name(&name);
    record.name = name;
    record.uuid = Some(uuid);
    record.alter_id = int_field(obj, "aid").unwrap_or(0);
    record.security = non_empty(str_field(obj, "scy")).or(Some("auto".to_string()));
    record.network = TransportKind::from_str_lossy(&str_field(obj, "net"));
    record.header_type = non_empty(str_field(obj, "type"));
    record.host = non_empty(str_field(obj, "host"));
    record.path = non_empty(str_field(obj, "path"));
    record.tls = matches!(obj.get("tls"), Some(Value::Bool(true)))
        || str_field(obj, "tls").eq_ignore_ascii_case("tls");
    record.sni = non_empty(str_field(obj, "sni"));
    record.fingerprint = non_empty(str_field(obj, "fp"));
    record.alpn = non_empty(str_field(obj, "alpn"));

    Ok(record)
}

pub fn serialize(record: &ServerRecord) -> String {
    // The full canonical key set is always emitted; VMess clients expect
    // every key present, with empty strings for unset values.
    let payload = serde_json::json!({
        "v": "2",
        "ps": record.name,
        "add": record.address,
        "port": record.port.to_string(),
        "id": record.uuid.clone().unwrap_or_default(),
        "aid": record.alter_id.to_string(),
        "scy": record.security.clone().unwrap_or_else(|| "auto".to_string()),
        "net": record.network.as_str(),
        "type": record.header_type.clone().unwrap_or_else(|| "none".to_string()),
        "host": record.host.clone().unwrap_or_default(),
        "path": record.path.clone().unwrap_or_default(),
        "tls": if record.tls { "tls" } else { "" },
        "sni": record.sni.clone().unwrap_or_default(),
        "fp": record.fingerprint.clone().unwrap_or_default(),
        "alpn": record.alpn.clone().unwrap_or_default(),
    });
    format!(
        "vmess://{}",
        base64x::encode_standard(payload.to_string().as_bytes())
    )
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn int_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<u16> {
    match obj.get(key) {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u16::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn port_field(obj: &serde_json::Map<String, Value>, key: &str) -> Result<u16, LinkError> {
    let port = int_field(obj, key).ok_or(LinkError::InvalidPort)?;
    if port == 0 {
        return Err(LinkError::InvalidPort);
    }
    Ok(port)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base64x;

    fn link(payload: serde_json::Value) -> String {
        format!(
            "vmess://{}",
            base64x::encode_standard(payload.to_string().as_bytes())
        )
    }

    #[test]
    fn parses_string_and_numeric_ports() {
        for port in [serde_json::json!("443"), serde_json::json!(443)] {
            let uri = link(serde_json::json!({
                "v": "2", "ps": "[DE] node", "add": "srv.example.com",
                "port": port, "id": "uuid-1", "aid": "0", "net": "ws",
                "host": "cdn.example.com", "path": "/ws", "tls": "tls"
            }));
            let rec = parse(&uri).unwrap();
            assert_eq!(rec.port, 443);
            assert_eq!(rec.network, TransportKind::Ws);
            assert!(rec.tls);
            assert_eq!(rec.country_code, "DE");
        }
    }

    #[test]
    fn missing_net_defaults_to_tcp() {
        let uri = link(serde_json::json!({
            "ps": "x", "add": "h.example", "port": 443, "id": "uuid-1"
        }));
        let rec = parse(&uri).unwrap();
        assert_eq!(rec.network, TransportKind::Tcp);
        assert!(!rec.tls);
        assert_eq!(rec.security.as_deref(), Some("auto"));
    }

    #[test]
    fn rejects_missing_uuid_and_bad_port() {
        let no_id = link(serde_json::json!({"add": "h", "port": 443}));
        assert_eq!(parse(&no_id), Err(LinkError::MissingCredential("vmess")));

        let bad_port = link(serde_json::json!({"add": "h", "port": "70000", "id": "u"}));
        assert_eq!(parse(&bad_port), Err(LinkError::InvalidPort));

        let zero_port = link(serde_json::json!({"add": "h", "port": 0, "id": "u"}));
        assert_eq!(parse(&zero_port), Err(LinkError::InvalidPort));
    }

    #[test]
    fn garbage_payload_is_an_error_value() {
        assert!(parse("vmess://%%%%").is_err());
        assert!(parse("vmess://aGVsbG8=").is_err()); // valid base64, not json
    }
}
