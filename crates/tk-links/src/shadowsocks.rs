//! Shadowsocks share-link codec.
//!
//! Three formats circulate and all must parse:
//!   - SIP002: `ss://base64(method:password)@host:port?plugin=...#name`
//!   - legacy blob: `ss://base64(method:password@host:port)#name`
//!   - plain: `ss://method:password@host:port#name`
//! Trial order is SIP002, then legacy blob, then plain. Serialization always
//! emits SIP002 with URL-safe unpadded userinfo.

use tk_types::country::country_from_name;
use tk_types::{Protocol, ServerRecord};

use crate::query::{self, QueryBuilder};
use crate::{base64x, split_fragment, split_host_port, strip_scheme, LinkError};

const SCHEME: &str = "ss";

pub fn parse(uri: &str) -> Result<ServerRecord, LinkError> {
    let rest = strip_scheme(uri, SCHEME);
    let (main, name) = split_fragment(rest);
    if main.is_empty() {
        return Err(LinkError::malformed("empty shadowsocks link"));
    }

    let (method, password, address, port, plugin) = if let Some((userinfo, tail)) =
        main.split_once('@')
    {
        // SIP002 or plain: `userinfo@host:port[?query]`
        let (host_port, query_str) = tail.split_once('?').unwrap_or((tail, ""));
        let (address, port) = split_host_port(host_port)?;
        let plugin = query::parse(query_str).remove("plugin");

        let userinfo = urlencoding::decode(userinfo)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| userinfo.to_string());
        let (method, password) = match base64x::decode_string(&userinfo) {
            Ok(decoded) => split_credentials(&decoded)?,
            // Plain userinfo, no base64 layer.
            Err(_) => split_credentials(&userinfo)?,
        };
        (method, password, address, port, plugin)
    } else {
        // Legacy blob: the whole body is base64(method:password@host:port).
        let decoded = base64x::decode_string(main)?;
        let (userinfo, host_port) = decoded
            .split_once('@')
            .ok_or_else(|| LinkError::malformed("legacy shadowsocks blob missing '@'"))?;
        let (method, password) = split_credentials(userinfo)?;
        let (address, port) = split_host_port(host_port)?;
        (method, password, address, port, None)
    };

    let mut record = ServerRecord::new(Protocol::Shadowsocks, address, port);
    record.country_code = country_from_name(&name);
    record.name = name;
    record.method = Some(method);
    record.password = Some(password);
    record.plugin = plugin;
    Ok(record)
}

pub fn serialize(record: &ServerRecord) -> String {
    let userinfo = format!(
        "{}:{}",
        record.method.as_deref().unwrap_or(""),
        record.password.as_deref().unwrap_or("")
    );
    let host = if record.address.contains(':') {
        format!("[{}]", record.address)
    } else {
        record.address.clone()
    };
    let mut out = format!(
        "ss://{}@{}:{}",
        base64x::encode_url_safe(userinfo.as_bytes()),
        host,
        record.port
    );
    let mut q = QueryBuilder::new();
    q.push_opt("plugin", record.plugin.as_deref());
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

/// Split `method:password`. Passwords may themselves contain ':'; only the
/// first colon separates.
fn split_credentials(s: &str) -> Result<(String, String), LinkError> {
    let (method, password) = s
        .split_once(':')
        .ok_or_else(|| LinkError::malformed("shadowsocks credentials missing ':'"))?;
    if method.is_empty() || password.is_empty() {
        return Err(LinkError::MissingCredential("shadowsocks"));
    }
    Ok((method.to_string(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sip002() {
        let rec = parse("ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ=@example.com:8388#MyServer").unwrap();
        assert_eq!(rec.method.as_deref(), Some("aes-256-gcm"));
        assert_eq!(rec.password.as_deref(), Some("password"));
        assert_eq!(rec.address, "example.com");
        assert_eq!(rec.port, 8388);
        assert_eq!(rec.name, "MyServer");
    }

    #[test]
    fn parses_legacy_blob() {
        // base64("aes-128-gcm:secret@10.0.0.1:443")
        let blob = base64x::encode_standard(b"aes-128-gcm:secret@10.0.0.1:443");
        let rec = parse(&format!("ss://{blob}#Legacy")).unwrap();
        assert_eq!(rec.method.as_deref(), Some("aes-128-gcm"));
        assert_eq!(rec.password.as_deref(), Some("secret"));
        assert_eq!(rec.address, "10.0.0.1");
        assert_eq!(rec.port, 443);
    }

    #[test]
    fn parses_plain_userinfo() {
        let rec = parse("ss://chacha20-ietf-poly1305:pw@h.example:8388").unwrap();
        assert_eq!(rec.method.as_deref(), Some("chacha20-ietf-poly1305"));
        assert_eq!(rec.password.as_deref(), Some("pw"));
    }

    #[test]
    fn plugin_query_survives_roundtrip() {
        let uri =
            "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ@h.example:8388?plugin=v2ray-plugin%3Bmode%3Dwebsocket";
        let rec = parse(uri).unwrap();
        assert_eq!(rec.plugin.as_deref(), Some("v2ray-plugin;mode=websocket"));
        let out = serialize(&rec);
        assert!(out.contains("plugin=v2ray-plugin%3Bmode%3Dwebsocket"));
    }

    #[test]
    fn serializes_url_safe_unpadded() {
        let mut rec = ServerRecord::new(Protocol::Shadowsocks, "example.com", 8388);
        rec.method = Some("aes-256-gcm".into());
        rec.password = Some("password".into());
        let out = serialize(&rec);
        assert_eq!(out, "ss://YWVzLTI1Ni1nY206cGFzc3dvcmQ@example.com:8388");
        // and parses back identically
        let back = parse(&out).unwrap();
        assert_eq!(back.method, rec.method);
        assert_eq!(back.password, rec.password);
    }

    #[test]
    fn rejects_missing_credentials() {
        assert!(parse("ss://@h.example:8388").is_err());
        assert!(parse("ss://YWVzLTI1Ni1nY20=@h.example:8388").is_err()); // no ':'
    }
}
