//! Stream settings: transport sub-block plus the security layer.
//!
//! Exactly one transport sub-block is emitted, chosen by the record's
//! network. Security priority is Reality over TLS over none; Reality and TLS
//! blocks are mutually exclusive.

use tk_types::{ServerRecord, TransportKind};

use crate::model::{
    GrpcSettings, HttpSettings, KcpHeader, KcpSettings, QuicSettings, RealitySettings,
    StreamSettings, TlsSettings, WsHeaders, WsSettings,
};

pub fn build(record: &ServerRecord) -> StreamSettings {
    let mut s = StreamSettings {
        network: record.network.as_str().to_string(),
        security: "none".to_string(),
        tls_settings: None,
        reality_settings: None,
        ws_settings: None,
        grpc_settings: None,
        kcp_settings: None,
        http_settings: None,
        quic_settings: None,
    };

    if record.has_reality() {
        s.security = "reality".to_string();
        s.reality_settings = Some(RealitySettings {
            server_name: record.effective_sni().to_string(),
            public_key: record.reality_public_key.clone().unwrap_or_default(),
            short_id: record.reality_short_id.clone().unwrap_or_default(),
            fingerprint: record.fingerprint.clone(),
        });
    } else if record.tls {
        s.security = "tls".to_string();
        s.tls_settings = Some(TlsSettings {
            server_name: record.effective_sni().to_string(),
            allow_insecure: false,
            fingerprint: record.fingerprint.clone(),
            alpn: record
                .alpn
                .as_deref()
                .map(|a| a.split(',').map(|p| p.trim().to_string()).collect()),
        });
    }

    match record.network {
        TransportKind::Ws => {
            s.ws_settings = Some(WsSettings {
                path: record.path.clone().unwrap_or_else(|| "/".to_string()),
                headers: record.host.clone().map(|host| WsHeaders { host }),
            });
        }
        TransportKind::Grpc => {
            s.grpc_settings = Some(GrpcSettings {
                service_name: record.path.clone().unwrap_or_default(),
                multi_mode: false,
            });
        }
        TransportKind::Kcp => {
            s.kcp_settings = Some(KcpSettings {
                header: record.header_type.clone().map(|t| KcpHeader { header_type: t }),
                seed: record.path.clone(),
            });
        }
        TransportKind::Http | TransportKind::H2 => {
            s.http_settings = Some(HttpSettings {
                host: record.host.clone().map(|h| vec![h]),
                path: record.path.clone().unwrap_or_else(|| "/".to_string()),
            });
        }
        TransportKind::Quic => {
            s.quic_settings = Some(QuicSettings {
                security: "none".to_string(),
                key: String::new(),
                header: record.header_type.clone().map(|t| KcpHeader { header_type: t }),
            });
        }
        TransportKind::Tcp => {}
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use tk_types::Protocol;

    fn record(network: TransportKind) -> ServerRecord {
        let mut rec = ServerRecord::new(Protocol::Vless, "h.example", 443);
        rec.network = network;
        rec
    }

    #[test]
    fn exactly_one_transport_block() {
        for network in [
            TransportKind::Ws,
            TransportKind::Grpc,
            TransportKind::Kcp,
            TransportKind::Http,
            TransportKind::Quic,
            TransportKind::Tcp,
        ] {
            let s = build(&record(network));
            let v = serde_json::to_value(&s).unwrap();
            let blocks = ["wsSettings", "grpcSettings", "kcpSettings", "httpSettings", "quicSettings"]
                .iter()
                .filter(|k| v.get(**k).is_some())
                .count();
            let expected = usize::from(network != TransportKind::Tcp);
            assert_eq!(blocks, expected, "{network:?}");
        }
    }

    #[test]
    fn reality_wins_over_tls() {
        let mut rec = record(TransportKind::Tcp);
        rec.tls = true;
        rec.sni = Some("cdn.example.com".into());
        rec.reality_public_key = Some("PBK".into());
        rec.reality_short_id = Some("42".into());
        let s = build(&rec);
        assert_eq!(s.security, "reality");
        assert!(s.tls_settings.is_none());
        let reality = s.reality_settings.unwrap();
        assert_eq!(reality.server_name, "cdn.example.com");
        assert_eq!(reality.public_key, "PBK");
    }

    #[test]
    fn sni_falls_back_to_host_then_address() {
        let mut rec = record(TransportKind::Ws);
        rec.tls = true;
        rec.host = Some("cdn.example.com".into());
        assert_eq!(build(&rec).tls_settings.unwrap().server_name, "cdn.example.com");

        rec.host = None;
        assert_eq!(build(&rec).tls_settings.unwrap().server_name, "h.example");
    }

    #[test]
    fn alpn_splits_on_comma() {
        let mut rec = record(TransportKind::Tcp);
        rec.tls = true;
        rec.alpn = Some("h2, http/1.1".into());
        assert_eq!(
            build(&rec).tls_settings.unwrap().alpn,
            Some(vec!["h2".to_string(), "http/1.1".to_string()])
        );
    }
}
