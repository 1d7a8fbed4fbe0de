//! Per-protocol proxy outbound builders.

use tk_types::{Protocol, ServerRecord};

use crate::model::{Mux, Outbound, OutboundSettings, ProxyServer, VnextServer, VnextUser};
use crate::options::GenerationOptions;
use crate::stream;

pub const PROXY_TAG: &str = "proxy";
pub const DIRECT_TAG: &str = "direct";
pub const BLOCK_TAG: &str = "block";
pub const DNS_TAG: &str = "dns-out";

/// Build the primary proxy outbound for an engine-backed protocol.
///
/// SSH and UDP records never reach this builder; their lifecycles bypass the
/// engine entirely.
pub fn build_proxy(record: &ServerRecord, options: &GenerationOptions) -> Outbound {
    let settings = match record.protocol {
        Protocol::Vmess => OutboundSettings::Vnext {
            vnext: vec![VnextServer {
                address: record.address.clone(),
                port: record.port,
                users: vec![VnextUser {
                    id: record.uuid.clone().unwrap_or_default(),
                    alter_id: Some(record.alter_id),
                    security: Some(
                        record.security.clone().unwrap_or_else(|| "auto".to_string()),
                    ),
                    encryption: None,
                    flow: None,
                }],
            }],
        },
        Protocol::Vless => OutboundSettings::Vnext {
            vnext: vec![VnextServer {
                address: record.address.clone(),
                port: record.port,
                users: vec![VnextUser {
                    id: record.uuid.clone().unwrap_or_default(),
                    alter_id: None,
                    security: None,
                    encryption: Some("none".to_string()),
                    flow: record.flow.clone(),
                }],
            }],
        },
        Protocol::Trojan | Protocol::Shadowsocks => OutboundSettings::Servers {
            servers: vec![ProxyServer {
                address: record.address.clone(),
                port: record.port,
                method: match record.protocol {
                    Protocol::Shadowsocks => record.method.clone(),
                    _ => None,
                },
                password: record.password.clone().unwrap_or_default(),
            }],
        },
        Protocol::Ssh | Protocol::Udp => OutboundSettings::Empty {},
    };

    Outbound {
        tag: PROXY_TAG.to_string(),
        protocol: protocol_name(record.protocol).to_string(),
        settings,
        stream_settings: Some(stream::build(record)),
        mux: Some(mux_for(record, options)),
    }
}

/// Mux is incompatible with XTLS flow control, Reality, and Trojan; those
/// force it off no matter what the options say.
pub fn mux_for(record: &ServerRecord, options: &GenerationOptions) -> Mux {
    let suppressed =
        record.has_flow() || record.has_reality() || record.protocol == Protocol::Trojan;
    Mux {
        enabled: options.mux_enabled && !suppressed,
        concurrency: options.mux_concurrency,
    }
}

pub fn build_direct() -> Outbound {
    plain(DIRECT_TAG, "freedom")
}

pub fn build_block() -> Outbound {
    plain(BLOCK_TAG, "blackhole")
}

pub fn build_dns() -> Outbound {
    plain(DNS_TAG, "dns")
}

fn plain(tag: &str, protocol: &str) -> Outbound {
    Outbound {
        tag: tag.to_string(),
        protocol: protocol.to_string(),
        settings: OutboundSettings::Empty {},
        stream_settings: None,
        mux: None,
    }
}

fn protocol_name(protocol: Protocol) -> &'static str {
    match protocol {
        Protocol::Vmess => "vmess",
        Protocol::Vless => "vless",
        Protocol::Trojan => "trojan",
        Protocol::Shadowsocks => "shadowsocks",
        Protocol::Ssh => "ssh",
        Protocol::Udp => "udp",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vless_record() -> ServerRecord {
        let mut rec = ServerRecord::new(Protocol::Vless, "h.example", 443);
        rec.uuid = Some("uuid-1".into());
        rec
    }

    #[test]
    fn vless_users_carry_encryption_none() {
        let ob = build_proxy(&vless_record(), &GenerationOptions::default());
        let v = serde_json::to_value(&ob).unwrap();
        assert_eq!(v["settings"]["vnext"][0]["users"][0]["encryption"], "none");
        assert!(v["settings"]["vnext"][0]["users"][0].get("alterId").is_none());
    }

    #[test]
    fn mux_suppression() {
        let opts = GenerationOptions {
            mux_enabled: true,
            ..Default::default()
        };

        assert!(mux_for(&vless_record(), &opts).enabled);

        let mut flowed = vless_record();
        flowed.flow = Some("xtls-rprx-vision".into());
        assert!(!mux_for(&flowed, &opts).enabled);

        let mut reality = vless_record();
        reality.reality_public_key = Some("PBK".into());
        assert!(!mux_for(&reality, &opts).enabled);

        let mut trojan = ServerRecord::new(Protocol::Trojan, "h.example", 443);
        trojan.password = Some("pw".into());
        assert!(!mux_for(&trojan, &opts).enabled);
    }

    #[test]
    fn shadowsocks_servers_shape() {
        let mut rec = ServerRecord::new(Protocol::Shadowsocks, "h.example", 8388);
        rec.method = Some("aes-256-gcm".into());
        rec.password = Some("pw".into());
        let ob = build_proxy(&rec, &GenerationOptions::default());
        let v = serde_json::to_value(&ob).unwrap();
        assert_eq!(v["protocol"], "shadowsocks");
        assert_eq!(v["settings"]["servers"][0]["method"], "aes-256-gcm");
        assert_eq!(v["settings"]["servers"][0]["password"], "pw");
    }
}
