//! Outbound configuration generator.
//!
//! `generate` is a pure function of record and options: no I/O, no clock, no
//! randomness, stable field order. Regenerating for the same inputs yields a
//! byte-identical document, so the engine is never restarted for a no-op
//! config change.

pub mod model;
pub mod options;
pub mod outbound;
pub mod routing;
pub mod stream;
pub mod validate;

pub use model::OutboundConfiguration;
pub use options::{GenerationOptions, RouteMode};
pub use validate::validate;

use tk_types::ServerRecord;
use tracing::debug;

use model::{DnsSection, Inbound, InboundSettings, LogSection, Policy, PolicySystem, Sniffing, Stats};

/// Build the full engine configuration for an engine-backed record.
///
/// The record is assumed valid (`validate` returned empty); generation never
/// re-validates and is total over validated input.
pub fn generate(record: &ServerRecord, options: &GenerationOptions) -> OutboundConfiguration {
    debug!(
        protocol = %record.protocol,
        server = %record.display_name(),
        "generating outbound configuration"
    );

    OutboundConfiguration {
        log: LogSection {
            loglevel: options.log_level.clone(),
        },
        dns: DnsSection {
            servers: options.dns_servers.clone(),
        },
        inbounds: build_inbounds(options),
        outbounds: vec![
            outbound::build_proxy(record, options),
            outbound::build_direct(),
            outbound::build_block(),
            outbound::build_dns(),
        ],
        routing: routing::build(options),
        policy: Policy {
            system: PolicySystem {
                stats_outbound_uplink: true,
                stats_outbound_downlink: true,
            },
        },
        stats: Stats {},
    }
}

fn build_inbounds(options: &GenerationOptions) -> Vec<Inbound> {
    let sniffing = options.sniffing.then(|| Sniffing {
        enabled: true,
        dest_override: vec!["http".to_string(), "tls".to_string()],
    });
    vec![
        Inbound {
            tag: "socks-in".to_string(),
            listen: options.listen.clone(),
            port: options.socks_port,
            protocol: "socks".to_string(),
            settings: InboundSettings {
                auth: "noauth".to_string(),
                udp: options.udp_over_proxy,
            },
            sniffing,
        },
        Inbound {
            tag: "http-in".to_string(),
            listen: options.listen.clone(),
            port: options.http_port,
            protocol: "http".to_string(),
            settings: InboundSettings {
                auth: "noauth".to_string(),
                udp: false,
            },
            sniffing: None,
        },
    ]
}
