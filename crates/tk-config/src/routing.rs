//! Routing rule assembly. Rule order is load-bearing: the engine matches
//! first-hit, so the catch-all proxy rule must always come last.

use crate::model::{Routing, RoutingRule};
use crate::options::{GenerationOptions, RouteMode};
use crate::outbound::{BLOCK_TAG, DIRECT_TAG, DNS_TAG, PROXY_TAG};

pub fn build(options: &GenerationOptions) -> Routing {
    let mut rules = Vec::new();

    // 1. Hijack plain-port-53 DNS into the dns outbound.
    rules.push(RoutingRule {
        port: Some("53".to_string()),
        network: Some("udp".to_string()),
        ..RoutingRule::field(DNS_TAG)
    });

    // 2. Ad/tracker domains.
    if options.block_ads {
        rules.push(RoutingRule {
            domain: Some(vec!["geosite:category-ads-all".to_string()]),
            ..RoutingRule::field(BLOCK_TAG)
        });
    }

    // 3. LAN bypass.
    if options.bypass_lan() {
        rules.push(RoutingRule {
            ip: Some(vec!["geoip:private".to_string()]),
            ..RoutingRule::field(DIRECT_TAG)
        });
        rules.push(RoutingRule {
            domain: Some(vec![
                "domain:localhost".to_string(),
                "domain:local".to_string(),
            ]),
            ..RoutingRule::field(DIRECT_TAG)
        });
    }

    // 4. Region bypass / custom rules.
    match &options.route_mode {
        RouteMode::BypassRegion(code) => {
            rules.push(RoutingRule {
                ip: Some(vec![format!("geoip:{code}")]),
                ..RoutingRule::field(DIRECT_TAG)
            });
            rules.push(RoutingRule {
                domain: Some(vec![format!("geosite:{code}")]),
                ..RoutingRule::field(DIRECT_TAG)
            });
        }
        RouteMode::Custom(custom) => rules.extend(custom.iter().cloned()),
        RouteMode::Global | RouteMode::BypassLan => {}
    }

    // 5. Catch-all, always last.
    rules.push(RoutingRule {
        network: Some(if options.udp_over_proxy {
            "tcp,udp".to_string()
        } else {
            "tcp".to_string()
        }),
        ..RoutingRule::field(PROXY_TAG)
    });

    Routing {
        domain_strategy: "IPIfNonMatch".to_string(),
        rules,
    }
}
