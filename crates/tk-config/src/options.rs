//! Generation options: everything about the produced document that is not a
//! property of the server record itself.

use crate::model::RoutingRule;

/// Routing posture for the generated document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RouteMode {
    /// Everything through the proxy.
    #[default]
    Global,
    /// LAN and local domains go direct.
    BypassLan,
    /// LAN plus one region's geoip/geosite go direct. The value is a
    /// lowercase ISO code used as `geoip:<code>` / `geosite:<code>`.
    BypassRegion(String),
    /// Caller-supplied rules, inserted between the block rules and the
    /// catch-all.
    Custom(Vec<RoutingRule>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub log_level: String,
    pub dns_servers: Vec<String>,
    pub socks_port: u16,
    pub http_port: u16,
    pub listen: String,
    pub sniffing: bool,
    pub udp_over_proxy: bool,
    pub mux_enabled: bool,
    pub mux_concurrency: u16,
    pub block_ads: bool,
    pub route_mode: RouteMode,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            log_level: "warning".to_string(),
            dns_servers: vec!["1.1.1.1".to_string(), "8.8.8.8".to_string()],
            socks_port: 10808,
            http_port: 10809,
            listen: "127.0.0.1".to_string(),
            sniffing: true,
            udp_over_proxy: true,
            mux_enabled: false,
            mux_concurrency: 8,
            block_ads: true,
            route_mode: RouteMode::default(),
        }
    }
}

impl GenerationOptions {
    pub fn bypass_lan(&self) -> bool {
        matches!(
            self.route_mode,
            RouteMode::BypassLan | RouteMode::BypassRegion(_)
        )
    }
}
