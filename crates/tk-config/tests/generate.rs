//! End-to-end generator properties: determinism, section shape, mux
//! suppression, routing order.

use tk_config::{generate, validate, GenerationOptions, RouteMode};
use tk_types::{Protocol, ServerRecord, TransportKind};

fn vmess_ws() -> ServerRecord {
    let mut rec = ServerRecord::new(Protocol::Vmess, "edge.example.com", 443);
    rec.uuid = Some("11111111-2222-3333-4444-555566667777".into());
    rec.security = Some("auto".into());
    rec.network = TransportKind::Ws;
    rec.path = Some("/tun".into());
    rec.host = Some("cdn.example.com".into());
    rec.tls = true;
    rec.sni = Some("cdn.example.com".into());
    rec
}

#[test]
fn regeneration_is_byte_identical() {
    let rec = vmess_ws();
    let opts = GenerationOptions::default();
    let a = serde_json::to_string(&generate(&rec, &opts)).unwrap();
    let b = serde_json::to_string(&generate(&rec, &opts)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn document_has_all_top_level_sections() {
    let doc = generate(&vmess_ws(), &GenerationOptions::default());
    let v = doc.to_json();
    for key in ["log", "dns", "inbounds", "outbounds", "routing", "policy", "stats"] {
        assert!(v.get(key).is_some(), "missing section {key}");
    }
    assert_eq!(v["log"]["loglevel"], "warning");
    assert_eq!(v["stats"], serde_json::json!({}));
    assert_eq!(v["policy"]["system"]["statsOutboundUplink"], true);
    assert_eq!(v["policy"]["system"]["statsOutboundDownlink"], true);
}

#[test]
fn inbounds_listen_on_loopback_with_distinct_ports() {
    let v = generate(&vmess_ws(), &GenerationOptions::default()).to_json();
    assert_eq!(v["inbounds"][0]["protocol"], "socks");
    assert_eq!(v["inbounds"][0]["listen"], "127.0.0.1");
    assert_eq!(v["inbounds"][0]["port"], 10808);
    assert_eq!(v["inbounds"][0]["sniffing"]["enabled"], true);
    assert_eq!(v["inbounds"][1]["protocol"], "http");
    assert_eq!(v["inbounds"][1]["port"], 10809);
    assert!(v["inbounds"][1].get("sniffing").is_none());
}

#[test]
fn vmess_ws_outbound_shape() {
    let v = generate(&vmess_ws(), &GenerationOptions::default()).to_json();
    let proxy = &v["outbounds"][0];
    assert_eq!(proxy["tag"], "proxy");
    assert_eq!(proxy["protocol"], "vmess");
    let user = &proxy["settings"]["vnext"][0]["users"][0];
    assert_eq!(user["id"], "11111111-2222-3333-4444-555566667777");
    assert_eq!(user["alterId"], 0);
    assert_eq!(user["security"], "auto");
    let stream = &proxy["streamSettings"];
    assert_eq!(stream["network"], "ws");
    assert_eq!(stream["security"], "tls");
    assert_eq!(stream["wsSettings"]["path"], "/tun");
    assert_eq!(stream["wsSettings"]["headers"]["Host"], "cdn.example.com");
    assert_eq!(stream["tlsSettings"]["serverName"], "cdn.example.com");
    // fallback outbounds follow, dns-out last
    let tags: Vec<&str> = v["outbounds"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["tag"].as_str().unwrap())
        .collect();
    assert_eq!(tags, vec!["proxy", "direct", "block", "dns-out"]);
}

#[test]
fn vless_reality_scenario() {
    let mut rec = ServerRecord::new(Protocol::Vless, "r.example.com", 443);
    rec.uuid = Some("uuid-r".into());
    rec.tls = true;
    rec.sni = Some("www.example.org".into());
    rec.flow = Some("xtls-rprx-vision".into());
    rec.fingerprint = Some("chrome".into());
    rec.reality_public_key = Some("PUBKEY".into());
    rec.reality_short_id = Some("ab12".into());

    let opts = GenerationOptions {
        mux_enabled: true,
        ..Default::default()
    };
    let v = generate(&rec, &opts).to_json();
    let proxy = &v["outbounds"][0];
    assert_eq!(proxy["streamSettings"]["security"], "reality");
    let reality = &proxy["streamSettings"]["realitySettings"];
    assert_eq!(reality["serverName"], "www.example.org");
    assert_eq!(reality["publicKey"], "PUBKEY");
    assert_eq!(reality["shortId"], "ab12");
    assert_eq!(reality["fingerprint"], "chrome");
    assert!(proxy["streamSettings"].get("tlsSettings").is_none());
    assert_eq!(proxy["settings"]["vnext"][0]["users"][0]["flow"], "xtls-rprx-vision");
    // mux requested but suppressed
    assert_eq!(proxy["mux"]["enabled"], false);
}

#[test]
fn trojan_suppresses_mux_even_without_flow() {
    let mut rec = ServerRecord::new(Protocol::Trojan, "t.example.com", 443);
    rec.password = Some("pw".into());
    rec.tls = true;
    let opts = GenerationOptions {
        mux_enabled: true,
        ..Default::default()
    };
    let v = generate(&rec, &opts).to_json();
    assert_eq!(v["outbounds"][0]["mux"]["enabled"], false);
    assert_eq!(v["outbounds"][0]["settings"]["servers"][0]["password"], "pw");
}

#[test]
fn catch_all_rule_is_last_in_every_mode() {
    for mode in [
        RouteMode::Global,
        RouteMode::BypassLan,
        RouteMode::BypassRegion("ir".into()),
    ] {
        let opts = GenerationOptions {
            route_mode: mode,
            ..Default::default()
        };
        let v = generate(&vmess_ws(), &opts).to_json();
        let rules = v["routing"]["rules"].as_array().unwrap();
        assert_eq!(rules.last().unwrap()["outboundTag"], "proxy");
        assert_eq!(rules[0]["outboundTag"], "dns-out");
        assert_eq!(rules[0]["port"], "53");
    }
}

#[test]
fn validation_blocks_bad_records() {
    let rec = ServerRecord::new(Protocol::Vless, "h.example", 443);
    let problems = validate(&rec);
    assert_eq!(problems, vec!["vless requires a uuid".to_string()]);
    assert!(validate(&vmess_ws()).is_empty());
}
