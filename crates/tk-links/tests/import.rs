//! Batch import never aborts: one bad line costs one failure entry and
//! nothing else.

use tk_links::subscription::import;
use tk_links::{base64x, LinkError};
use tk_types::Protocol;

#[test]
fn mixed_batch_with_failures() {
    let body = "\
vmess://!!!broken!!!
trojan://pw@ok.example.com:443#Good
ss://aes-256-gcm:pw@ok2.example.com:8388
vless://@missing-uuid.example.com:443
ssh://root:pw@ok3.example.com:2222
";
    let report = import(body);
    assert_eq!(report.records.len(), 3);
    assert_eq!(
        report
            .records
            .iter()
            .map(|r| r.protocol)
            .collect::<Vec<_>>(),
        vec![Protocol::Trojan, Protocol::Shadowsocks, Protocol::Ssh]
    );
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures[0].0, 1);
    assert_eq!(report.failures[1], (4, LinkError::MissingCredential("vless")));
}

#[test]
fn base64_wrapped_batch() {
    let lines = "trojan://pw@a.example.com:443#A\nssh://u:p@b.example.com:22#B";
    let report = import(&base64x::encode_standard(lines.as_bytes()));
    assert_eq!(report.records.len(), 2);
    assert!(report.failures.is_empty());
    assert_eq!(report.records[0].name, "A");
    assert_eq!(report.records[1].name, "B");
}
