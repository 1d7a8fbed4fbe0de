//! Query-string helpers shared by the `userinfo@host:port?query#name`
//! shaped codecs (VLESS, Trojan, Shadowsocks plugin, SSH).

use std::collections::HashMap;

/// Parse `k=v&k2=v2` into a map, percent-decoding values. Duplicate keys
/// keep the first occurrence; malformed pairs are skipped, not rejected.
pub fn parse(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            if key.is_empty() {
                continue;
            }
            let value = urlencoding::decode(value)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| value.to_string());
            params.entry(key.to_string()).or_insert(value);
        }
    }
    params
}

/// Ordered query-string builder. Values are percent-encoded; empty values
/// are skipped so serialized links stay minimal.
#[derive(Debug, Default)]
pub struct QueryBuilder {
    pairs: Vec<(String, String)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: &str) -> &mut Self {
        if !value.is_empty() {
            self.pairs.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn push_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.push(key, v);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render as `k=v&k2=v2`, or the empty string when nothing was pushed.
    pub fn build(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_decodes() {
        let params = parse("type=ws&path=%2Fws&host=cdn.example.com&broken&=x");
        assert_eq!(params.get("type").map(String::as_str), Some("ws"));
        assert_eq!(params.get("path").map(String::as_str), Some("/ws"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn duplicate_keys_keep_first() {
        let params = parse("sni=a.com&sni=b.com");
        assert_eq!(params.get("sni").map(String::as_str), Some("a.com"));
    }

    #[test]
    fn builder_skips_empty_and_encodes() {
        let mut q = QueryBuilder::new();
        q.push("type", "ws").push("path", "/a b").push("sni", "");
        assert_eq!(q.build(), "type=ws&path=%2Fa%20b");
    }
}
