//! Best-effort country-code extraction from server display names.
//!
//! Subscription feeds encode the location in wildly inconsistent ways:
//! bracketed codes (`[DE] Frankfurt 01`), bare tokens (`US-West`), emoji
//! flags, or spelled-out country names. This utility tries each pattern in
//! order and falls back to the `"UN"` sentinel. It is shared by every link
//! codec so the heuristics live in exactly one place. Failure is never an
//! error.

use crate::record::UNKNOWN_COUNTRY;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static BRACKET_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\[(]([A-Za-z]{2})[\])]").expect("static regex"));
// Bare edge tokens must be uppercase in the original string; otherwise
// ordinary words ("My Server") match as codes.
static EDGE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^([A-Z]{2})[-_ |.]|[-_ |.]([A-Z]{2})$)").expect("static regex"));

/// ISO alpha-2 codes we accept from bare two-letter tokens. Restricting to a
/// known set keeps tokens like "My Server" from matching as Malaysia.
static KNOWN_CODES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "AE", "AL", "AM", "AR", "AT", "AU", "AZ", "BA", "BD", "BE", "BG", "BH", "BR", "BY",
        "CA", "CH", "CL", "CN", "CO", "CR", "CY", "CZ", "DE", "DK", "EE", "EG", "ES", "FI",
        "FR", "GB", "GE", "GR", "HK", "HR", "HU", "ID", "IE", "IL", "IN", "IQ", "IR", "IS",
        "IT", "JO", "JP", "KE", "KG", "KH", "KR", "KW", "KZ", "LA", "LB", "LK", "LT", "LU",
        "LV", "MA", "MD", "ME", "MK", "MN", "MO", "MT", "MX", "MY", "NG", "NL", "NO", "NP",
        "NZ", "OM", "PA", "PE", "PH", "PK", "PL", "PT", "PY", "QA", "RO", "RS", "RU", "SA",
        "SE", "SG", "SI", "SK", "TH", "TJ", "TM", "TN", "TR", "TW", "UA", "US", "UY", "UZ",
        "VE", "VN", "ZA",
    ]
    .into_iter()
    .collect()
});

/// Country-name substrings, matched case-insensitively after the token
/// patterns fail. Longer/more specific names first where prefixes overlap.
static NAME_TABLE: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("united states", "US"),
        ("united kingdom", "GB"),
        ("south korea", "KR"),
        ("hong kong", "HK"),
        ("hongkong", "HK"),
        ("singapore", "SG"),
        ("germany", "DE"),
        ("frankfurt", "DE"),
        ("netherlands", "NL"),
        ("amsterdam", "NL"),
        ("france", "FR"),
        ("paris", "FR"),
        ("japan", "JP"),
        ("tokyo", "JP"),
        ("taiwan", "TW"),
        ("canada", "CA"),
        ("australia", "AU"),
        ("russia", "RU"),
        ("moscow", "RU"),
        ("turkey", "TR"),
        ("istanbul", "TR"),
        ("iran", "IR"),
        ("tehran", "IR"),
        ("india", "IN"),
        ("brazil", "BR"),
        ("italy", "IT"),
        ("spain", "ES"),
        ("poland", "PL"),
        ("sweden", "SE"),
        ("norway", "NO"),
        ("finland", "FI"),
        ("denmark", "DK"),
        ("austria", "AT"),
        ("switzerland", "CH"),
        ("zurich", "CH"),
        ("ireland", "IE"),
        ("belgium", "BE"),
        ("czech", "CZ"),
        ("romania", "RO"),
        ("bulgaria", "BG"),
        ("ukraine", "UA"),
        ("london", "GB"),
        ("england", "GB"),
        ("britain", "GB"),
        ("america", "US"),
        ("armenia", "AM"),
        ("georgia", "GE"),
        ("emirates", "AE"),
        ("dubai", "AE"),
        ("china", "CN"),
        ("vietnam", "VN"),
        ("thailand", "TH"),
        ("malaysia", "MY"),
        ("indonesia", "ID"),
        ("philippines", "PH"),
        ("mexico", "MX"),
        ("argentina", "AR"),
        ("south africa", "ZA"),
        ("israel", "IL"),
        ("qatar", "QA"),
        ("kazakhstan", "KZ"),
        ("estonia", "EE"),
        ("latvia", "LV"),
        ("lithuania", "LT"),
        ("luxembourg", "LU"),
        ("hungary", "HU"),
        ("portugal", "PT"),
        ("greece", "GR"),
        ("serbia", "RS"),
        ("seoul", "KR"),
        ("korea", "KR"),
    ]
});

const FLAG_BASE: u32 = 0x1F1E6; // regional indicator 'A'

/// Extract an ISO alpha-2 country code from a display name. Returns the
/// `"UN"` sentinel when nothing matches.
pub fn country_from_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return UNKNOWN_COUNTRY.to_string();
    }

    // 1. Bracketed code: "[DE] Frankfurt", "(us) west".
    if let Some(caps) = BRACKET_CODE.captures(trimmed) {
        let code = caps[1].to_ascii_uppercase();
        if KNOWN_CODES.contains(code.as_str()) {
            return code;
        }
    }

    // 2. Leading or trailing bare token: "US-West", "Premium_JP".
    if let Some(caps) = EDGE_CODE.captures(trimmed) {
        let token = caps.get(1).or_else(|| caps.get(2));
        if let Some(m) = token {
            if KNOWN_CODES.contains(m.as_str()) {
                return m.as_str().to_string();
            }
        }
    }

    // 3. Emoji flag: a pair of regional indicator symbols.
    if let Some(code) = flag_to_code(trimmed) {
        return code;
    }

    // 4. Country-name substring.
    let lower = trimmed.to_lowercase();
    for (needle, code) in NAME_TABLE.iter() {
        if lower.contains(needle) {
            return (*code).to_string();
        }
    }

    UNKNOWN_COUNTRY.to_string()
}

fn flag_to_code(s: &str) -> Option<String> {
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        let cp = c as u32;
        if (FLAG_BASE..FLAG_BASE + 26).contains(&cp) {
            if let Some(&next) = chars.peek() {
                let np = next as u32;
                if (FLAG_BASE..FLAG_BASE + 26).contains(&np) {
                    let a = (b'A' + (cp - FLAG_BASE) as u8) as char;
                    let b = (b'A' + (np - FLAG_BASE) as u8) as char;
                    let code: String = [a, b].iter().collect();
                    if KNOWN_CODES.contains(code.as_str()) {
                        return Some(code);
                    }
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_patterns() {
        assert_eq!(country_from_name("[DE] Frankfurt 01"), "DE");
        assert_eq!(country_from_name("(us) west coast"), "US");
        assert_eq!(country_from_name("[ZZ] nowhere"), "UN");
    }

    #[test]
    fn edge_tokens() {
        assert_eq!(country_from_name("US-West"), "US");
        assert_eq!(country_from_name("Premium_JP"), "JP");
        assert_eq!(country_from_name("nl.fast.relay"), "UN"); // lowercase token, skipped
        assert_eq!(country_from_name("fast-NL"), "NL");
    }

    #[test]
    fn emoji_flags() {
        assert_eq!(country_from_name("\u{1F1E9}\u{1F1EA} Berlin"), "DE");
        assert_eq!(country_from_name("server \u{1F1EF}\u{1F1F5}"), "JP");
    }

    #[test]
    fn name_substrings() {
        assert_eq!(country_from_name("Frankfurt premium"), "DE");
        assert_eq!(country_from_name("My Tokyo Box"), "JP");
        assert_eq!(country_from_name("United States 3"), "US");
    }

    #[test]
    fn no_false_positive_from_ordinary_words() {
        // Lowercase words never count as bare codes: "My Server" is not
        // Malaysia.
        assert_eq!(country_from_name("My Server"), "UN");
        assert_eq!(country_from_name("Server One"), "UN");
        assert_eq!(country_from_name(""), "UN");
    }
}
