//! Lenient base64 decoding for share-link payloads.
//!
//! Subscription feeds mix alphabets and padding freely. Decoding tries the
//! standard alphabet first, then URL-safe, each with and without padding,
//! and finally retries with whitespace stripped and padding normalized.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::LinkError;

/// Decode with every accepted alphabet/padding combination.
pub fn decode(input: &str) -> Result<Vec<u8>, LinkError> {
    let trimmed = input.trim();

    for engine in [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD] {
        if let Ok(bytes) = engine.decode(trimmed) {
            return Ok(bytes);
        }
    }

    // Retry with embedded whitespace removed and padding rebuilt to a
    // multiple of four; feeds truncate or double the `=` suffix routinely.
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .trim_end_matches('=')
        .to_string();
    let padded = match cleaned.len() % 4 {
        0 => cleaned,
        n => format!("{}{}", cleaned, "=".repeat(4 - n)),
    };
    for engine in [&STANDARD, &URL_SAFE] {
        if let Ok(bytes) = engine.decode(&padded) {
            return Ok(bytes);
        }
    }

    Err(LinkError::Base64)
}

/// Decode into UTF-8 text.
pub fn decode_string(input: &str) -> Result<String, LinkError> {
    String::from_utf8(decode(input)?).map_err(|_| LinkError::Base64)
}

/// Standard-alphabet, padded encoding (the VMess payload convention).
pub fn encode_standard(input: &[u8]) -> String {
    STANDARD.encode(input)
}

/// URL-safe, unpadded encoding (the SIP002 userinfo convention).
pub fn encode_url_safe(input: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_all_alphabets_and_paddings() {
        // "aes-256-gcm:password" in the four variants
        assert!(decode("YWVzLTI1Ni1nY206cGFzc3dvcmQ=").is_ok());
        assert!(decode("YWVzLTI1Ni1nY206cGFzc3dvcmQ").is_ok());
        // bytes that differ between alphabets: 0xfb 0xff -> "+/8" vs "-_8"
        assert_eq!(decode("+/8=").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode("-_8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn repairs_padding_and_whitespace() {
        assert_eq!(decode_string("dGVz dA==").unwrap(), "test");
        assert_eq!(decode_string("dGVzdA===").unwrap(), "test");
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(decode("!!!not base64!!!"), Err(LinkError::Base64));
    }

    #[test]
    fn encode_decode_inverse() {
        let data = b"method:pass@host:1234";
        assert_eq!(decode(&encode_standard(data)).unwrap(), data);
        assert_eq!(decode(&encode_url_safe(data)).unwrap(), data);
    }
}
