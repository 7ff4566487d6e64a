//! Base64 encoding helpers for the wire protocol.
//!
//! Binary blobs (attestation objects, assertions, body hashes) travel as
//! standard base64; nonces travel as unpadded base64url. Servers have been
//! observed to emit nonces in either alphabet, so decoding is tolerant.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Standard base64 with padding.
pub fn b64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// URL-safe base64 without padding, as used for the nonce headers.
pub fn b64url_nopad(data: &[u8]) -> String {
    STANDARD
        .encode(data)
        .replace('+', "-")
        .replace('/', "_")
        .trim_end_matches('=')
        .to_string()
}

/// Decode either standard base64 or base64url into bytes.
///
/// Tries a standard decode first; on failure, maps the URL-safe alphabet
/// back to standard and restores `=` padding to a multiple-of-4 length.
pub fn decode_b64_any(encoded: &str) -> Option<Vec<u8>> {
    if let Ok(bytes) = STANDARD.decode(encoded) {
        return Some(bytes);
    }

    let mut s = encoded.replace('-', "+").replace('_', "/");
    let pad = (4 - s.len() % 4) % 4;
    s.push_str(&"=".repeat(pad));
    STANDARD.decode(s).ok()
}
