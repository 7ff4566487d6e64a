//! SHA-256 hashing utility.
//!
//! Fixed-size digests bind arbitrary-length content to the 32-byte
//! client data hash the attestation provider signs over.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of a byte buffer.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();

    let mut digest = [0u8; 32];
    digest.copy_from_slice(&result);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_deterministic() {
        assert_eq!(sha256(b"hello"), sha256(b"hello"));
        assert_ne!(sha256(b"hello"), sha256(b"world"));
    }

    #[test]
    fn test_sha256_empty_input() {
        // SHA-256 of the empty string, a fixed well-known value.
        let digest = sha256(b"");
        assert_eq!(
            digest[..4],
            [0xe3, 0xb0, 0xc4, 0x42],
            "empty-input digest should match the SHA-256 test vector"
        );
    }

    #[test]
    fn test_sha256_output_length() {
        assert_eq!(sha256(&[0u8; 1000]).len(), 32);
    }
}
