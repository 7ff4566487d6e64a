//! Server-issued challenge nonces.
//!
//! Every registration and every signed request consumes one fresh nonce.
//! Nonces are never persisted and never reused; the raw bytes are the
//! canonical form for hashing, the base64url string is the wire form.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::encoding::decode_b64_any;
use crate::error::{AttestError, Result};
use crate::transport::HttpTransport;

/// Minimum accepted nonce length in bytes.
const MIN_NONCE_LEN: usize = 32;

/// What a nonce will be consumed for; the server scopes nonces by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoncePurpose {
    /// One-time key enrollment.
    Attestation,
    /// A single signed request.
    Request,
}

impl std::fmt::Display for NoncePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Attestation => f.write_str("attestation"),
            Self::Request => f.write_str("request"),
        }
    }
}

/// Nonce endpoint response. Servers emit `nonceB64`, older deployments
/// emit `nonce`; either field may carry standard base64 or base64url.
#[derive(Debug, Deserialize)]
struct NonceResponse {
    #[serde(rename = "nonceB64")]
    nonce_b64: Option<String>,
    nonce: Option<String>,
}

/// Fetches fresh challenge nonces from the backend.
pub struct NonceFetcher {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    nonce_path: String,
}

impl NonceFetcher {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        nonce_path: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            nonce_path: nonce_path.into(),
        }
    }

    /// Fetch a fresh nonce and return its raw bytes.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, purpose: NoncePurpose) -> Result<Vec<u8>> {
        let url = format!("{}{}?purpose={purpose}", self.base_url, self.nonce_path);
        let response = self.transport.get(&url).await?;

        if response.status != 200 {
            return Err(AttestError::BadHttpStatus(response.status));
        }

        let parsed: NonceResponse =
            serde_json::from_slice(&response.body).map_err(|_| AttestError::InvalidNonce)?;

        let encoded = parsed
            .nonce_b64
            .or(parsed.nonce)
            .ok_or(AttestError::InvalidNonce)?;

        let bytes = decode_b64_any(&encoded).ok_or(AttestError::InvalidNonce)?;
        if bytes.len() < MIN_NONCE_LEN {
            return Err(AttestError::InvalidNonce);
        }

        debug!(nonce_len = bytes.len(), "fetched nonce");
        Ok(bytes)
    }
}
