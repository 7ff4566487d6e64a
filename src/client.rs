//! Registration and request-signing flows.
//!
//! [`AppAttestClient`] orchestrates the one-time enrollment of a
//! hardware-bound key with the backend and, afterwards, the production of
//! signed headers for each protected request. Collaborators (attestation
//! provider, credential store, transport) are injected so both flows run
//! deterministically under test.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::digest::sha256;
use crate::encoding::{b64, b64url_nopad};
use crate::error::{AttestError, Result};
use crate::nonce::{NonceFetcher, NoncePurpose};
use crate::provider::AttestationProvider;
use crate::store::CredentialStore;
use crate::transport::HttpTransport;

/// Header carrying the attestation key identifier.
pub const HEADER_KEY_ID: &str = "X-AppAttest-KeyId";
/// Header carrying the base64 assertion over the canonical payload.
pub const HEADER_ASSERTION: &str = "X-AppAttest-Assertion";
/// Header carrying the base64url request nonce.
pub const HEADER_NONCE: &str = "X-Req-Nonce";
/// Header carrying the decimal Unix timestamp.
pub const HEADER_TIMESTAMP: &str = "X-Req-Timestamp";
/// Header carrying the base64 SHA-256 of the request body.
pub const HEADER_BODY_SHA256: &str = "X-Body-SHA256";

/// Stand-in PEM sent in the registration body.
///
/// The server contract requires the field but verifies the key via the
/// attestation object, not this value.
// TODO: derive the PEM from the attested key's public half once the backend
// starts validating it.
pub const PLACEHOLDER_PUBLIC_KEY_PEM: &str =
    "-----BEGIN PUBLIC KEY-----\nUNRESOLVED\n-----END PUBLIC KEY-----";

/// Client configuration, immutable for the process lifetime.
#[derive(Debug, Clone)]
pub struct AppAttestConfig {
    /// Base URL of the API, without trailing slash
    /// (e.g. `https://xxxx.execute-api.us-west-2.amazonaws.com/prod`).
    pub base_url: String,
    /// Path of the nonce endpoint.
    pub nonce_path: String,
    /// Path of the registration endpoint.
    pub register_path: String,
    /// Name under which the key id is persisted locally; file-backed stores
    /// typically use it as the file name.
    pub storage_key: String,
    /// PEM string sent in the registration body.
    pub public_key_pem: String,
}

impl AppAttestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            nonce_path: "/nonce".to_string(),
            register_path: "/register".to_string(),
            storage_key: "AppAttest.keyId".to_string(),
            public_key_pem: PLACEHOLDER_PUBLIC_KEY_PEM.to_string(),
        }
    }
}

/// Header set proving a single protected request came from this install.
///
/// The caller attaches these to its own outgoing request untouched; the
/// signing flow performs no network call for the protected request itself.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    pub key_id: String,
    pub assertion_b64: String,
    pub nonce_b64url: String,
    pub timestamp: String,
    pub body_sha256_b64: String,
}

impl SignedHeaders {
    /// Header name / value pairs in wire form.
    pub fn pairs(&self) -> [(&'static str, &str); 5] {
        [
            (HEADER_KEY_ID, self.key_id.as_str()),
            (HEADER_ASSERTION, self.assertion_b64.as_str()),
            (HEADER_NONCE, self.nonce_b64url.as_str()),
            (HEADER_TIMESTAMP, self.timestamp.as_str()),
            (HEADER_BODY_SHA256, self.body_sha256_b64.as_str()),
        ]
    }
}

/// Device-attestation protocol client.
///
/// Call [`register_if_needed`](Self::register_if_needed) once per install,
/// then [`signed_headers`](Self::signed_headers) for each protected request.
pub struct AppAttestClient {
    config: AppAttestConfig,
    provider: Arc<dyn AttestationProvider>,
    store: Arc<dyn CredentialStore>,
    transport: Arc<dyn HttpTransport>,
    nonces: NonceFetcher,
    // Serializes first-time registration; two racing calls would otherwise
    // both pass the store guard and enroll under different keys.
    registration: Mutex<()>,
}

impl AppAttestClient {
    pub fn new(
        config: AppAttestConfig,
        provider: Arc<dyn AttestationProvider>,
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let nonces = NonceFetcher::new(
            transport.clone(),
            config.base_url.clone(),
            config.nonce_path.clone(),
        );
        Self {
            config,
            provider,
            store,
            transport,
            nonces,
            registration: Mutex::new(()),
        }
    }

    /// One-time registration per install. Safe to call repeatedly; a stored
    /// key id makes it a no-op.
    ///
    /// The key id is persisted only after the server confirms enrollment
    /// with HTTP 200. Persisting earlier would leave a local "registered"
    /// state for a key the server never learned about. A crash mid-flow
    /// restarts from scratch on the next invocation; the orphaned device
    /// key is not cleaned up.
    #[instrument(level = "info", skip(self))]
    pub async fn register_if_needed(&self) -> Result<()> {
        if !self.provider.is_supported().await {
            return Err(AttestError::Unsupported);
        }

        let _guard = self.registration.lock().await;
        if self.store.get()?.is_some() {
            debug!("key id already stored, registration is a no-op");
            return Ok(());
        }

        let key_id = self.provider.generate_key().await?;
        debug!(%key_id, "generated attestation key");

        let nonce = self.nonces.fetch(NoncePurpose::Attestation).await?;
        let client_data_hash = sha256(&nonce);
        let attestation = self.provider.attest_key(&key_id, &client_data_hash).await?;
        debug!(attestation_len = attestation.len(), "attested key");

        // The challenge echoes the server-issued nonce in base64url form so
        // the server can tie the enrollment back to it.
        let body = serde_json::json!({
            "keyId": key_id.as_str(),
            "attestationB64": b64(&attestation),
            "clientDataHashB64": b64(&client_data_hash),
            "publicKeyPem": self.config.public_key_pem,
            "challenge": b64url_nopad(&nonce),
        });
        let url = format!("{}{}", self.config.base_url, self.config.register_path);
        let response = self.transport.post_json(&url, &body).await?;
        if response.status != 200 {
            return Err(AttestError::BadHttpStatus(response.status));
        }

        // Only now, after server confirmation, does the install count as
        // registered.
        self.store.set(&key_id)?;
        info!(%key_id, "registration complete, key id saved");
        Ok(())
    }

    /// Produce the headers required by the protected API for one request.
    ///
    /// `path` must match what the server reconstructs (e.g. `/protected`);
    /// pass `None` as `body` for GET/HEAD. Fails with
    /// [`MissingKeyId`](AttestError::MissingKeyId) before touching the
    /// network when the install is unregistered.
    #[instrument(level = "debug", skip(self, body))]
    pub async fn signed_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<SignedHeaders> {
        let key_id = self.store.get()?.ok_or(AttestError::MissingKeyId)?;

        let timestamp = unix_timestamp();
        let nonce = self.nonces.fetch(NoncePurpose::Request).await?;
        let body_hash = sha256(body.unwrap_or_default());

        let payload = canonical_payload(method, path, timestamp, &body_hash, &nonce);
        let client_data_hash = sha256(&payload);
        let assertion = self
            .provider
            .generate_assertion(&key_id, &client_data_hash)
            .await?;
        debug!(assertion_len = assertion.len(), "generated assertion");

        Ok(SignedHeaders {
            key_id: key_id.as_str().to_string(),
            assertion_b64: b64(&assertion),
            nonce_b64url: b64url_nopad(&nonce),
            timestamp: timestamp.to_string(),
            body_sha256_b64: b64(&body_hash),
        })
    }

    /// Clears the local registration, forcing a new key and re-attestation
    /// on the next [`register_if_needed`](Self::register_if_needed).
    pub fn reset_local_registration(&self) -> Result<()> {
        self.store.clear()
    }
}

/// Canonical signing payload: `METHOD|path|timestamp|bodyHash|nonce`.
///
/// Byte-exact order and the literal `|` (0x7C) separators are load-bearing;
/// server-side verification reconstructs the identical buffer. The hash and
/// nonce segments are raw bytes, not encoded text.
fn canonical_payload(
    method: &str,
    path: &str,
    timestamp: u64,
    body_hash: &[u8; 32],
    nonce: &[u8],
) -> Vec<u8> {
    let timestamp = timestamp.to_string();
    let mut payload = Vec::with_capacity(
        method.len() + path.len() + timestamp.len() + body_hash.len() + nonce.len() + 4,
    );
    payload.extend_from_slice(method.to_uppercase().as_bytes());
    payload.push(0x7C);
    payload.extend_from_slice(path.as_bytes());
    payload.push(0x7C);
    payload.extend_from_slice(timestamp.as_bytes());
    payload.push(0x7C);
    payload.extend_from_slice(body_hash);
    payload.push(0x7C);
    payload.extend_from_slice(nonce);
    payload
}

/// Current Unix time in whole seconds. A clock before the epoch is not a
/// supported configuration.
fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
