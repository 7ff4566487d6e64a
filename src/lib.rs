//! Device-attestation and request-signing protocol client.
//!
//! Proves to a backend that API calls originate from a genuine, unmodified
//! app instance on a genuine device, without server-side session state
//! beyond a per-install key identifier.
//!
//! # Protocol
//!
//! - **Registration** (once per install): generate a hardware-bound key via
//!   the platform attestation provider, attest it against a server-issued
//!   nonce, enroll it with the backend, then persist the key identifier.
//! - **Signing** (per protected request): fetch a fresh nonce, hash a
//!   canonical `method|path|timestamp|bodyHash|nonce` payload, have the
//!   attested key sign it, and hand the caller a header set to attach to
//!   its own request.
//!
//! Collaborators are injected, so flows run deterministically in tests with
//! the bundled mocks.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use appattest_client::{
//!     AppAttestClient, AppAttestConfig, FileCredentialStore, MockAttestationProvider,
//!     ReqwestTransport,
//! };
//!
//! # async fn example() -> appattest_client::Result<()> {
//! let config = AppAttestConfig::new("https://api.example.com/prod");
//! let store = Arc::new(FileCredentialStore::new(
//!     std::path::Path::new("/var/app-data").join(&config.storage_key),
//! ));
//! // In production, supply the platform's attestation provider here.
//! let provider = Arc::new(MockAttestationProvider::default());
//! let transport = Arc::new(ReqwestTransport::new()?);
//!
//! let client = AppAttestClient::new(config, provider, store, transport);
//! client.register_if_needed().await?;
//!
//! let headers = client.signed_headers("POST", "/protected", Some(b"{}")).await?;
//! for (name, value) in headers.pairs() {
//!     println!("{name}: {value}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod digest;
pub mod encoding;
pub mod error;
pub mod nonce;
pub mod provider;
pub mod store;
pub mod transport;

// Re-export main types for convenience
pub use client::{
    AppAttestClient, AppAttestConfig, SignedHeaders, HEADER_ASSERTION, HEADER_BODY_SHA256,
    HEADER_KEY_ID, HEADER_NONCE, HEADER_TIMESTAMP, PLACEHOLDER_PUBLIC_KEY_PEM,
};
pub use digest::sha256;
pub use error::{AttestError, Result};
pub use nonce::{NonceFetcher, NoncePurpose};
pub use provider::{AttestationProvider, KeyId, MockAttestationProvider};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use transport::{HttpResponse, HttpTransport, MockTransport, ReqwestTransport};
