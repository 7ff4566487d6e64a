//! Device key-attestation providers.
//!
//! The platform attestation service (secure-enclave backed on real devices)
//! is modeled as a trait so flows can be driven deterministically in tests.
//!
//! A provider exposes three primitives: generate a hardware-bound keypair
//! and return its opaque identifier, produce a one-time attestation object
//! proving the key is genuine, and produce a per-request assertion
//! (signature) with a previously attested key. Every primitive may suspend
//! on a secure-hardware round trip, so all are async.

mod mock;

pub use mock::MockAttestationProvider;

use async_trait::async_trait;

use crate::error::Result;

/// Opaque identifier for a hardware-bound attestation key.
///
/// Created once per install by the provider; its presence in the credential
/// store is what marks an install as registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyId(String);

impl KeyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for KeyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Trait for platform device key-attestation services.
///
/// Implementations must be thread-safe (`Send + Sync`). Callers must check
/// [`is_supported`](Self::is_supported) before any other call; on
/// unsupported platforms every other operation fails.
#[async_trait]
pub trait AttestationProvider: Send + Sync {
    /// Capability probe: whether this platform can attest keys at all.
    async fn is_supported(&self) -> bool;

    /// Generate a hardware-bound keypair and return its identifier.
    ///
    /// Fails with [`NoKeyIdGenerated`](crate::AttestError::NoKeyIdGenerated)
    /// if the platform yields no identifier. Safe to call again after a
    /// failed registration; orphaned device keys are not cleaned up.
    async fn generate_key(&self) -> Result<KeyId>;

    /// Produce a one-time attestation object proving key authenticity,
    /// bound to `client_data_hash`.
    ///
    /// Fails with [`NoAttestation`](crate::AttestError::NoAttestation) if
    /// the platform returns an empty object.
    async fn attest_key(&self, key_id: &KeyId, client_data_hash: &[u8; 32]) -> Result<Vec<u8>>;

    /// Sign `client_data_hash` with a previously attested key.
    ///
    /// Fails with [`NoAssertion`](crate::AttestError::NoAssertion) if the
    /// platform returns an empty signature.
    async fn generate_assertion(
        &self,
        key_id: &KeyId,
        client_data_hash: &[u8; 32],
    ) -> Result<Vec<u8>>;
}
