//! Mock attestation provider for testing.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use super::{AttestationProvider, KeyId};
use crate::error::{AttestError, Result};

/// Mock attestation provider for testing.
/// WARNING: Do not use in production - nothing is hardware-bound!
///
/// Returns fixed blobs and counts calls so tests can assert which provider
/// primitives a flow exercised. Configure an empty attestation or assertion
/// blob to simulate the platform returning nothing.
pub struct MockAttestationProvider {
    supported: bool,
    key_id: Option<String>,
    attestation: Vec<u8>,
    assertion: Vec<u8>,
    key_calls: AtomicU32,
    attest_calls: AtomicU32,
    assertion_calls: AtomicU32,
}

impl MockAttestationProvider {
    pub fn new(key_id: &str) -> Self {
        Self {
            supported: true,
            key_id: Some(key_id.to_string()),
            attestation: vec![0xAA; 16],
            assertion: vec![0xBB; 16],
            key_calls: AtomicU32::new(0),
            attest_calls: AtomicU32::new(0),
            assertion_calls: AtomicU32::new(0),
        }
    }

    /// A provider whose capability probe reports `false`.
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new("unsupported")
        }
    }

    /// A provider whose key generation yields no identifier.
    pub fn without_key_id() -> Self {
        Self {
            key_id: None,
            ..Self::new("")
        }
    }

    pub fn with_attestation(mut self, blob: Vec<u8>) -> Self {
        self.attestation = blob;
        self
    }

    pub fn with_assertion(mut self, blob: Vec<u8>) -> Self {
        self.assertion = blob;
        self
    }

    pub fn key_calls(&self) -> u32 {
        self.key_calls.load(Ordering::SeqCst)
    }

    pub fn attest_calls(&self) -> u32 {
        self.attest_calls.load(Ordering::SeqCst)
    }

    pub fn assertion_calls(&self) -> u32 {
        self.assertion_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAttestationProvider {
    fn default() -> Self {
        Self::new("mock-key-1")
    }
}

#[async_trait]
impl AttestationProvider for MockAttestationProvider {
    async fn is_supported(&self) -> bool {
        self.supported
    }

    async fn generate_key(&self) -> Result<KeyId> {
        self.key_calls.fetch_add(1, Ordering::SeqCst);
        match &self.key_id {
            Some(id) => Ok(KeyId::new(id.clone())),
            None => Err(AttestError::NoKeyIdGenerated),
        }
    }

    async fn attest_key(&self, _key_id: &KeyId, _client_data_hash: &[u8; 32]) -> Result<Vec<u8>> {
        self.attest_calls.fetch_add(1, Ordering::SeqCst);
        if self.attestation.is_empty() {
            return Err(AttestError::NoAttestation);
        }
        Ok(self.attestation.clone())
    }

    async fn generate_assertion(
        &self,
        _key_id: &KeyId,
        _client_data_hash: &[u8; 32],
    ) -> Result<Vec<u8>> {
        self.assertion_calls.fetch_add(1, Ordering::SeqCst);
        if self.assertion.is_empty() {
            return Err(AttestError::NoAssertion);
        }
        Ok(self.assertion.clone())
    }
}
