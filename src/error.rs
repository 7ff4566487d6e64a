use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttestError {
    #[error("device key attestation is not supported on this platform")]
    Unsupported,

    #[error("no attestation key id stored; run registration first")]
    MissingKeyId,

    #[error("server returned HTTP {0}")]
    BadHttpStatus(u16),

    #[error("invalid server response: {0}")]
    BadServerResponse(String),

    #[error("nonce missing or invalid")]
    InvalidNonce,

    #[error("platform returned no attestation object")]
    NoAttestation,

    #[error("platform returned no assertion")]
    NoAssertion,

    #[error("platform generated no key id")]
    NoKeyIdGenerated,

    #[error("attestation provider error: {0}")]
    Provider(String),

    #[error("credential storage error: {0}")]
    Storage(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, AttestError>;
