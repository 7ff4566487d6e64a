//! End-to-end flow tests over the public API, with all collaborators mocked.

use std::sync::Arc;

use appattest_client::{
    encoding, sha256, AppAttestClient, AppAttestConfig, AttestError, CredentialStore,
    FileCredentialStore, KeyId, MockAttestationProvider, MockTransport,
};

const BASE: &str = "https://api.example.com";

fn zero_nonce_body() -> Vec<u8> {
    format!(
        r#"{{"nonce":"{}","expiresIn":120}}"#,
        encoding::b64url_nopad(&[0u8; 32])
    )
    .into_bytes()
}

#[tokio::test]
async fn register_then_sign_produces_expected_headers() {
    let provider = Arc::new(
        MockAttestationProvider::new("K1")
            .with_attestation(vec![0xAA; 16])
            .with_assertion(vec![0xBB; 16]),
    );
    let dir = tempfile::tempdir().unwrap();
    let config = AppAttestConfig::new(BASE);
    let store = Arc::new(FileCredentialStore::new(dir.path().join(&config.storage_key)));
    let transport = Arc::new(MockTransport::new());
    transport.on("/nonce", 200, zero_nonce_body());
    transport.on("/register", 200, Vec::new());

    let client = AppAttestClient::new(config, provider, store, transport);
    client.register_if_needed().await.unwrap();

    let headers = client
        .signed_headers("POST", "/protected", Some(b"payload"))
        .await
        .unwrap();

    assert_eq!(headers.key_id, "K1");
    assert_eq!(headers.assertion_b64, encoding::b64(&[0xBB; 16]));
    assert_eq!(headers.nonce_b64url, encoding::b64url_nopad(&[0u8; 32]));
    assert_eq!(headers.body_sha256_b64, encoding::b64(&sha256(b"payload")));
}

#[tokio::test]
async fn registration_survives_process_restart_via_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("AppAttest.keyId");
    let transport = Arc::new(MockTransport::new());
    transport.on("/nonce", 200, zero_nonce_body());
    transport.on("/register", 200, Vec::new());

    {
        let client = AppAttestClient::new(
            AppAttestConfig::new(BASE),
            Arc::new(MockAttestationProvider::new("K1")),
            Arc::new(FileCredentialStore::new(&path)),
            transport.clone(),
        );
        client.register_if_needed().await.unwrap();
    }

    // A fresh client over the same storage path sees the enrollment and
    // makes no further network calls.
    let calls_before = transport.request_count();
    let client = AppAttestClient::new(
        AppAttestConfig::new(BASE),
        Arc::new(MockAttestationProvider::new("K2")),
        Arc::new(FileCredentialStore::new(&path)),
        transport.clone(),
    );
    client.register_if_needed().await.unwrap();
    assert_eq!(transport.request_count(), calls_before);

    // And it signs with the originally enrolled key id.
    let headers = client.signed_headers("GET", "/protected", None).await.unwrap();
    assert_eq!(headers.key_id, "K1");
}

#[tokio::test]
async fn failed_enrollment_leaves_install_unregistered() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("keyid")));
    let transport = Arc::new(MockTransport::new());
    transport.on("/nonce", 200, zero_nonce_body());
    transport.on("/register", 500, Vec::new());

    let client = AppAttestClient::new(
        AppAttestConfig::new(BASE),
        Arc::new(MockAttestationProvider::new("K1")),
        store.clone(),
        transport,
    );

    assert!(matches!(
        client.register_if_needed().await,
        Err(AttestError::BadHttpStatus(500))
    ));
    assert_eq!(store.get().unwrap(), None);

    // Signing afterwards fails the registration precondition.
    assert!(matches!(
        client.signed_headers("GET", "/protected", None).await,
        Err(AttestError::MissingKeyId)
    ));
}

#[tokio::test]
async fn invalid_nonce_aborts_registration_before_attestation() {
    let provider = Arc::new(MockAttestationProvider::new("K1"));
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("keyid")));
    let transport = Arc::new(MockTransport::new());
    transport.on("/nonce", 200, br#"{"expiresIn":120}"#.to_vec());

    let client = AppAttestClient::new(
        AppAttestConfig::new(BASE),
        provider.clone(),
        store.clone(),
        transport,
    );

    assert!(matches!(
        client.register_if_needed().await,
        Err(AttestError::InvalidNonce)
    ));
    assert_eq!(provider.attest_calls(), 0, "flow must stop at the bad nonce");
    assert_eq!(store.get().unwrap(), None);
}

#[tokio::test]
async fn reset_forces_new_enrollment() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileCredentialStore::new(dir.path().join("keyid")));
    store.set(&KeyId::new("stale")).unwrap();
    let transport = Arc::new(MockTransport::new());
    transport.on("/nonce", 200, zero_nonce_body());
    transport.on("/register", 200, Vec::new());

    let client = AppAttestClient::new(
        AppAttestConfig::new(BASE),
        Arc::new(MockAttestationProvider::new("K1")),
        store.clone(),
        transport,
    );

    client.reset_local_registration().unwrap();
    client.register_if_needed().await.unwrap();
    assert_eq!(store.get().unwrap(), Some(KeyId::new("K1")));
}
