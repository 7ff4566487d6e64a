//! Local credential storage for the attestation key identifier.
//!
//! A single opaque value persisted per install; absence means "not yet
//! registered". Last write wins, no further concurrency control needed.

use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{AttestError, Result};
use crate::provider::KeyId;

/// Durable single-value storage for the attestation [`KeyId`].
pub trait CredentialStore: Send + Sync {
    /// Returns the stored key identifier, or `None` if unregistered.
    fn get(&self) -> Result<Option<KeyId>>;

    /// Persists the key identifier, replacing any previous value.
    fn set(&self, key_id: &KeyId) -> Result<()>;

    /// Removes the stored key identifier, forcing re-registration.
    fn clear(&self) -> Result<()>;
}

/// In-memory credential store. Holds nothing across process runs, so it is
/// only suitable for tests and ephemeral installs.
#[derive(Default)]
pub struct MemoryCredentialStore {
    value: RwLock<Option<KeyId>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<KeyId>> {
        Ok(self
            .value
            .read()
            .map_err(|e| AttestError::Storage(format!("lock poisoned: {e}")))?
            .clone())
    }

    fn set(&self, key_id: &KeyId) -> Result<()> {
        *self
            .value
            .write()
            .map_err(|e| AttestError::Storage(format!("lock poisoned: {e}")))? =
            Some(key_id.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .value
            .write()
            .map_err(|e| AttestError::Storage(format!("lock poisoned: {e}")))? = None;
        Ok(())
    }
}

/// File-backed credential store.
///
/// Writes go to a temporary file in the same directory followed by a rename,
/// so readers never observe a partially written value.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<KeyId>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(KeyId::new(trimmed)))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AttestError::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn set(&self, key_id: &KeyId) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let tmp = dir.join(format!(
            ".{}.tmp",
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "keyid".to_string())
        ));

        let write = |path: &std::path::Path| -> std::io::Result<()> {
            let mut file = std::fs::File::create(path)?;
            file.write_all(key_id.as_str().as_bytes())?;
            file.sync_all()
        };

        write(&tmp)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| {
                AttestError::Storage(format!("failed to write {}: {e}", self.path.display()))
            })
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AttestError::Storage(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.get().unwrap(), None);

        store.set(&KeyId::new("K1")).unwrap();
        assert_eq!(store.get().unwrap(), Some(KeyId::new("K1")));

        store.set(&KeyId::new("K2")).unwrap();
        assert_eq!(store.get().unwrap(), Some(KeyId::new("K2")));

        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("keyid"));

        assert_eq!(store.get().unwrap(), None);
        store.set(&KeyId::new("hardware-key-id")).unwrap();
        assert_eq!(store.get().unwrap(), Some(KeyId::new("hardware-key-id")));

        // Re-opening the same path sees the persisted value.
        let reopened = FileCredentialStore::new(dir.path().join("keyid"));
        assert_eq!(reopened.get().unwrap(), Some(KeyId::new("hardware-key-id")));

        store.clear().unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_file_store_clear_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("never-written"));
        assert!(store.clear().is_ok());
    }
}
