//! Storage collaborator seams.
//!
//! The credential and the extension settings live outside the reply core. These traits
//! are what the request client and the settings channel read through; the `database`
//! crate provides the SQLite-backed implementation.

use crate::{ExtensionSettings, StorageError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Primary storage key of the generation API key.
pub const CREDENTIAL_KEY: &str = "hf_api_key";
/// Older key still read when the primary one is empty.
pub const LEGACY_CREDENTIAL_KEY: &str = "mistral_api_key";

#[allow(async_fn_in_trait)]
pub trait CredentialStore {
    /// Returns the stored API key, `None` when nothing usable is stored.
    async fn read_credential(&self) -> Result<Option<String>, StorageError>;
}

#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    async fn load_settings(&self) -> Result<ExtensionSettings, StorageError>;
    async fn save_settings(&self, settings: &ExtensionSettings) -> Result<(), StorageError>;
}

impl<T: CredentialStore> CredentialStore for Arc<T> {
    async fn read_credential(&self) -> Result<Option<String>, StorageError> {
        self.as_ref().read_credential().await
    }
}

impl<T: SettingsStore> SettingsStore for Arc<T> {
    async fn load_settings(&self) -> Result<ExtensionSettings, StorageError> {
        self.as_ref().load_settings().await
    }

    async fn save_settings(&self, settings: &ExtensionSettings) -> Result<(), StorageError> {
        self.as_ref().save_settings(settings).await
    }
}

/// In-process credential holder, used where no persistent store is wired in.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<String>>,
    fail_reads: Mutex<bool>,
    reads: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new(credential: Option<String>) -> Self {
        Self {
            credential: Mutex::new(credential),
            ..Default::default()
        }
    }

    pub fn set(&self, credential: Option<String>) {
        if let Ok(mut slot) = self.credential.lock() {
            *slot = credential;
        }
    }

    /// Makes subsequent reads fail, simulating an unavailable store.
    pub fn fail_reads(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_reads.lock() {
            *flag = fail;
        }
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn read_credential(&self) -> Result<Option<String>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let failing = self.fail_reads.lock().map(|flag| *flag).unwrap_or(true);
        if failing {
            return Err(StorageError::ConnectionFailed {
                reason: "credential store unavailable".to_string(),
            });
        }

        let credential = self
            .credential
            .lock()
            .map_err(|_| StorageError::DatabaseLocked)?
            .clone();
        Ok(credential.filter(|value| !value.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_treats_blank_as_absent() {
        let store = MemoryCredentialStore::new(Some("   ".to_string()));
        let value = tokio_test::block_on(store.read_credential()).unwrap();
        assert_eq!(value, None);
        assert_eq!(store.read_count(), 1);
    }

    #[test]
    fn test_memory_store_failure_mode() {
        let store = Arc::new(MemoryCredentialStore::new(Some("hf_key".to_string())));
        store.fail_reads(true);
        assert!(tokio_test::block_on(store.read_credential()).is_err());

        store.fail_reads(false);
        let value = tokio_test::block_on(store.read_credential()).unwrap();
        assert_eq!(value.as_deref(), Some("hf_key"));
    }
}
