//! sources::keychain_store
//!
//! Key/value store in the OS keychain.
//!
//! Uses the `keyring` crate (macOS Keychain, Windows Credential Manager,
//! Linux Secret Service). Only functional with the `keychain` feature;
//! without it every operation reports the provider as unavailable.

#[cfg(feature = "keychain")]
use keyring::Entry;

use super::key_value::{KeyValueStore, StoreError};

/// Default keychain service name for settings entries.
pub const DEFAULT_SERVICE: &str = "settree";

/// Key/value store backed by the OS keychain.
#[derive(Debug, Clone)]
pub struct KeychainStore {
    /// Service name for keychain entries
    service: String,
}

impl KeychainStore {
    /// Create a keychain store using [`DEFAULT_SERVICE`].
    ///
    /// # Errors
    ///
    /// Fails when compiled without the `keychain` feature.
    pub fn new() -> Result<Self, StoreError> {
        Self::with_service(DEFAULT_SERVICE)
    }

    /// Create a keychain store with a custom service name.
    pub fn with_service(service: impl Into<String>) -> Result<Self, StoreError> {
        if cfg!(feature = "keychain") {
            Ok(Self {
                service: service.into(),
            })
        } else {
            Err(not_enabled())
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    #[cfg(feature = "keychain")]
    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Entry::new(&self.service, key)
            .map_err(|e| StoreError::ReadError(format!("cannot create keyring entry: {}", e)))
    }
}

fn not_enabled() -> StoreError {
    StoreError::ProviderNotAvailable(
        "keychain support not enabled (compile with --features keychain)".into(),
    )
}

#[cfg(feature = "keychain")]
impl KeyValueStore for KeychainStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::Ambiguous(_)) => {
                Err(StoreError::ReadError("ambiguous keychain entry".to_string()))
            }
            Err(e) => Err(StoreError::ReadError(format!(
                "cannot read from keychain: {}",
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| StoreError::WriteError(format!("cannot write to keychain: {}", e)))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::DeleteError(format!(
                "cannot delete from keychain: {}",
                e
            ))),
        }
    }

    fn describe(&self) -> String {
        format!("keychain:{}", self.service)
    }
}

#[cfg(not(feature = "keychain"))]
impl KeyValueStore for KeychainStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(not_enabled())
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(not_enabled())
    }

    fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(not_enabled())
    }

    fn describe(&self) -> String {
        format!("keychain:{}", self.service)
    }
}
