//! sources::key_value
//!
//! Sources backed by a string key/value store.
//!
//! # Design
//!
//! [`KeyValueStore`] is a minimal get/set/delete interface over string
//! slots. [`KeyValueSource`] keeps its document serialized as a JSON string
//! in the slot named after the source, so any store that can hold strings
//! (an in-process map, a TOML file, the OS keychain) can back a source.
//!
//! # Example
//!
//! ```
//! use settree::sources::{KeyValueSource, KeyValueStore, MemoryStore, Source};
//! use settree::tree::{Node, Setting, SettingKind};
//!
//! let store = MemoryStore::new();
//! let mut source = KeyValueSource::new("plug-in", store.clone());
//!
//! let setting = Setting::new("enabled", SettingKind::Bool).unwrap();
//! source.write(&[Node::from(&setting)], None).unwrap();
//!
//! assert!(store.get("plug-in").unwrap().is_some());
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use super::traits::{Source, SourceError};

/// Errors from key/value store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to read from the store.
    #[error("failed to read from store: {0}")]
    ReadError(String),

    /// Failed to write to the store.
    #[error("failed to write to store: {0}")]
    WriteError(String),

    /// Failed to delete from the store.
    #[error("failed to delete from store: {0}")]
    DeleteError(String),

    /// Store not available or not configured.
    #[error("store provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// A string key/value store.
///
/// Keys are stored as-is without interpretation.
pub trait KeyValueStore {
    /// Get a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value, overwriting any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value.
    ///
    /// Returns `Ok(())` even if the key did not exist.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Short description of the store, for messages.
    fn describe(&self) -> String;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// In-process store. Clones share the same map, so several sources can
/// use one store under different names.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory store".to_string()
    }
}

/// A source storing its document as a JSON string in a key/value store.
#[derive(Debug, Clone)]
pub struct KeyValueSource<S> {
    name: String,
    store: S,
}

impl<S: KeyValueStore> KeyValueSource<S> {
    pub fn new(name: impl Into<String>, store: S) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyValueStore> Source for KeyValueSource<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.store.describe(), self.name)
    }

    fn read_data_from_source(&self) -> Result<Option<Value>, SourceError> {
        let raw = self
            .store
            .get(&self.name)
            .map_err(|e| SourceError::Read(e.to_string()))?;
        match raw {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
                SourceError::InvalidFormat(format!("cannot parse data of '{}': {}", self.name, e))
            }),
        }
    }

    fn write_data_to_source(&mut self, data: Value) -> Result<(), SourceError> {
        let raw = serde_json::to_string(&data)
            .map_err(|e| SourceError::Write(format!("cannot serialize settings: {}", e)))?;
        self.store
            .set(&self.name, &raw)
            .map_err(|e| SourceError::Write(e.to_string()))
    }

    fn clear(&mut self) -> Result<(), SourceError> {
        self.store
            .delete(&self.name)
            .map_err(|e| SourceError::Write(e.to_string()))
    }
}
