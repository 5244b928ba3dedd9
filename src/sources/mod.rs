//! sources
//!
//! Persistence backends for settings trees.
//!
//! # Architecture
//!
//! Every backend implements the [`Source`] trait. Reconciliation of stored
//! documents with trees lives in the trait's provided methods and in
//! [`document`]; backends differ only in their medium:
//!
//! - [`MemorySource`]: document kept in the source itself
//! - [`JsonFileSource`]: JSON file shared by several source names
//! - [`KeyValueSource`]: document as a JSON string in a [`KeyValueStore`]
//!
//! Key/value stores:
//!
//! - [`MemoryStore`]: shared in-process map
//! - [`FileStore`]: TOML file, default `~/.settree/store.toml`
//! - [`KeychainStore`]: OS keychain (requires the `keychain` feature)
//!
//! # Provider Selection
//!
//! [`create_store`] and [`create_source`] build backends from
//! configuration values:
//!
//! ```
//! use settree::sources::create_store;
//!
//! let store = create_store("memory", None).unwrap();
//! assert!(create_store("carrier-pigeon", None).is_err());
//! ```

pub(crate) mod atomic;
pub mod document;
mod file_store;
mod json_file;
mod key_value;
mod keychain_store;
mod memory;
mod traits;

use std::path::Path;

pub use file_store::FileStore;
pub use json_file::JsonFileSource;
pub use key_value::{KeyValueSource, KeyValueStore, MemoryStore, StoreError};
pub use keychain_store::KeychainStore;
pub use memory::MemorySource;
pub use traits::{into_handle, HasData, ModifyDataFn, Source, SourceError, SourceHandle};

use crate::config::{SourceConfig, SourceKind};

/// The default key/value store provider name.
pub const DEFAULT_STORE: &str = "file";

/// Valid key/value store provider names.
pub const VALID_STORES: &[&str] = &["file", "keychain", "memory"];

/// Create a key/value store by provider name.
///
/// # Providers
///
/// - `"file"`: [`FileStore`] at `path`, or `~/.settree/store.toml`
/// - `"keychain"`: [`KeychainStore`] (requires the `keychain` feature)
/// - `"memory"`: a fresh [`MemoryStore`]
///
/// # Errors
///
/// - Unknown provider name
/// - Keychain provider without the `keychain` feature enabled
/// - Home directory not found for the default file store
pub fn create_store(
    provider: &str,
    path: Option<&Path>,
) -> Result<Box<dyn KeyValueStore>, StoreError> {
    match provider {
        "file" => match path {
            Some(path) => Ok(Box::new(FileStore::with_path(path))),
            None => Ok(Box::new(FileStore::new()?)),
        },
        "keychain" => Ok(Box::new(KeychainStore::new()?)),
        "memory" => Ok(Box::new(MemoryStore::new())),
        other => Err(StoreError::ProviderNotAvailable(format!(
            "unknown store provider: '{}' (valid: {})",
            other,
            VALID_STORES.join(", ")
        ))),
    }
}

/// Create a source from one configured source entry.
pub fn create_source(config: &SourceConfig) -> Result<SourceHandle, StoreError> {
    match config.kind {
        SourceKind::JsonFile => {
            let path = config.path.as_ref().ok_or_else(|| {
                StoreError::ProviderNotAvailable(format!(
                    "json_file source '{}' requires a path",
                    config.name
                ))
            })?;
            Ok(into_handle(JsonFileSource::new(&config.name, path)))
        }
        SourceKind::KeyValue => {
            let provider = config.store.as_deref().unwrap_or(DEFAULT_STORE);
            let store = create_store(provider, config.path.as_deref())?;
            Ok(into_handle(KeyValueSource::new(&config.name, store)))
        }
        SourceKind::Memory => Ok(into_handle(MemorySource::new(&config.name))),
    }
}
