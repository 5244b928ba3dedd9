//! sources::file_store
//!
//! Key/value store kept in a TOML file, default `~/.settree/store.toml`.
//!
//! Each slot holds the serialized document of one source, keyed by source
//! name, under a `[slots]` table:
//!
//! ```toml
//! [slots]
//! plug-in = '[{"name":"root","settings":[]}]'
//! ```
//!
//! The file is private to its owner on Unix and replaced atomically.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::atomic::{self, Access};
use super::key_value::{KeyValueStore, StoreError};

/// On-disk layout of a [`FileStore`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct Slots {
    #[serde(default)]
    slots: BTreeMap<String, String>,
}

/// Key/value store kept in a TOML file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at `~/.settree/store.toml`.
    ///
    /// # Errors
    ///
    /// `ProviderNotAvailable` when the home directory is unknown.
    pub fn new() -> Result<Self, StoreError> {
        let home = dirs::home_dir().ok_or_else(|| {
            StoreError::ProviderNotAvailable("no home directory for the file store".into())
        })?;
        Ok(Self::with_path(home.join(".settree").join("store.toml")))
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current slots. A missing file has none.
    fn load(&self) -> Result<Slots, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Slots::default()),
            Err(e) => return Err(StoreError::ReadError(self.failure("read", e))),
        };
        toml::from_str(&text).map_err(|e| StoreError::ReadError(self.failure("parse", e)))
    }

    fn store(&self, slots: &Slots) -> Result<(), StoreError> {
        let text = toml::to_string_pretty(slots)
            .map_err(|e| StoreError::WriteError(self.failure("encode", e)))?;
        atomic::replace_file(&self.path, text.as_bytes(), Access::Private)
            .map_err(|e| StoreError::WriteError(self.failure("replace", e)))?;
        debug!(path = %self.path.display(), slots = slots.slots.len(), "wrote store file");
        Ok(())
    }

    fn failure(&self, action: &str, error: impl std::fmt::Display) -> String {
        format!("{} {}: {}", action, self.path.display(), error)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.slots.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut current = self.load()?;
        current.slots.insert(key.to_string(), value.to_string());
        self.store(&current)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut current = self.load()?;
        match current.slots.remove(key) {
            Some(_) => self.store(&current),
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{KeyValueSource, Source};
    use crate::tree::{Node, Setting, SettingKind};
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> FileStore {
        FileStore::with_path(temp.path().join("store.toml"))
    }

    #[test]
    fn slots_are_independent() {
        let temp = TempDir::new().expect("create temp dir");
        let store = store_in(&temp);
        assert!(store.get("plug-in").expect("get").is_none());

        store.set("plug-in", "[]").expect("set");
        store.set("plug-in-last-run", "[1]").expect("set");
        store.delete("plug-in").expect("delete");

        assert!(store.get("plug-in").expect("get").is_none());
        assert_eq!(store.get("plug-in-last-run").expect("get"), Some("[1]".into()));
        store.delete("plug-in").expect("deleting an empty slot");
    }

    #[test]
    fn documents_are_kept_under_slots_table() {
        let temp = TempDir::new().expect("create temp dir");
        let store = store_in(&temp);
        let document = r#"[{"name":"root","settings":[{"name":"path","value":"C:\\images\n"}]}]"#;

        store.set("plug-in", document).expect("set");

        let text = fs::read_to_string(store.path()).expect("read");
        let parsed: toml::Table = toml::from_str(&text).expect("valid toml");
        assert_eq!(parsed["slots"]["plug-in"].as_str(), Some(document));
        let reopened = FileStore::with_path(store.path());
        assert_eq!(reopened.get("plug-in").expect("get"), Some(document.into()));
    }

    #[test]
    fn backs_a_key_value_source() {
        let temp = TempDir::new().expect("create temp dir");
        let setting = Setting::builder("quality", SettingKind::int())
            .default_value(90)
            .build()
            .expect("valid");
        let mut source = KeyValueSource::new("plug-in", store_in(&temp));

        setting.set_value(70).expect("set value");
        source.write(&[Node::from(&setting)], None).expect("write");
        setting.reset().expect("reset");
        source.read(&[Node::from(&setting)], None).expect("read");

        assert_eq!(setting.value(), json!(70));
    }

    #[test]
    fn missing_file_is_not_created_by_delete() {
        let temp = TempDir::new().expect("create temp dir");
        let store = store_in(&temp);
        store.delete("nothing").expect("delete");
        assert!(!store.path().exists());
    }

    #[test]
    fn unparsable_file_is_a_read_error() {
        let temp = TempDir::new().expect("create temp dir");
        let store = store_in(&temp);
        fs::write(store.path(), "slots = [unclosed").expect("write bad toml");

        let err = store.get("plug-in").unwrap_err();
        assert!(matches!(err, StoreError::ReadError(_)));
        assert!(err.to_string().contains("parse"));
    }

    #[cfg(unix)]
    #[test]
    fn store_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().expect("create temp dir");
        let store = store_in(&temp);
        store.set("plug-in", "[]").expect("set");

        let mode = fs::metadata(store.path()).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}
