//! sources::json_file
//!
//! Sources backed by a JSON file shared between source names.
//!
//! # File format
//!
//! The file holds one JSON object mapping source names to documents:
//!
//! ```json
//! {
//!   "plug-in": [{"name": "root", "settings": [...]}],
//!   "plug-in-last-run": [...]
//! }
//! ```
//!
//! Each source only touches its own entry. Writes are atomic (write to a
//! temp file, then rename).

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use super::atomic::{self, Access};
use super::traits::{Source, SourceError};

/// A source storing its document under its name in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    name: String,
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file. A missing file is an empty map.
    fn read_all(&self) -> Result<Map<String, Value>, SourceError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            SourceError::Read(format!("cannot read '{}': {}", self.path.display(), e))
        })?;

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str(&content) {
            Ok(Value::Object(entries)) => Ok(entries),
            Ok(_) => Err(SourceError::InvalidFormat(format!(
                "'{}' must contain a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(SourceError::InvalidFormat(format!(
                "cannot parse '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Write the whole file atomically.
    fn write_all(&self, entries: &Map<String, Value>) -> Result<(), SourceError> {
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| SourceError::Write(format!("cannot serialize settings: {}", e)))?;

        atomic::replace_file(&self.path, content.as_bytes(), Access::Shared).map_err(|e| {
            SourceError::Write(format!("cannot replace '{}': {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), source = %self.name, "wrote settings file");
        Ok(())
    }
}

impl Source for JsonFileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.path.display(), self.name)
    }

    fn read_data_from_source(&self) -> Result<Option<Value>, SourceError> {
        Ok(self.read_all()?.get(&self.name).cloned())
    }

    fn write_data_to_source(&mut self, data: Value) -> Result<(), SourceError> {
        let mut entries = self.read_all()?;
        entries.insert(self.name.clone(), data);
        self.write_all(&entries)
    }

    fn clear(&mut self) -> Result<(), SourceError> {
        let mut entries = self.read_all()?;
        if entries.remove(&self.name).is_none() {
            return Ok(());
        }
        self.write_all(&entries)
    }
}
