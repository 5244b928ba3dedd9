//! config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: every source needs a key and a name,
//! `json_file` sources need a path, and `key_value` sources must name a
//! known store provider.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::sources::VALID_STORES;

/// Top-level configuration file.
///
/// # Example
///
/// ```toml
/// [[sources]]
/// key = "session"
/// kind = "memory"
/// name = "plug-in"
///
/// [[sources]]
/// key = "persistent"
/// kind = "json_file"
/// name = "plug-in"
/// path = "/home/user/.settree/settings.json"
///
/// [[sources]]
/// key = "persistent"
/// kind = "key_value"
/// name = "plug-in"
/// store = "file"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SettreeConfig {
    /// Default registry entries, in consultation order.
    pub sources: Vec<SourceConfig>,
}

impl SettreeConfig {
    /// Validate every source entry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first bad entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for source in &self.sources {
            source.validate()?;
        }
        Ok(())
    }
}

/// Backend kind of a configured source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    JsonFile,
    KeyValue,
    Memory,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::JsonFile => "json_file",
            SourceKind::KeyValue => "key_value",
            SourceKind::Memory => "memory",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source of the default registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Registry key the source belongs to (e.g. "persistent")
    pub key: String,

    /// Backend kind
    pub kind: SourceKind,

    /// Source name; entries sharing a medium are told apart by it
    pub name: String,

    /// File path (`json_file`, or the `file` store of `key_value`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Store provider for `key_value` (default: "file")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

impl SourceConfig {
    /// Validate the entry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the entry is incomplete.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key.trim().is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "source '{}' has an empty key",
                self.name
            )));
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "source under key '{}' has an empty name",
                self.key
            )));
        }

        match self.kind {
            SourceKind::JsonFile if self.path.is_none() => Err(ConfigError::InvalidValue(
                format!("json_file source '{}' requires a path", self.name),
            )),
            SourceKind::KeyValue => match self.store.as_deref() {
                Some(store) if !VALID_STORES.contains(&store) => {
                    Err(ConfigError::InvalidValue(format!(
                        "invalid store '{}' for source '{}', must be one of: {}",
                        store,
                        self.name,
                        VALID_STORES.join(", ")
                    )))
                }
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Fields that are set but have no effect for this kind.
    pub(crate) fn unused_fields(&self) -> Vec<&'static str> {
        let mut unused = Vec::new();
        match self.kind {
            SourceKind::JsonFile => {
                if self.store.is_some() {
                    unused.push("store");
                }
            }
            SourceKind::KeyValue => {
                if self.path.is_some() && !matches!(self.store.as_deref(), None | Some("file")) {
                    unused.push("path");
                }
            }
            SourceKind::Memory => {
                if self.path.is_some() {
                    unused.push("path");
                }
                if self.store.is_some() {
                    unused.push("store");
                }
            }
        }
        unused
    }
}
