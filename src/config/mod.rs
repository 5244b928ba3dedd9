//! config
//!
//! Configuration of the default source registry.
//!
//! # Locations
//!
//! Searched in order:
//! 1. An explicit path (the CLI's `--config`)
//! 2. `$SETTREE_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/settree/config.toml`
//! 4. `~/.settree/config.toml` (canonical write location)
//!
//! No file means an empty registry.
//!
//! # Example
//!
//! ```no_run
//! use settree::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! for warning in &result.warnings {
//!     eprintln!("{}", warning.message);
//! }
//!
//! // Register the configured sources as the Persistor defaults
//! let groups = result.config.install().unwrap();
//! println!("{} source group(s)", groups.len());
//! ```

pub mod schema;

pub use schema::{SettreeConfig, SourceConfig, SourceKind};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::persistor::{Persistor, SourceGroups};
use crate::sources;
use crate::sources::atomic::{self, Access};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SETTREE_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The file that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
}

/// Loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: SettreeConfig,
    /// Path the configuration was loaded from
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `explicit` or the standard locations.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` does not exist, or if a config file
    /// exists but cannot be parsed or validated.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::locate(|name| std::env::var(name).ok(), dirs::home_dir()),
        };

        let Some(path) = path else {
            debug!("no config file found");
            return Ok(ConfigLoadResult {
                config: Config::default(),
                warnings: Vec::new(),
            });
        };

        let file = Self::read_config(&path)?;
        file.validate()?;
        debug!(path = %path.display(), sources = file.sources.len(), "loaded config");

        let warnings = file
            .sources
            .iter()
            .flat_map(|source| {
                source.unused_fields().into_iter().map(|field| ConfigWarning {
                    message: format!(
                        "'{}' is ignored for {} source '{}'",
                        field, source.kind, source.name
                    ),
                    path: path.clone(),
                })
            })
            .collect();

        Ok(ConfigLoadResult {
            config: Config {
                file,
                path: Some(path),
            },
            warnings,
        })
    }

    /// Build a configuration from an already-parsed file.
    pub fn from_file(file: SettreeConfig) -> Result<Self, ConfigError> {
        file.validate()?;
        Ok(Self { file, path: None })
    }

    /// Find the first existing config file.
    fn locate(env: impl Fn(&str) -> Option<String>, home: Option<PathBuf>) -> Option<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = env(CONFIG_ENV) {
            candidates.push(PathBuf::from(path));
        }
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("settree/config.toml"));
        }
        if let Some(home) = home {
            candidates.push(home.join(".settree/config.toml"));
        }
        candidates.into_iter().find(|path| path.exists())
    }

    fn read_config(path: &Path) -> Result<SettreeConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical config path, `~/.settree/config.toml`.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".settree/config.toml"))
    }

    /// Write the configuration atomically to `path`.
    ///
    /// Creates parent directories if needed.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        Self::write_config_atomic(path, &self.file)
    }

    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        atomic::replace_file(path, contents.as_bytes(), Access::Shared).map_err(|e| {
            ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            }
        })
    }

    /// Build the configured sources, grouped by key in first-appearance
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a source cannot be created
    /// (e.g. the keychain store without the `keychain` feature).
    pub fn source_groups(&self) -> Result<SourceGroups, ConfigError> {
        let mut groups = SourceGroups::new();
        for source in &self.file.sources {
            let handle = sources::create_source(source).map_err(|e| {
                ConfigError::InvalidValue(format!("source '{}': {}", source.name, e))
            })?;
            groups.push(source.key.clone(), handle);
        }
        Ok(groups)
    }

    /// Register the configured sources as the Persistor defaults.
    ///
    /// Returns the installed groups.
    pub fn install(&self) -> Result<SourceGroups, ConfigError> {
        let groups = self.source_groups()?;
        Persistor::set_default_setting_sources(Some(groups.clone()));
        Ok(groups)
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
