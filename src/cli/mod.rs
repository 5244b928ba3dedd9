//! cli
//!
//! Command-line interface for inspecting stored settings.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load the source registry from configuration
//! - Delegate to command handlers
//!
//! The CLI works on stored documents only; it never needs a settings tree.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use crate::config::Config;
use crate::persistor::SourceGroups;
use crate::ui::output::Output;

/// Settings shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Explicit config file (`--config`)
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub quiet: bool,
}

impl Context {
    pub fn output(&self) -> Output {
        Output::from_flags(self.quiet, self.debug)
    }

    /// Load the configured registry, narrowed to `key` if given.
    pub fn sources(&self, key: Option<&str>) -> Result<SourceGroups> {
        let result = Config::load(self.config.as_deref()).context("Failed to load config")?;
        for warning in &result.warnings {
            self.output()
                .warn(format!("{} ({})", warning.message, warning.path.display()));
        }

        let groups = result
            .config
            .source_groups()
            .context("Failed to create sources")?;

        match key {
            None => Ok(groups),
            Some(key) => groups.select(&[key.to_string()]).with_context(|| {
                let known: Vec<&str> = groups.keys().collect();
                format!(
                    "Unknown source key '{}' (configured: {})",
                    key,
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                )
            }),
        }
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        config: cli.config.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}
