//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file instead of searching
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// settree - Inspect and manage stored settings trees
#[derive(Parser, Debug)]
#[command(name = "settree")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file describing the source registry
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the configured sources
    #[command(
        name = "sources",
        long_about = "List the configured sources.\n\n\
            Sources are grouped by key in the order they are consulted when \
            loading: groups in first-appearance order, sources in file order.",
        after_help = "\
EXAMPLES:
    # Show the registry from the default config location
    settree sources

    # Show the registry described by another file
    settree --config ./settree.toml sources"
    )]
    Sources,

    /// Print the stored document of each source
    #[command(name = "show")]
    Show {
        /// Only sources under this key
        #[arg(long)]
        key: Option<String>,
    },

    /// Report whether each source holds a well-formed document
    #[command(
        name = "check",
        long_about = "Report whether each source holds a well-formed document.\n\n\
            Each source is reported as present, empty or invalid_format. The \
            command fails if any source is malformed or cannot be read."
    )]
    Check {
        /// Only sources under this key
        #[arg(long)]
        key: Option<String>,
    },

    /// Print a stored value by path
    #[command(
        name = "get",
        after_help = "\
EXAMPLES:
    # Print a setting's stored value (first source that has it)
    settree get plugin/main/file_extension

    # Print a whole stored group
    settree get plugin/main --key persistent"
    )]
    Get {
        /// Node path, segments separated by '/'
        path: String,

        /// Only sources under this key
        #[arg(long)]
        key: Option<String>,
    },

    /// Remove stored documents
    #[command(name = "clear")]
    Clear {
        /// Only sources under this key
        #[arg(long)]
        key: Option<String>,
    },
}
