//! ui::output
//!
//! Terminal output for the CLI.
//!
//! Command results (documents, values, listings) always go to stdout so
//! they can be piped. Status lines are dropped with `--quiet`, and
//! diagnostics go to stderr.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
}

/// Writer for command output at a fixed verbosity.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    verbosity: Verbosity,
}

impl Output {
    /// `quiet` wins over `debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        let verbosity = match (quiet, debug) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Debug,
            (false, false) => Verbosity::Normal,
        };
        Self { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// A command result; printed even when quiet.
    pub fn data(&self, content: impl Display) {
        println!("{}", content);
    }

    /// A status line such as a header or a summary.
    pub fn status(&self, message: impl Display) {
        if self.verbosity != Verbosity::Quiet {
            println!("{}", message);
        }
    }

    pub fn warn(&self, message: impl Display) {
        if self.verbosity != Verbosity::Quiet {
            eprintln!("warning: {}", message);
        }
    }

    /// Extra detail shown with `--debug`.
    pub fn detail(&self, message: impl Display) {
        if self.verbosity == Verbosity::Debug {
            eprintln!("[debug] {}", message);
        }
    }
}

/// Print an error. Never suppressed.
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// A group key followed by its sources, one per indented line.
pub fn source_listing(key: &str, sources: &[String]) -> String {
    let mut listing = key.to_string();
    for source in sources {
        listing.push_str("\n  ");
        listing.push_str(source);
    }
    listing
}
