//! ui
//!
//! User-facing output for the CLI.
//!
//! All command output goes through [`output`] so that `--quiet` and
//! `--debug` are honored consistently.

pub mod output;
