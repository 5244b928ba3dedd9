//! settree - Typed settings trees with multi-source persistence
//!
//! A settings tree is made of [`tree::Setting`] leaves holding typed,
//! validated values and [`tree::Group`] nodes holding named children.
//! Trees are loaded from and saved to ordered groups of
//! [`sources::Source`] backends by the [`persistor::Persistor`].
//!
//! # Architecture
//!
//! - [`tree`] - Settings, groups, tags, events and traversal
//! - [`sources`] - Persistence backends and stored document handling
//! - [`persistor`] - Load/save orchestration across source groups
//! - [`config`] - TOML configuration of the default source registry
//! - [`cli`] - Command-line interface over stored documents
//! - [`ui`] - Output helpers for the CLI
//!
//! # Threading
//!
//! Trees use `Rc`/`RefCell` handles and are confined to one thread. The
//! global event channel and the default source registry are per thread.

pub mod cli;
pub mod config;
pub mod persistor;
pub mod sources;
pub mod tree;
pub mod ui;
