//! tree
//!
//! The in-memory settings tree.
//!
//! # Nodes
//!
//! - [`Setting`] - a named, typed value with validation and a default
//! - [`Group`] - an ordered container of settings and nested groups
//! - [`Node`] - either of the two, used wherever both are accepted
//!
//! `Setting` and `Group` are cheap reference-counted handles. Cloning a
//! handle does not copy the node; two handles compare equal only when they
//! point at the same node. Parents are held weakly, so dropping the root
//! drops the whole tree.
//!
//! # Tags
//!
//! Every node carries a mutable set of string tags. Tags have no behavior on
//! the node itself; the persistence layer and [`Group::reset`] consult them
//! through [`Node::has_tag_inherited`], which also looks at every ancestor.
//! See [`tags`] for the recognised names.
//!
//! # Threading
//!
//! Handles are `!Send`. A tree lives on the thread that built it.

mod events;
mod group;
mod kind;
mod node;
mod setting;
mod walk;

pub use events::{Event, EventId, EventKind};
pub use group::Group;
pub use kind::{ChoiceItem, SettingKind, ValueNotValid};
pub use node::Node;
pub use setting::{Setting, SettingBuilder};
pub use walk::Walk;

use thiserror::Error;

/// Tag names with built-in meaning for persistence and reset.
pub mod tags {
    /// The node (and its subtree) is skipped when reading from a source.
    pub const IGNORE_LOAD: &str = "ignore_load";
    /// The node (and its subtree) is omitted when writing to a source.
    pub const IGNORE_SAVE: &str = "ignore_save";
    /// [`Group::reset`](super::Group::reset) leaves the node alone.
    pub const IGNORE_RESET: &str = "ignore_reset";
}

/// Errors from building, editing or querying a tree.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    #[error("invalid name '{0}': names must be non-empty and must not contain '/'")]
    InvalidName(String),

    #[error("group '{group}' already contains a node named '{name}'")]
    DuplicateName { group: String, name: String },

    #[error("'{0}' already belongs to a group")]
    AlreadyParented(String),

    #[error("cannot add group '{0}' to itself or to one of its descendants")]
    Cycle(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("'{0}' is not a setting")]
    NotASetting(String),

    #[error("'{0}' is not a group")]
    NotAGroup(String),

    #[error("unknown setting type '{0}'")]
    UnknownType(String),

    #[error("invalid attribute '{attribute}' for type '{type_name}': {message}")]
    InvalidAttribute {
        type_name: String,
        attribute: String,
        message: String,
    },

    #[error("invalid default value for '{name}': {message}")]
    InvalidDefault { name: String, message: String },

    #[error("invalid document node: {0}")]
    InvalidDocument(String),

    #[error("no event handler with id {0}")]
    EventNotFound(EventId),
}

/// Check that a node name is usable as a path segment.
pub(crate) fn validate_name(name: &str) -> Result<(), TreeError> {
    if name.is_empty() || name.contains('/') {
        return Err(TreeError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Separator between node names in a path.
pub const PATH_SEPARATOR: char = '/';

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_reject_empty_and_separator() {
        assert!(validate_name("file_extension").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("main/file").is_err());
    }

    #[test]
    fn error_display_mentions_context() {
        let err = TreeError::DuplicateName {
            group: "main".into(),
            name: "file_extension".into(),
        };
        assert!(err.to_string().contains("main"));
        assert!(err.to_string().contains("file_extension"));

        let err = TreeError::NotFound("main/missing".into());
        assert!(err.to_string().contains("main/missing"));
    }
}
