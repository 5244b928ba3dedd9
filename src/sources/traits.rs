//! sources::traits
//!
//! Source trait and error definitions.
//!
//! # Design
//!
//! A source stores one document per source name. Backends only implement
//! how that raw document is fetched from and committed to their medium
//! ([`Source::read_data_from_source`], [`Source::write_data_to_source`],
//! [`Source::clear`]). Reconciling the document with a tree is shared by
//! every backend through the provided [`Source::read`] and
//! [`Source::write`] methods.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use settree::sources::{MemorySource, Source};
//! use settree::tree::{Group, Node, Setting, SettingKind};
//!
//! let root = Group::new("root").unwrap();
//! let setting = Setting::builder("file_extension", SettingKind::String)
//!     .default_value("png")
//!     .build()
//!     .unwrap();
//! root.add([setting.clone()]).unwrap();
//!
//! let mut source = MemorySource::new("plug-in");
//! source.write(&[Node::from(&root)], None).unwrap();
//!
//! setting.set_value("jpg").unwrap();
//! let not_loaded = source.read(&[Node::from(&root)], None).unwrap();
//! assert!(not_loaded.is_empty());
//! assert_eq!(setting.value(), json!("png"));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use super::document;
use crate::tree::Node;

/// Errors from source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The medium holds no document for this source.
    #[error("no data found in source: {0}")]
    NotFound(String),

    /// The stored document does not have the expected shape, or does not
    /// agree with the in-memory tree.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The data-modifying callback failed.
    ///
    /// `message` holds the full error chain of the callback's error.
    #[error("failed to modify data: {message}")]
    ModifyData {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A setting's event handler failed while stored values were assigned.
    #[error("event handler failed for '{path}': {message}")]
    Handler {
        path: String,
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The medium could not be read.
    #[error("failed to read source: {0}")]
    Read(String),

    /// The medium could not be written.
    #[error("failed to write source: {0}")]
    Write(String),
}

impl SourceError {
    pub(crate) fn modify_data(error: anyhow::Error) -> Self {
        SourceError::ModifyData {
            message: format!("{:#}", error),
            source: error.into(),
        }
    }

    pub(crate) fn handler(path: String, error: anyhow::Error) -> Self {
        SourceError::Handler {
            path,
            message: format!("{:#}", error),
            source: error.into(),
        }
    }
}

/// Whether a source currently holds a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HasData {
    /// Nothing stored, or an empty document.
    Empty,
    /// A well-formed document is stored.
    Present,
    /// Something is stored but it is not a valid document.
    InvalidFormat,
}

impl HasData {
    pub fn as_str(&self) -> &'static str {
        match self {
            HasData::Empty => "empty",
            HasData::Present => "present",
            HasData::InvalidFormat => "invalid format",
        }
    }
}

/// Callback applied to a raw document after reading and before writing,
/// e.g. to migrate data stored by an older version.
pub type ModifyDataFn = dyn Fn(Value) -> anyhow::Result<Value>;

/// Shared, mutable handle to a source, as held by source groups.
pub type SourceHandle = Rc<RefCell<dyn Source>>;

/// Wrap a source into a [`SourceHandle`].
pub fn into_handle<S: Source + 'static>(source: S) -> SourceHandle {
    Rc::new(RefCell::new(source))
}

/// A persistence backend for settings trees.
pub trait Source {
    /// Name under which this source's document is stored.
    fn name(&self) -> &str;

    /// Short description of where the document lives, for messages.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Fetch the raw document.
    ///
    /// Returns `Ok(None)` if the medium holds nothing for this source.
    /// Returns `SourceError::InvalidFormat` if stored data cannot be parsed.
    fn read_data_from_source(&self) -> Result<Option<Value>, SourceError>;

    /// Replace the stored document.
    fn write_data_to_source(&mut self, data: Value) -> Result<(), SourceError>;

    /// Remove this source's document from the medium. Other documents
    /// sharing the medium are left alone.
    fn clear(&mut self) -> Result<(), SourceError>;

    /// Load stored values into `nodes`.
    ///
    /// Returns the nodes that could not be found in the document: settings,
    /// and groups with no children. A group missing entirely is reported as
    /// its leaf settings and empty groups. Nodes tagged `ignore_load` (or
    /// under a tagged group) are neither loaded nor reported.
    ///
    /// # Errors
    ///
    /// - `SourceError::NotFound` if there is no document
    /// - `SourceError::ModifyData` if `modify_data` fails
    /// - `SourceError::InvalidFormat` if the document is malformed or a
    ///   node's kind disagrees with the tree; nothing after the offending
    ///   node is loaded
    fn read(
        &mut self,
        nodes: &[Node],
        modify_data: Option<&ModifyDataFn>,
    ) -> Result<Vec<Node>, SourceError> {
        let data = self
            .read_data_from_source()?
            .ok_or_else(|| SourceError::NotFound(self.describe()))?;
        let data = document::apply_modify_data(data, modify_data)?;
        document::read_nodes(&data, nodes)
    }

    /// Merge `nodes` into the stored document.
    ///
    /// Each node replaces the stored entry of the same name at the same
    /// path; everything else in the document is kept. Nodes tagged
    /// `ignore_save` are left out.
    fn write(
        &mut self,
        nodes: &[Node],
        modify_data: Option<&ModifyDataFn>,
    ) -> Result<(), SourceError> {
        let existing = self.read_data_from_source()?;
        let merged = document::merge_nodes(existing, nodes)?;
        let merged = document::apply_modify_data(merged, modify_data)?;
        self.write_data_to_source(merged)
    }

    /// Report whether a well-formed document is stored.
    fn has_data(&self) -> Result<HasData, SourceError> {
        match self.read_data_from_source() {
            Ok(None) => Ok(HasData::Empty),
            Ok(Some(Value::Array(nodes))) if nodes.is_empty() => Ok(HasData::Empty),
            Ok(Some(data)) => match document::validate_document(&data) {
                Ok(_) => Ok(HasData::Present),
                Err(_) => Ok(HasData::InvalidFormat),
            },
            Err(SourceError::InvalidFormat(_)) => Ok(HasData::InvalidFormat),
            Err(e) => Err(e),
        }
    }
}
