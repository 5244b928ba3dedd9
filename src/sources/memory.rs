//! sources::memory
//!
//! In-process source holding its document directly.

use serde_json::Value;

use super::traits::{Source, SourceError};

/// A source whose document lives in the source itself.
///
/// Useful for session-only settings and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    data: Option<Value>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }

    /// Start with a stored document.
    pub fn with_data(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data: Some(data),
        }
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn set_data(&mut self, data: Option<Value>) {
        self.data = data;
    }
}

impl Source for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        format!("memory ({})", self.name)
    }

    fn read_data_from_source(&self) -> Result<Option<Value>, SourceError> {
        Ok(self.data.clone())
    }

    fn write_data_to_source(&mut self, data: Value) -> Result<(), SourceError> {
        self.data = Some(data);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SourceError> {
        self.data = None;
        Ok(())
    }
}
