//! persistor::result
//!
//! Outcome of a load or save across several sources.

use std::fmt;
use std::rc::Rc;

use crate::sources::SourceHandle;
use crate::tree::Node;

/// Overall or per-source outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistorStatus {
    Success,
    PartialSuccess,
    /// Per source only: the source holds no data.
    SourceNotFound,
    Fail,
    /// No nodes were given.
    NoSettings,
}

impl PersistorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistorStatus::Success => "success",
            PersistorStatus::PartialSuccess => "partial_success",
            PersistorStatus::SourceNotFound => "source_not_found",
            PersistorStatus::Fail => "fail",
            PersistorStatus::NoSettings => "no_settings",
        }
    }
}

impl fmt::Display for PersistorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated result of [`Persistor::load`](super::Persistor::load) or
/// [`Persistor::save`](super::Persistor::save).
///
/// `statuses_per_source` and `messages_per_source` have one entry per
/// consulted source, in consultation order. Messages are empty for
/// successful sources.
#[derive(Clone)]
pub struct PersistorResult {
    pub status: PersistorStatus,
    /// Requested nodes not found in any consulted source. Always empty
    /// after a save.
    pub settings_not_loaded: Vec<Node>,
    pub statuses_per_source: Vec<(SourceHandle, PersistorStatus)>,
    pub messages_per_source: Vec<(SourceHandle, String)>,
}

impl PersistorResult {
    pub(crate) fn without_sources(status: PersistorStatus) -> Self {
        Self {
            status,
            settings_not_loaded: Vec::new(),
            statuses_per_source: Vec::new(),
            messages_per_source: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PersistorStatus::Success
    }

    /// Status recorded for `source`, if it was consulted.
    pub fn status_of(&self, source: &SourceHandle) -> Option<PersistorStatus> {
        self.statuses_per_source
            .iter()
            .find(|(handle, _)| Rc::ptr_eq(handle, source))
            .map(|(_, status)| *status)
    }

    /// Message recorded for `source`, if it was consulted.
    pub fn message_of(&self, source: &SourceHandle) -> Option<&str> {
        self.messages_per_source
            .iter()
            .find(|(handle, _)| Rc::ptr_eq(handle, source))
            .map(|(_, message)| message.as_str())
    }

    /// Per-source statuses in consultation order.
    pub fn statuses(&self) -> Vec<PersistorStatus> {
        self.statuses_per_source
            .iter()
            .map(|(_, status)| *status)
            .collect()
    }
}

impl fmt::Debug for PersistorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not_loaded: Vec<String> = self.settings_not_loaded.iter().map(Node::path).collect();
        let per_source: Vec<(String, PersistorStatus)> = self
            .statuses_per_source
            .iter()
            .map(|(handle, status)| {
                let described = match handle.try_borrow() {
                    Ok(source) => source.describe(),
                    Err(_) => "<in use>".to_string(),
                };
                (described, *status)
            })
            .collect();
        f.debug_struct("PersistorResult")
            .field("status", &self.status)
            .field("settings_not_loaded", &not_loaded)
            .field("statuses_per_source", &per_source)
            .finish()
    }
}

/// Combine per-source statuses.
///
/// SUCCESS when every consulted source succeeded and nothing is left
/// unloaded; FAIL when no source was consulted or every one failed;
/// PARTIAL_SUCCESS otherwise.
pub(crate) fn aggregate(
    statuses: &[(SourceHandle, PersistorStatus)],
    settings_not_loaded: &[Node],
) -> PersistorStatus {
    if statuses.is_empty() {
        return PersistorStatus::Fail;
    }
    let all = |wanted: PersistorStatus| statuses.iter().all(|(_, status)| *status == wanted);

    if all(PersistorStatus::Success) && settings_not_loaded.is_empty() {
        PersistorStatus::Success
    } else if all(PersistorStatus::Fail) {
        PersistorStatus::Fail
    } else {
        PersistorStatus::PartialSuccess
    }
}
