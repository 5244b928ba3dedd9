//! persistor
//!
//! Loading and saving trees across ordered groups of sources.
//!
//! # Loading
//!
//! Sources are consulted group by group, source by source. Each source is
//! only asked for the nodes that earlier sources did not provide, and the
//! loop stops as soon as every node has been found. A failing source never
//! stops the loop; its error becomes a per-source status and message:
//!
//! | source outcome | status |
//! |---|---|
//! | read succeeded | `Success` |
//! | no stored data | `SourceNotFound` |
//! | any other error | `Fail` |
//!
//! # Saving
//!
//! Every source of every selected group is written.
//!
//! # Events
//!
//! Unless disabled, `before-load`/`after-load` (or `before-save`/
//! `after-save`) fire on every given node and every descendant, groups
//! included. The after-event fires whatever the outcome.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use settree::persistor::{PersistOptions, Persistor, PersistorStatus, SourceGroups};
//! use settree::sources::MemorySource;
//! use settree::tree::{Group, Node, Setting, SettingKind};
//!
//! let root = Group::new("root").unwrap();
//! let setting = Setting::builder("file_extension", SettingKind::String)
//!     .default_value("png")
//!     .build()
//!     .unwrap();
//! root.add([setting.clone()]).unwrap();
//!
//! let sources = SourceGroups::new().with_source("session", MemorySource::new("plug-in"));
//! let nodes = [Node::from(&root)];
//!
//! setting.set_value("jpg").unwrap();
//! Persistor::save(&nodes, sources.clone().into(), PersistOptions::default());
//! setting.reset().unwrap();
//!
//! let result = Persistor::load(&nodes, sources.into(), PersistOptions::default());
//! assert_eq!(result.status, PersistorStatus::Success);
//! assert_eq!(setting.value(), json!("jpg"));
//! ```

mod registry;
mod result;

pub use registry::{SourceGroups, Sources};
pub use result::{PersistorResult, PersistorStatus};

use tracing::{debug, warn};

use crate::sources::{ModifyDataFn, SourceError, SourceHandle};
use crate::tree::{Event, Node};

/// Options shared by [`Persistor::load`] and [`Persistor::save`].
#[derive(Clone, Copy)]
pub struct PersistOptions<'a> {
    /// Fire before/after events on the nodes (default `true`).
    pub trigger_events: bool,
    /// Applied to each source's document after reading and before writing.
    pub modify_data: Option<&'a ModifyDataFn>,
}

impl Default for PersistOptions<'_> {
    fn default() -> Self {
        Self {
            trigger_events: true,
            modify_data: None,
        }
    }
}

impl<'a> PersistOptions<'a> {
    pub fn trigger_events(mut self, trigger_events: bool) -> Self {
        self.trigger_events = trigger_events;
        self
    }

    pub fn modify_data(mut self, modify_data: &'a ModifyDataFn) -> Self {
        self.modify_data = Some(modify_data);
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Load,
    Save,
}

impl Operation {
    fn before(self) -> Event {
        match self {
            Operation::Load => Event::BeforeLoad,
            Operation::Save => Event::BeforeSave,
        }
    }

    fn after(self) -> Event {
        match self {
            Operation::Load => Event::AfterLoad,
            Operation::Save => Event::AfterSave,
        }
    }
}

/// Stateless load/save orchestration.
pub struct Persistor;

impl Persistor {
    /// Load `nodes` from `sources`.
    ///
    /// Returns `NoSettings` for an empty `nodes` and `Fail` when `sources`
    /// resolves to nothing (empty registry, unknown key, no groups).
    pub fn load(nodes: &[Node], sources: Sources, options: PersistOptions<'_>) -> PersistorResult {
        Self::run(Operation::Load, nodes, sources, options)
    }

    /// Save `nodes` to every source of `sources`.
    pub fn save(nodes: &[Node], sources: Sources, options: PersistOptions<'_>) -> PersistorResult {
        Self::run(Operation::Save, nodes, sources, options)
    }

    /// Clear every source of `sources`. Unresolvable sources are a no-op.
    ///
    /// Every source is attempted; the first error is returned.
    pub fn clear(sources: Sources) -> Result<(), SourceError> {
        let Some(groups) = Self::resolve(sources) else {
            return Ok(());
        };

        let mut first_error = None;
        for (_, handle) in groups.distinct() {
            let outcome = match handle.try_borrow_mut() {
                Ok(mut source) => source.clear(),
                Err(_) => Err(SourceError::Write("source is already in use".into())),
            };
            if let Err(error) = outcome {
                warn!(error = %error, "failed to clear source");
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Snapshot of the default registry used by [`Sources::Default`] and
    /// [`Sources::Keys`].
    pub fn default_setting_sources() -> SourceGroups {
        registry::default_sources()
    }

    /// Replace the default registry; `None` clears it.
    pub fn set_default_setting_sources(sources: Option<SourceGroups>) {
        registry::set_default_sources(sources);
    }

    fn run(
        operation: Operation,
        nodes: &[Node],
        sources: Sources,
        options: PersistOptions<'_>,
    ) -> PersistorResult {
        if nodes.is_empty() {
            return PersistorResult::without_sources(PersistorStatus::NoSettings);
        }
        let Some(groups) = Self::resolve(sources) else {
            warn!(?operation, "no sources to use");
            return PersistorResult::without_sources(PersistorStatus::Fail);
        };

        if options.trigger_events {
            trigger(nodes, &operation.before());
        }

        let result = match operation {
            Operation::Load => Self::load_from(nodes, &groups, options.modify_data),
            Operation::Save => Self::save_to(nodes, &groups, options.modify_data),
        };

        if options.trigger_events {
            trigger(nodes, &operation.after());
        }

        debug!(?operation, status = %result.status, "finished");
        result
    }

    fn resolve(sources: Sources) -> Option<SourceGroups> {
        let groups = match sources {
            Sources::Default => registry::default_sources(),
            Sources::Keys(keys) if keys.is_empty() => return None,
            Sources::Keys(keys) => registry::default_sources().select(&keys)?,
            Sources::Groups(groups) => groups,
        };
        (!groups.is_empty()).then_some(groups)
    }

    fn load_from(
        nodes: &[Node],
        groups: &SourceGroups,
        modify_data: Option<&ModifyDataFn>,
    ) -> PersistorResult {
        let mut remaining: Vec<Node> = nodes.to_vec();
        let mut statuses = Vec::new();
        let mut messages = Vec::new();

        for (key, handle) in groups.distinct() {
            let outcome = match handle.try_borrow_mut() {
                Ok(mut source) => source
                    .read(&remaining, modify_data)
                    .map_err(|error| (source.describe(), error)),
                Err(_) => Err((
                    "<in use>".to_string(),
                    SourceError::Read("source is already in use".into()),
                )),
            };

            match outcome {
                Ok(not_loaded) => {
                    debug!(key, not_loaded = not_loaded.len(), "loaded from source");
                    record(&mut statuses, &mut messages, handle, PersistorStatus::Success, String::new());
                    remaining = not_loaded;
                    if remaining.is_empty() {
                        break;
                    }
                }
                Err((described, error)) => {
                    let status = status_for(&error);
                    warn!(key, source = %described, error = %error, "cannot load from source");
                    record(&mut statuses, &mut messages, handle, status, error.to_string());
                }
            }
        }

        PersistorResult {
            status: result::aggregate(&statuses, &remaining),
            settings_not_loaded: remaining,
            statuses_per_source: statuses,
            messages_per_source: messages,
        }
    }

    fn save_to(
        nodes: &[Node],
        groups: &SourceGroups,
        modify_data: Option<&ModifyDataFn>,
    ) -> PersistorResult {
        let mut statuses = Vec::new();
        let mut messages = Vec::new();

        for (key, handle) in groups.distinct() {
            let outcome = match handle.try_borrow_mut() {
                Ok(mut source) => source
                    .write(nodes, modify_data)
                    .map_err(|error| (source.describe(), error)),
                Err(_) => Err((
                    "<in use>".to_string(),
                    SourceError::Write("source is already in use".into()),
                )),
            };

            match outcome {
                Ok(()) => {
                    debug!(key, "saved to source");
                    record(&mut statuses, &mut messages, handle, PersistorStatus::Success, String::new());
                }
                Err((described, error)) => {
                    let status = status_for(&error);
                    warn!(key, source = %described, error = %error, "cannot save to source");
                    record(&mut statuses, &mut messages, handle, status, error.to_string());
                }
            }
        }

        PersistorResult {
            status: result::aggregate(&statuses, &[]),
            settings_not_loaded: Vec::new(),
            statuses_per_source: statuses,
            messages_per_source: messages,
        }
    }
}

fn status_for(error: &SourceError) -> PersistorStatus {
    match error {
        SourceError::NotFound(_) => PersistorStatus::SourceNotFound,
        _ => PersistorStatus::Fail,
    }
}

fn record(
    statuses: &mut Vec<(SourceHandle, PersistorStatus)>,
    messages: &mut Vec<(SourceHandle, String)>,
    handle: &SourceHandle,
    status: PersistorStatus,
    message: String,
) {
    statuses.push((handle.clone(), status));
    messages.push((handle.clone(), message));
}

/// Fire `event` on each node and all of its descendants.
///
/// A failing handler is logged; the remaining nodes still receive the event.
fn trigger(nodes: &[Node], event: &Event) {
    let fire = |node: &Node| {
        if let Err(error) = node.invoke_event(event) {
            warn!(
                node = %node.path(),
                event = event.kind().as_str(),
                error = %error,
                "event handler failed"
            );
        }
    };
    for node in nodes {
        fire(node);
        if let Node::Group(group) = node {
            for descendant in group.walk().include_groups(true) {
                fire(&descendant);
            }
        }
    }
}
