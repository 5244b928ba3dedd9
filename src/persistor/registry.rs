//! persistor::registry
//!
//! Ordered source groups, source selectors and the default registry.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::sources::{into_handle, Source, SourceHandle};

/// Ordered mapping of keys (e.g. `"persistent"`, `"session"`) to ordered
/// lists of sources.
///
/// Loading consults groups in key order and sources in list order.
#[derive(Clone, Default)]
pub struct SourceGroups {
    groups: Vec<(String, Vec<SourceHandle>)>,
}

impl SourceGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, sources: Vec<SourceHandle>) -> Self {
        self.insert(key, sources);
        self
    }

    /// Builder form of [`push`](Self::push) taking an unwrapped source.
    pub fn with_source<S: Source + 'static>(mut self, key: impl Into<String>, source: S) -> Self {
        self.push(key, into_handle(source));
        self
    }

    /// Set the sources of `key`, keeping its position if it already exists.
    pub fn insert(&mut self, key: impl Into<String>, sources: Vec<SourceHandle>) {
        let key = key.into();
        match self.groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => *existing = sources,
            None => self.groups.push((key, sources)),
        }
    }

    /// Append one source to `key`, creating the group if needed.
    pub fn push(&mut self, key: impl Into<String>, source: SourceHandle) {
        let key = key.into();
        match self.groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => existing.push(source),
            None => self.groups.push((key, vec![source])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[SourceHandle]> {
        self.groups
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, sources)| sources.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SourceHandle])> {
        self.groups
            .iter()
            .map(|(key, sources)| (key.as_str(), sources.as_slice()))
    }

    /// Every source of every group, in order.
    pub fn sources(&self) -> impl Iterator<Item = &SourceHandle> {
        self.groups.iter().flat_map(|(_, sources)| sources.iter())
    }

    /// Every distinct source in consultation order, paired with the key of
    /// the first group it appears in. A handle registered under several keys
    /// is listed once.
    pub fn distinct(&self) -> Vec<(&str, &SourceHandle)> {
        let mut seen: Vec<(&str, &SourceHandle)> = Vec::new();
        for (key, sources) in self.iter() {
            for handle in sources {
                if !seen.iter().any(|(_, known)| Rc::ptr_eq(known, handle)) {
                    seen.push((key, handle));
                }
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The groups named by `keys`, in the order given. `None` if any key is
    /// missing.
    pub(crate) fn select(&self, keys: &[String]) -> Option<SourceGroups> {
        let mut selected = SourceGroups::new();
        for key in keys {
            selected.insert(key.clone(), self.get(key)?.to_vec());
        }
        Some(selected)
    }
}

impl fmt::Debug for SourceGroups {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, sources) in &self.groups {
            let described: Vec<String> = sources
                .iter()
                .map(|source| match source.try_borrow() {
                    Ok(source) => source.describe(),
                    Err(_) => "<in use>".to_string(),
                })
                .collect();
            map.entry(key, &described);
        }
        map.finish()
    }
}

/// Which sources a load, save or clear should use.
#[derive(Debug, Clone, Default)]
pub enum Sources {
    /// The whole default registry.
    #[default]
    Default,
    /// The named groups of the default registry, in the order given.
    Keys(Vec<String>),
    /// Explicit groups.
    Groups(SourceGroups),
}

impl Sources {
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Sources::Keys(keys.into_iter().map(Into::into).collect())
    }
}

impl From<SourceGroups> for Sources {
    fn from(groups: SourceGroups) -> Self {
        Sources::Groups(groups)
    }
}

impl From<&str> for Sources {
    fn from(key: &str) -> Self {
        Sources::Keys(vec![key.to_string()])
    }
}

thread_local! {
    static DEFAULT_SOURCES: RefCell<SourceGroups> = RefCell::new(SourceGroups::new());
}

pub(crate) fn default_sources() -> SourceGroups {
    DEFAULT_SOURCES.with(|registry| registry.borrow().clone())
}

pub(crate) fn set_default_sources(groups: Option<SourceGroups>) {
    DEFAULT_SOURCES.with(|registry| *registry.borrow_mut() = groups.unwrap_or_default());
}
