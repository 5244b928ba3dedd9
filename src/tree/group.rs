//! tree::group
//!
//! Ordered containers of settings and nested groups.
//!
//! # Paths
//!
//! Children are addressed by name; nested children by `/`-separated paths
//! relative to the group, e.g. `main/file_extension`. Lookups never create
//! nodes.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use settree::tree::{Group, Setting, SettingKind};
//!
//! let root = Group::new("root").unwrap();
//! let main = Group::new("main").unwrap();
//! main.add([Setting::builder("file_extension", SettingKind::String)
//!     .default_value("png")
//!     .build()
//!     .unwrap()])
//!     .unwrap();
//! root.add([main]).unwrap();
//!
//! let setting = root.setting("main/file_extension").unwrap();
//! assert_eq!(setting.path(), "root/main/file_extension");
//! assert_eq!(setting.value(), json!("png"));
//! ```

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};

use super::events::{self, Event, EventId, EventKind, EventRegistry};
use super::node::{document_tags, Node};
use super::setting::Setting;
use super::walk::Walk;
use super::{tags, validate_name, TreeError, PATH_SEPARATOR};
use crate::persistor::{PersistOptions, Persistor, PersistorResult, Sources};

/// Handle to a group. Clones share the same group.
#[derive(Clone)]
pub struct Group(Rc<GroupInner>);

pub(crate) struct GroupInner {
    name: String,
    display_name: RefCell<Option<String>>,
    tags: RefCell<BTreeSet<String>>,
    children: RefCell<Vec<Node>>,
    parent: RefCell<Weak<GroupInner>>,
    events: RefCell<EventRegistry<Group>>,
}

impl Group {
    /// Create an empty group.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::InvalidName` if the name is empty or contains `/`.
    pub fn new(name: impl Into<String>) -> Result<Self, TreeError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Group(Rc::new(GroupInner {
            name,
            display_name: RefCell::new(None),
            tags: RefCell::new(BTreeSet::new()),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(Weak::new()),
            events: RefCell::new(EventRegistry::new()),
        })))
    }

    pub fn with_tags<I, S>(name: impl Into<String>, tags: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let group = Self::new(name)?;
        group.0.tags.borrow_mut().extend(tags.into_iter().map(Into::into));
        Ok(group)
    }

    /// Build an empty group from a stored group node (name, tags and display
    /// name only; children are left to the caller).
    pub fn from_document(doc: &Map<String, Value>) -> Result<Self, TreeError> {
        let name = doc.get("name").and_then(Value::as_str).ok_or_else(|| {
            TreeError::InvalidDocument("group node without a string 'name'".into())
        })?;
        let group = Self::with_tags(name, document_tags(doc)?)?;
        if let Some(display_name) = doc.get("display_name").and_then(Value::as_str) {
            group.set_display_name(display_name);
        }
        Ok(group)
    }

    /// Serialize the group and all of its descendants, tags notwithstanding.
    pub fn to_document(&self) -> Value {
        let children = self.children().iter().map(Node::to_document).collect();
        let mut doc = self.document_header();
        doc.insert("settings".into(), Value::Array(children));
        Value::Object(doc)
    }

    /// `name`, `display_name` and `tags` of a group node, without `settings`.
    pub(crate) fn document_header(&self) -> Map<String, Value> {
        let mut doc = Map::new();
        doc.insert("name".into(), Value::from(self.name()));
        if let Some(display_name) = self.0.display_name.borrow().as_deref() {
            doc.insert("display_name".into(), Value::from(display_name));
        }
        let tags = self.tags();
        if !tags.is_empty() {
            doc.insert("tags".into(), Value::from(tags));
        }
        doc
    }

    pub(crate) fn from_inner(inner: Rc<GroupInner>) -> Self {
        Group(inner)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn display_name(&self) -> Option<String> {
        self.0.display_name.borrow().clone()
    }

    pub fn set_display_name(&self, display_name: impl Into<String>) {
        *self.0.display_name.borrow_mut() = Some(display_name.into());
    }

    // =========================================================================
    // Children
    // =========================================================================

    /// Append children in order.
    ///
    /// Stops at the first child that cannot be added; children before it
    /// stay added.
    ///
    /// # Errors
    ///
    /// - `TreeError::DuplicateName` if a child with the same name exists
    /// - `TreeError::AlreadyParented` if the node belongs to another group
    /// - `TreeError::Cycle` if a group would contain itself
    pub fn add<I, N>(&self, children: I) -> Result<(), TreeError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        for child in children {
            self.add_one(child.into())?;
        }
        Ok(())
    }

    fn add_one(&self, child: Node) -> Result<(), TreeError> {
        if self.contains(child.name()) {
            return Err(TreeError::DuplicateName {
                group: self.name().to_string(),
                name: child.name().to_string(),
            });
        }
        if child.parent().is_some() {
            return Err(TreeError::AlreadyParented(child.path()));
        }
        if let Node::Group(group) = &child {
            if group.ptr_eq(self) || self.is_descendant_of(group) {
                return Err(TreeError::Cycle(group.name().to_string()));
            }
        }

        child.set_parent(Rc::downgrade(&self.0));
        self.0.children.borrow_mut().push(child);
        Ok(())
    }

    /// Detach the named direct children.
    pub fn remove<I, S>(&self, names: I) -> Result<(), TreeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            let removed = {
                let mut children = self.0.children.borrow_mut();
                let index = children
                    .iter()
                    .position(|child| child.name() == name)
                    .ok_or_else(|| TreeError::NotFound(self.child_path(name)))?;
                children.remove(index)
            };
            removed.set_parent(Weak::new());
        }
        Ok(())
    }

    /// Move a direct child to `index` (clamped to the end).
    pub fn reorder(&self, name: &str, index: usize) -> Result<(), TreeError> {
        let mut children = self.0.children.borrow_mut();
        let current = children
            .iter()
            .position(|child| child.name() == name)
            .ok_or_else(|| TreeError::NotFound(self.child_path(name)))?;
        let child = children.remove(current);
        let index = index.min(children.len());
        children.insert(index, child);
        Ok(())
    }

    /// Snapshot of the direct children, in order.
    pub fn children(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn child(&self, name: &str) -> Option<Node> {
        self.0
            .children
            .borrow()
            .iter()
            .find(|child| child.name() == name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.children.borrow().iter().any(|child| child.name() == name)
    }

    pub fn len(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.children.borrow().is_empty()
    }

    /// Resolve a `/`-separated path relative to this group.
    pub fn get(&self, path: &str) -> Result<Node, TreeError> {
        let mut current = Node::Group(self.clone());
        for segment in path.split(PATH_SEPARATOR) {
            let group = match &current {
                Node::Group(group) => group.clone(),
                Node::Setting(_) => return Err(TreeError::NotFound(self.child_path(path))),
            };
            current = group
                .child(segment)
                .ok_or_else(|| TreeError::NotFound(self.child_path(path)))?;
        }
        Ok(current)
    }

    /// Like [`get`](Self::get), requiring a setting.
    pub fn setting(&self, path: &str) -> Result<Setting, TreeError> {
        match self.get(path)? {
            Node::Setting(setting) => Ok(setting),
            Node::Group(_) => Err(TreeError::NotASetting(self.child_path(path))),
        }
    }

    /// Like [`get`](Self::get), requiring a group.
    pub fn group(&self, path: &str) -> Result<Group, TreeError> {
        match self.get(path)? {
            Node::Group(group) => Ok(group),
            Node::Setting(_) => Err(TreeError::NotAGroup(self.child_path(path))),
        }
    }

    /// Depth-first walk over descendant settings; see [`Walk`].
    pub fn walk(&self) -> Walk {
        Walk::new(self.clone())
    }

    /// Reset every descendant setting, skipping nodes tagged `ignore_reset`
    /// together with their subtrees. Nothing is reset when this group or one
    /// of its ancestors carries the tag.
    ///
    /// # Errors
    ///
    /// The first handler error; later settings keep their values.
    pub fn reset(&self) -> anyhow::Result<()> {
        if self.has_tag_inherited(tags::IGNORE_RESET) {
            return Ok(());
        }
        for node in self.walk().skip_tags([tags::IGNORE_RESET]) {
            if let Node::Setting(setting) = node {
                setting.reset()?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Tags
    // =========================================================================

    pub fn tags(&self) -> Vec<String> {
        self.0.tags.borrow().iter().cloned().collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.0.tags.borrow().contains(tag)
    }

    pub fn has_tag_inherited(&self, tag: &str) -> bool {
        self.has_tag(tag) || self.parent().is_some_and(|parent| parent.has_tag_inherited(tag))
    }

    pub fn add_tag(&self, tag: impl Into<String>) -> bool {
        self.0.tags.borrow_mut().insert(tag.into())
    }

    pub fn remove_tag(&self, tag: &str) -> bool {
        self.0.tags.borrow_mut().remove(tag)
    }

    // =========================================================================
    // Position in the tree
    // =========================================================================

    pub fn parent(&self) -> Option<Group> {
        self.0.parent.borrow().upgrade().map(Group)
    }

    pub(crate) fn set_parent(&self, parent: Weak<GroupInner>) {
        *self.0.parent.borrow_mut() = parent;
    }

    fn is_descendant_of(&self, ancestor: &Group) -> bool {
        let mut current = self.parent();
        while let Some(group) = current {
            if group.ptr_eq(ancestor) {
                return true;
            }
            current = group.parent();
        }
        false
    }

    pub fn path_segments(&self) -> Vec<String> {
        let mut segments = vec![self.0.name.clone()];
        let mut current = self.parent();
        while let Some(group) = current {
            segments.push(group.name().to_string());
            current = group.parent();
        }
        segments.reverse();
        segments
    }

    pub fn path(&self) -> String {
        self.path_segments().join(&PATH_SEPARATOR.to_string())
    }

    fn child_path(&self, relative: &str) -> String {
        format!("{}{}{}", self.path(), PATH_SEPARATOR, relative)
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn connect_event<F>(&self, kind: EventKind, handler: F) -> EventId
    where
        F: Fn(&Group, &Event) -> anyhow::Result<()> + 'static,
    {
        self.0.events.borrow_mut().connect(kind, Rc::new(handler))
    }

    pub fn remove_event(&self, id: EventId) -> Result<(), TreeError> {
        if self.0.events.borrow_mut().remove(id) {
            Ok(())
        } else {
            Err(TreeError::EventNotFound(id))
        }
    }

    pub fn has_event(&self, id: EventId) -> bool {
        self.0.events.borrow().contains(id)
    }

    pub fn set_event_enabled(&self, id: EventId, enabled: bool) -> Result<(), TreeError> {
        if self.0.events.borrow_mut().set_enabled(id, enabled) {
            Ok(())
        } else {
            Err(TreeError::EventNotFound(id))
        }
    }

    /// Run this group's handlers for `event`, stopping at the first error.
    pub fn invoke_event(&self, event: &Event) -> anyhow::Result<()> {
        let handlers = self.0.events.borrow().handlers_for(event.kind());
        events::dispatch(handlers, self, event)
    }

    // =========================================================================
    // Persistence shorthands
    // =========================================================================

    /// Load this group; see [`Persistor::load`].
    pub fn load(&self, sources: impl Into<Sources>, options: PersistOptions<'_>) -> PersistorResult {
        Persistor::load(&[Node::from(self.clone())], sources.into(), options)
    }

    /// Save this group; see [`Persistor::save`].
    pub fn save(&self, sources: impl Into<Sources>, options: PersistOptions<'_>) -> PersistorResult {
        Persistor::save(&[Node::from(self.clone())], sources.into(), options)
    }

    pub(crate) fn ptr_eq(&self, other: &Group) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Group {}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children: Vec<String> = self
            .0
            .children
            .borrow()
            .iter()
            .map(|child| child.name().to_string())
            .collect();
        f.debug_struct("Group")
            .field("name", &self.0.name)
            .field("children", &children)
            .finish()
    }
}
