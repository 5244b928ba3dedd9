//! tree::setting
//!
//! Leaf nodes holding one typed value.
//!
//! # Assignment
//!
//! [`Setting::set_value`] coerces the raw value to the setting's kind and
//! validates it. The value is stored either way; `is_valid` records whether
//! it passed, and a rejected value emits `value-not-valid` instead of
//! `value-changed`. [`Setting::reset`] restores a copy of the default and
//! leaves `is_valid` untouched. Both return the first error raised by an
//! event handler.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use settree::tree::{Setting, SettingKind};
//!
//! let setting = Setting::builder("file_extension", SettingKind::String)
//!     .default_value("png")
//!     .build()
//!     .unwrap();
//!
//! setting.set_value("jpg").unwrap();
//! assert_eq!(setting.value(), json!("jpg"));
//!
//! setting.reset().unwrap();
//! assert_eq!(setting.value(), json!("png"));
//! ```

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};
use tracing::debug;

use super::events::{self, Event, EventId, EventKind, EventRegistry};
use super::group::{Group, GroupInner};
use super::kind::{SettingKind, ValueNotValid};
use super::node::{document_tags, Node};
use super::{validate_name, TreeError, PATH_SEPARATOR};
use crate::persistor::{PersistOptions, Persistor, PersistorResult, Sources};

/// Handle to a setting. Clones share the same setting.
#[derive(Clone)]
pub struct Setting(Rc<SettingInner>);

struct SettingInner {
    name: String,
    kind: SettingKind,
    default_value: Value,
    display_name: Option<String>,
    description: Option<String>,
    state: RefCell<SettingState>,
    tags: RefCell<BTreeSet<String>>,
    parent: RefCell<Weak<GroupInner>>,
    events: RefCell<EventRegistry<Setting>>,
}

struct SettingState {
    value: Value,
    is_valid: bool,
}

/// Builder for [`Setting`]; obtained from [`Setting::builder`].
#[derive(Debug, Clone)]
pub struct SettingBuilder {
    name: String,
    kind: SettingKind,
    default_value: Option<Value>,
    display_name: Option<String>,
    description: Option<String>,
    tags: BTreeSet<String>,
}

impl SettingBuilder {
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Build the setting. Its value starts as a copy of the default.
    ///
    /// # Errors
    ///
    /// - `TreeError::InvalidName` if the name is empty or contains `/`
    /// - `TreeError::InvalidDefault` if an explicit default fails validation
    pub fn build(self) -> Result<Setting, TreeError> {
        validate_name(&self.name)?;

        let default_value = match self.default_value {
            Some(raw) => {
                let value = self.kind.coerce(raw);
                self.kind
                    .validate(&value)
                    .map_err(|reason| TreeError::InvalidDefault {
                        name: self.name.clone(),
                        message: reason.message,
                    })?;
                value
            }
            None => self.kind.implicit_default(),
        };

        Ok(Setting(Rc::new(SettingInner {
            name: self.name,
            kind: self.kind,
            state: RefCell::new(SettingState {
                value: default_value.clone(),
                is_valid: true,
            }),
            default_value,
            display_name: self.display_name,
            description: self.description,
            tags: RefCell::new(self.tags),
            parent: RefCell::new(Weak::new()),
            events: RefCell::new(EventRegistry::new()),
        })))
    }
}

impl Setting {
    pub fn builder(name: impl Into<String>, kind: SettingKind) -> SettingBuilder {
        SettingBuilder {
            name: name.into(),
            kind,
            default_value: None,
            display_name: None,
            description: None,
            tags: BTreeSet::new(),
        }
    }

    /// Setting with the kind's implicit default and no tags.
    pub fn new(name: impl Into<String>, kind: SettingKind) -> Result<Self, TreeError> {
        Self::builder(name, kind).build()
    }

    /// Build a setting from a stored setting node.
    ///
    /// Reads `name`, `type` (aliases accepted), type attributes,
    /// `default_value`, `display_name`, `description` and `tags`. The stored
    /// `value` is not applied; the caller assigns it.
    pub fn from_document(doc: &Map<String, Value>) -> Result<Self, TreeError> {
        let name = doc.get("name").and_then(Value::as_str).ok_or_else(|| {
            TreeError::InvalidDocument("setting node without a string 'name'".into())
        })?;
        let type_name = doc.get("type").and_then(Value::as_str).ok_or_else(|| {
            TreeError::InvalidDocument(format!("setting '{}' has no string 'type'", name))
        })?;

        let kind = SettingKind::from_type_name(type_name, doc)?;
        let mut builder = Setting::builder(name, kind).tags(document_tags(doc)?);
        if let Some(default_value) = doc.get("default_value") {
            builder = builder.default_value(default_value.clone());
        }
        if let Some(display_name) = doc.get("display_name").and_then(Value::as_str) {
            builder = builder.display_name(display_name);
        }
        if let Some(description) = doc.get("description").and_then(Value::as_str) {
            builder = builder.description(description);
        }
        builder.build()
    }

    /// Serialize to a setting node.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert("name".into(), Value::from(self.name()));
        doc.insert("type".into(), Value::from(self.type_name()));
        doc.insert("value".into(), self.value());
        doc.insert("default_value".into(), self.0.default_value.clone());
        if let Some(display_name) = &self.0.display_name {
            doc.insert("display_name".into(), Value::from(display_name.as_str()));
        }
        if let Some(description) = &self.0.description {
            doc.insert("description".into(), Value::from(description.as_str()));
        }
        doc.extend(self.0.kind.attributes());
        let tags = self.tags();
        if !tags.is_empty() {
            doc.insert("tags".into(), Value::from(tags));
        }
        Value::Object(doc)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> &SettingKind {
        &self.0.kind
    }

    pub fn type_name(&self) -> &'static str {
        self.0.kind.type_name()
    }

    /// A copy of the current value.
    pub fn value(&self) -> Value {
        self.0.state.borrow().value.clone()
    }

    pub fn default_value(&self) -> &Value {
        &self.0.default_value
    }

    /// Whether the last assigned value passed validation.
    pub fn is_valid(&self) -> bool {
        self.0.state.borrow().is_valid
    }

    /// Explicit display name, or the name with underscores replaced by
    /// spaces and the first letter capitalised.
    pub fn display_name(&self) -> String {
        match &self.0.display_name {
            Some(display_name) => display_name.clone(),
            None => humanize(&self.0.name),
        }
    }

    /// Explicit description, or the display name.
    pub fn description(&self) -> String {
        match &self.0.description {
            Some(description) => description.clone(),
            None => self.display_name(),
        }
    }

    /// Check a value against this setting without assigning it.
    pub fn validate(&self, value: &Value) -> Result<(), ValueNotValid> {
        self.0.kind.validate(value)
    }

    /// Coerce, validate and store a value.
    ///
    /// Fires `before-set-value`, then `value-changed` or `value-not-valid`,
    /// then `after-set-value`. An invalid value is stored with `is_valid`
    /// false and is not an error.
    ///
    /// # Errors
    ///
    /// The first handler error. A failing `before-set-value` handler leaves
    /// the value untouched.
    pub fn set_value(&self, raw: impl Into<Value>) -> anyhow::Result<()> {
        self.invoke_event(&Event::BeforeSetValue)?;

        let value = self.0.kind.coerce(raw.into());
        let outcome = self.0.kind.validate(&value);
        {
            let mut state = self.0.state.borrow_mut();
            state.value = value;
            state.is_valid = outcome.is_ok();
        }

        match outcome {
            Ok(()) => self.invoke_event(&Event::ValueChanged)?,
            Err(reason) => {
                debug!(setting = %self.path(), reason = %reason, "rejected value");
                self.invoke_event(&Event::ValueNotValid(reason))?;
            }
        }

        self.invoke_event(&Event::AfterSetValue)
    }

    /// Restore a copy of the default value. Tags are not consulted.
    ///
    /// # Errors
    ///
    /// The first handler error, as for [`set_value`](Self::set_value).
    pub fn reset(&self) -> anyhow::Result<()> {
        self.invoke_event(&Event::BeforeReset)?;
        self.0.state.borrow_mut().value = self.0.default_value.clone();
        self.invoke_event(&Event::ValueChanged)?;
        self.invoke_event(&Event::AfterReset)
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// Own tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        self.0.tags.borrow().iter().cloned().collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.0.tags.borrow().contains(tag)
    }

    /// Whether this setting or any ancestor carries `tag`.
    pub fn has_tag_inherited(&self, tag: &str) -> bool {
        self.has_tag(tag) || self.parent().is_some_and(|parent| parent.has_tag_inherited(tag))
    }

    /// Returns false if the tag was already present.
    pub fn add_tag(&self, tag: impl Into<String>) -> bool {
        self.0.tags.borrow_mut().insert(tag.into())
    }

    /// Returns false if the tag was not present.
    pub fn remove_tag(&self, tag: &str) -> bool {
        self.0.tags.borrow_mut().remove(tag)
    }

    // =========================================================================
    // Position in the tree
    // =========================================================================

    pub fn parent(&self) -> Option<Group> {
        self.0.parent.borrow().upgrade().map(Group::from_inner)
    }

    pub(crate) fn set_parent(&self, parent: Weak<GroupInner>) {
        *self.0.parent.borrow_mut() = parent;
    }

    /// Names from the topmost ancestor down to this setting.
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

    /// Path such as `root/main/file_extension`.
    pub fn path(&self) -> String {
        self.path_segments().join(&PATH_SEPARATOR.to_string())
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn connect_event<F>(&self, kind: EventKind, handler: F) -> EventId
    where
        F: Fn(&Setting, &Event) -> anyhow::Result<()> + 'static,
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

    /// Subscribe to `kind` on every setting of the current thread.
    ///
    /// Global handlers run before a setting's own handlers.
    pub fn connect_global_event<F>(kind: EventKind, handler: F) -> EventId
    where
        F: Fn(&Setting, &Event) -> anyhow::Result<()> + 'static,
    {
        events::connect_global(kind, Rc::new(handler))
    }

    pub fn remove_global_event(id: EventId) -> Result<(), TreeError> {
        if events::remove_global(id) {
            Ok(())
        } else {
            Err(TreeError::EventNotFound(id))
        }
    }

    /// Run the global handlers, then this setting's handlers, for `event`.
    /// The first handler error ends the round and is returned.
    pub fn invoke_event(&self, event: &Event) -> anyhow::Result<()> {
        let kind = event.kind();
        let mut handlers = events::global_handlers(kind);
        handlers.extend(self.0.events.borrow().handlers_for(kind));
        events::dispatch(handlers, self, event)
    }

    // =========================================================================
    // Persistence shorthands
    // =========================================================================

    /// Load this setting alone; see [`Persistor::load`].
    pub fn load(&self, sources: impl Into<Sources>, options: PersistOptions<'_>) -> PersistorResult {
        Persistor::load(&[Node::from(self.clone())], sources.into(), options)
    }

    /// Save this setting alone; see [`Persistor::save`].
    pub fn save(&self, sources: impl Into<Sources>, options: PersistOptions<'_>) -> PersistorResult {
        Persistor::save(&[Node::from(self.clone())], sources.into(), options)
    }

    pub(crate) fn ptr_eq(&self, other: &Setting) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Setting {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Setting {}

impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.state.borrow();
        f.debug_struct("Setting")
            .field("name", &self.0.name)
            .field("type", &self.0.kind.type_name())
            .field("value", &state.value)
            .field("is_valid", &state.is_valid)
            .finish()
    }
}

fn humanize(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn extension() -> Setting {
        Setting::builder("file_extension", SettingKind::String)
            .default_value("png")
            .build()
            .expect("valid setting")
    }

    fn recorder(setting: &Setting) -> Rc<RefCell<Vec<EventKind>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        for kind in EventKind::ALL {
            let seen = Rc::clone(&seen);
            setting.connect_event(kind, move |_, event| {
                seen.borrow_mut().push(event.kind());
                Ok(())
            });
        }
        seen
    }

    #[test]
    fn starts_at_default() {
        let setting = extension();
        assert_eq!(setting.value(), json!("png"));
        assert_eq!(setting.default_value(), &json!("png"));
        assert!(setting.is_valid());
    }

    #[test]
    fn implicit_default_per_kind() {
        let setting = Setting::new("count", SettingKind::int()).expect("valid");
        assert_eq!(setting.value(), json!(0));
    }

    #[test]
    fn rejects_bad_names() {
        assert!(matches!(
            Setting::new("", SettingKind::String),
            Err(TreeError::InvalidName(_))
        ));
        assert!(matches!(
            Setting::new("a/b", SettingKind::String),
            Err(TreeError::InvalidName(_))
        ));
    }

    #[test]
    fn rejects_invalid_explicit_default() {
        let err = Setting::builder("count", SettingKind::Int { min: Some(1), max: None })
            .default_value(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidDefault { .. }));
    }

    #[test]
    fn set_value_fires_events_in_order() {
        let setting = extension();
        let seen = recorder(&setting);

        setting.set_value("jpg").expect("set value");

        assert_eq!(setting.value(), json!("jpg"));
        assert_eq!(
            *seen.borrow(),
            vec![
                EventKind::BeforeSetValue,
                EventKind::ValueChanged,
                EventKind::AfterSetValue
            ]
        );
    }

    #[test]
    fn invalid_value_is_kept_and_flagged() {
        let setting = Setting::builder("count", SettingKind::Int { min: Some(0), max: Some(5) })
            .build()
            .expect("valid");
        let reasons = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&reasons);
        setting.connect_event(EventKind::ValueNotValid, move |_, event| {
            if let Event::ValueNotValid(reason) = event {
                sink.borrow_mut().push(reason.message_id.clone());
            }
            Ok(())
        });
        let seen = recorder(&setting);

        setting.set_value(9).expect("set value");

        assert_eq!(setting.value(), json!(9));
        assert!(!setting.is_valid());
        assert_eq!(*reasons.borrow(), vec!["above_max".to_string()]);
        assert!(!seen.borrow().contains(&EventKind::ValueChanged));

        setting.set_value(3).expect("set value");
        assert!(setting.is_valid());
    }

    #[test]
    fn reset_restores_independent_copy_of_default() {
        let setting = Setting::builder("items", SettingKind::list())
            .default_value(json!([1, 2]))
            .build()
            .expect("valid");
        setting.set_value(json!([3])).expect("set value");
        let seen = recorder(&setting);

        setting.reset().expect("reset");

        assert_eq!(setting.value(), json!([1, 2]));
        assert_eq!(
            *seen.borrow(),
            vec![
                EventKind::BeforeReset,
                EventKind::ValueChanged,
                EventKind::AfterReset
            ]
        );

        setting.set_value(json!([1, 2, 3])).expect("set value");
        assert_eq!(setting.default_value(), &json!([1, 2]));
    }

    #[test]
    fn reset_keeps_validity_flag() {
        let setting = Setting::builder("count", SettingKind::Int { min: Some(0), max: None })
            .build()
            .expect("valid");
        setting.set_value(-4).expect("set value");
        setting.reset().expect("reset");
        assert_eq!(setting.value(), json!(0));
        assert!(!setting.is_valid());
    }

    #[test]
    fn global_handlers_run_first() {
        let setting = extension();
        let order = Rc::new(RefCell::new(Vec::new()));

        let local = Rc::clone(&order);
        setting.connect_event(EventKind::ValueChanged, move |_, _| {
            local.borrow_mut().push("local");
            Ok(())
        });
        let global = Rc::clone(&order);
        let id = Setting::connect_global_event(EventKind::ValueChanged, move |_, _| {
            global.borrow_mut().push("global");
            Ok(())
        });

        setting.set_value("tif").expect("set value");
        Setting::remove_global_event(id).expect("registered");

        assert_eq!(*order.borrow(), vec!["global", "local"]);
    }

    #[test]
    fn handlers_can_be_disabled_and_removed() {
        let setting = extension();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let id = setting.connect_event(EventKind::ValueChanged, move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        setting.set_event_enabled(id, false).expect("registered");
        setting.set_value("a").expect("set value");
        assert_eq!(calls.get(), 0);

        setting.set_event_enabled(id, true).expect("registered");
        setting.set_value("b").expect("set value");
        assert_eq!(calls.get(), 1);

        assert!(setting.has_event(id));
        setting.remove_event(id).expect("registered");
        assert!(!setting.has_event(id));
        assert_eq!(setting.remove_event(id), Err(TreeError::EventNotFound(id)));
    }

    #[test]
    fn handler_may_connect_during_dispatch() {
        let setting = extension();
        let handle = setting.clone();
        setting.connect_event(EventKind::ValueChanged, move |_, _| {
            handle.connect_event(EventKind::AfterReset, |_, _| Ok(()));
            Ok(())
        });
        setting.set_value("bmp").expect("set value");
    }

    #[test]
    fn failing_before_handler_keeps_value() {
        let setting = extension();
        setting.connect_event(EventKind::BeforeSetValue, |_, _| anyhow::bail!("locked"));
        let seen = recorder(&setting);

        let err = setting.set_value("jpg").unwrap_err();

        assert_eq!(err.to_string(), "locked");
        assert_eq!(setting.value(), json!("png"));
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn failing_handler_stops_the_round() {
        let setting = extension();
        let later = Rc::new(Cell::new(false));
        setting.connect_event(EventKind::ValueChanged, |s, _| {
            anyhow::bail!("preview of {} is stale", s.name())
        });
        let flag = Rc::clone(&later);
        setting.connect_event(EventKind::ValueChanged, move |_, _| {
            flag.set(true);
            Ok(())
        });
        let seen = recorder(&setting);

        let err = setting.reset().unwrap_err();

        assert_eq!(err.to_string(), "preview of file_extension is stale");
        assert!(!later.get());
        assert_eq!(*seen.borrow(), vec![EventKind::BeforeReset]);
        assert_eq!(setting.value(), json!("png"));
    }

    #[test]
    fn display_name_falls_back_to_name() {
        let setting = extension();
        assert_eq!(setting.display_name(), "File extension");
        assert_eq!(setting.description(), "File extension");

        let named = Setting::builder("x", SettingKind::String)
            .display_name("Width")
            .description("Width in pixels")
            .build()
            .expect("valid");
        assert_eq!(named.display_name(), "Width");
        assert_eq!(named.description(), "Width in pixels");
    }

    #[test]
    fn document_round_trip_keeps_metadata() {
        let setting = Setting::builder("quality", SettingKind::Int { min: Some(0), max: Some(100) })
            .default_value(90)
            .tags(["ignore_reset"])
            .build()
            .expect("valid");
        setting.set_value(75).expect("set value");

        let doc = setting.to_document();
        assert_eq!(doc["type"], json!("int"));
        assert_eq!(doc["value"], json!(75));
        assert_eq!(doc["max_value"], json!(100));
        assert_eq!(doc["tags"], json!(["ignore_reset"]));

        let restored = Setting::from_document(doc.as_object().expect("object")).expect("valid");
        assert_eq!(restored.kind(), setting.kind());
        assert_eq!(restored.default_value(), &json!(90));
        assert!(restored.has_tag("ignore_reset"));
        assert_eq!(restored.value(), json!(90));
    }

    #[test]
    fn from_document_requires_type() {
        let doc = json!({"name": "orphan", "value": 1});
        let err = Setting::from_document(doc.as_object().expect("object")).unwrap_err();
        assert!(matches!(err, TreeError::InvalidDocument(_)));
    }

    #[test]
    fn clones_share_state() {
        let setting = extension();
        let other = setting.clone();
        other.set_value("gif").expect("set value");
        assert_eq!(setting.value(), json!("gif"));
        assert_eq!(setting, other);
        assert_ne!(setting, extension());
    }
}
