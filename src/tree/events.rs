//! tree::events
//!
//! Event kinds, payloads and handler registries.
//!
//! # Dispatch order
//!
//! When a setting fires an event, handlers registered on the global channel
//! for that kind run first, then the setting's own handlers, each group in
//! registration order. The handler list is snapshotted before dispatch, so a
//! handler may connect or remove handlers without affecting the current
//! round.
//!
//! Handlers return `anyhow::Result<()>`. The first error stops the round:
//! later handlers do not run and the error is returned to the caller of
//! `set_value`, `reset` or `invoke_event`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use super::kind::ValueNotValid;
use super::setting::Setting;

/// Kinds of events a node can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ValueChanged,
    ValueNotValid,
    BeforeSetValue,
    AfterSetValue,
    BeforeReset,
    AfterReset,
    BeforeLoad,
    AfterLoad,
    BeforeSave,
    AfterSave,
}

impl EventKind {
    pub const ALL: [EventKind; 10] = [
        EventKind::ValueChanged,
        EventKind::ValueNotValid,
        EventKind::BeforeSetValue,
        EventKind::AfterSetValue,
        EventKind::BeforeReset,
        EventKind::AfterReset,
        EventKind::BeforeLoad,
        EventKind::AfterLoad,
        EventKind::BeforeSave,
        EventKind::AfterSave,
    ];

    /// The hyphenated event name, e.g. `"value-changed"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ValueChanged => "value-changed",
            EventKind::ValueNotValid => "value-not-valid",
            EventKind::BeforeSetValue => "before-set-value",
            EventKind::AfterSetValue => "after-set-value",
            EventKind::BeforeReset => "before-reset",
            EventKind::AfterReset => "after-reset",
            EventKind::BeforeLoad => "before-load",
            EventKind::AfterLoad => "after-load",
            EventKind::BeforeSave => "before-save",
            EventKind::AfterSave => "after-save",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event '{}'", s))
    }
}

/// An emitted event together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ValueChanged,
    ValueNotValid(ValueNotValid),
    BeforeSetValue,
    AfterSetValue,
    BeforeReset,
    AfterReset,
    BeforeLoad,
    AfterLoad,
    BeforeSave,
    AfterSave,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ValueChanged => EventKind::ValueChanged,
            Event::ValueNotValid(_) => EventKind::ValueNotValid,
            Event::BeforeSetValue => EventKind::BeforeSetValue,
            Event::AfterSetValue => EventKind::AfterSetValue,
            Event::BeforeReset => EventKind::BeforeReset,
            Event::AfterReset => EventKind::AfterReset,
            Event::BeforeLoad => EventKind::BeforeLoad,
            Event::AfterLoad => EventKind::AfterLoad,
            Event::BeforeSave => EventKind::BeforeSave,
            Event::AfterSave => EventKind::AfterSave,
        }
    }
}

/// Handle returned when connecting a handler; used to remove or toggle it.
///
/// Ids are unique across every registry in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

impl EventId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        EventId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) type Handler<T> = Rc<dyn Fn(&T, &Event) -> anyhow::Result<()>>;

struct Registration<T> {
    id: EventId,
    kind: EventKind,
    enabled: bool,
    handler: Handler<T>,
}

/// Ordered list of handlers attached to one node (or to the global channel).
pub(crate) struct EventRegistry<T> {
    registrations: Vec<Registration<T>>,
}

impl<T> EventRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    pub(crate) fn connect(&mut self, kind: EventKind, handler: Handler<T>) -> EventId {
        let id = EventId::next();
        self.registrations.push(Registration {
            id,
            kind,
            enabled: true,
            handler,
        });
        id
    }

    /// Returns false if no handler has this id.
    pub(crate) fn remove(&mut self, id: EventId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before
    }

    pub(crate) fn contains(&self, id: EventId) -> bool {
        self.registrations.iter().any(|r| r.id == id)
    }

    /// Returns false if no handler has this id.
    pub(crate) fn set_enabled(&mut self, id: EventId, enabled: bool) -> bool {
        match self.registrations.iter_mut().find(|r| r.id == id) {
            Some(registration) => {
                registration.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Enabled handlers for `kind`, in registration order.
    pub(crate) fn handlers_for(&self, kind: EventKind) -> Vec<Handler<T>> {
        self.registrations
            .iter()
            .filter(|r| r.enabled && r.kind == kind)
            .map(|r| Rc::clone(&r.handler))
            .collect()
    }
}

impl<T> Default for EventRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `handlers` in order, stopping at the first error.
pub(crate) fn dispatch<T>(
    handlers: Vec<Handler<T>>,
    node: &T,
    event: &Event,
) -> anyhow::Result<()> {
    for handler in handlers {
        handler(node, event)?;
    }
    Ok(())
}

thread_local! {
    static GLOBAL_SETTING_EVENTS: RefCell<EventRegistry<Setting>> = RefCell::new(EventRegistry::new());
}

pub(crate) fn connect_global(kind: EventKind, handler: Handler<Setting>) -> EventId {
    GLOBAL_SETTING_EVENTS.with(|registry| registry.borrow_mut().connect(kind, handler))
}

pub(crate) fn remove_global(id: EventId) -> bool {
    GLOBAL_SETTING_EVENTS.with(|registry| registry.borrow_mut().remove(id))
}

pub(crate) fn global_handlers(kind: EventKind) -> Vec<Handler<Setting>> {
    GLOBAL_SETTING_EVENTS.with(|registry| registry.borrow().handlers_for(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn kind_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
        assert!("value-exploded".parse::<EventKind>().is_err());
    }

    #[test]
    fn event_reports_its_kind() {
        let event = Event::ValueNotValid(ValueNotValid::new("too small", "below_min"));
        assert_eq!(event.kind(), EventKind::ValueNotValid);
        assert_eq!(Event::AfterSave.kind(), EventKind::AfterSave);
    }

    #[test]
    fn ids_are_unique() {
        let mut registry: EventRegistry<()> = EventRegistry::new();
        let a = registry.connect(EventKind::ValueChanged, Rc::new(|_, _| Ok(())));
        let b = registry.connect(EventKind::ValueChanged, Rc::new(|_, _| Ok(())));
        assert_ne!(a, b);
    }

    #[test]
    fn disabled_handlers_are_skipped() {
        let calls = Rc::new(Cell::new(0));
        let mut registry: EventRegistry<()> = EventRegistry::new();
        let counter = Rc::clone(&calls);
        let id = registry.connect(
            EventKind::ValueChanged,
            Rc::new(move |_, _| {
                counter.set(counter.get() + 1);
                Ok(())
            }),
        );

        assert!(registry.set_enabled(id, false));
        dispatch(registry.handlers_for(EventKind::ValueChanged), &(), &Event::ValueChanged)
            .expect("no handlers");
        assert_eq!(calls.get(), 0);

        assert!(registry.set_enabled(id, true));
        dispatch(registry.handlers_for(EventKind::ValueChanged), &(), &Event::ValueChanged)
            .expect("handler succeeds");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn remove_reports_missing_ids() {
        let mut registry: EventRegistry<()> = EventRegistry::new();
        let id = registry.connect(EventKind::AfterReset, Rc::new(|_, _| Ok(())));
        assert!(registry.contains(id));
        assert!(registry.remove(id));
        assert!(!registry.contains(id));
        assert!(!registry.remove(id));
    }

    #[test]
    fn handlers_are_filtered_by_kind() {
        let mut registry: EventRegistry<()> = EventRegistry::new();
        registry.connect(EventKind::BeforeLoad, Rc::new(|_, _| Ok(())));
        registry.connect(EventKind::AfterLoad, Rc::new(|_, _| Ok(())));
        registry.connect(EventKind::AfterLoad, Rc::new(|_, _| Ok(())));
        assert_eq!(registry.handlers_for(EventKind::AfterLoad).len(), 2);
        assert_eq!(registry.handlers_for(EventKind::ValueChanged).len(), 0);
    }

    #[test]
    fn dispatch_stops_at_first_error() {
        let calls = Rc::new(Cell::new(0));
        let mut registry: EventRegistry<()> = EventRegistry::new();
        let counter = Rc::clone(&calls);
        registry.connect(
            EventKind::AfterReset,
            Rc::new(move |_, _| {
                counter.set(counter.get() + 1);
                anyhow::bail!("listener failed")
            }),
        );
        let counter = Rc::clone(&calls);
        registry.connect(
            EventKind::AfterReset,
            Rc::new(move |_, _| {
                counter.set(counter.get() + 10);
                Ok(())
            }),
        );

        let err = dispatch(registry.handlers_for(EventKind::AfterReset), &(), &Event::AfterReset)
            .unwrap_err();
        assert_eq!(err.to_string(), "listener failed");
        assert_eq!(calls.get(), 1);
    }
}
