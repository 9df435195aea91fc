//! Named event listeners and dispatch state
//!
//! Events are identified by name. A name whose first segment is a native
//! event type (`click`, `transitionend`, ...) is split into that type and a
//! namespace, so `click.dismiss.gl.toast` is a `click` listener tagged
//! `dismiss.gl.toast`. Any other name is a custom event and the full name is
//! its type: `show.gl.toast` only matches listeners for `show.gl.toast`.
//!
//! The [`EventDispatcher`] only stores listeners. Propagation needs the
//! document for bubbling and delegation and is driven by
//! [`Runtime::dispatch`](crate::runtime::Runtime::dispatch), which takes a
//! snapshot of the listeners at each node and never holds a borrow while a
//! callback runs.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};

use crate::document::ElementId;
use crate::selector::Selector;

/// Native event types; the first dot-separated segment of a listener name
/// is only treated as a namespace separator for these
pub const NATIVE_EVENTS: &[&str] = &[
    "click",
    "dblclick",
    "mouseup",
    "mousedown",
    "contextmenu",
    "mouseover",
    "mouseout",
    "mousemove",
    "keydown",
    "keypress",
    "keyup",
    "touchstart",
    "touchmove",
    "touchend",
    "touchcancel",
    "pointerdown",
    "pointermove",
    "pointerup",
    "pointerleave",
    "pointercancel",
    "focus",
    "blur",
    "focusin",
    "focusout",
    "change",
    "input",
    "submit",
    "reset",
    "select",
    "load",
    "error",
    "abort",
    "scroll",
    "resize",
    "transitionend",
];

new_key_type! {
    /// Handle to a registered listener
    pub struct ListenerId;
}

/// Callback for handling events
///
/// Uses Rc since the runtime is single-threaded.
pub type EventCallback = Rc<dyn Fn(&DomEvent)>;

/// A listener name split into event type and optional namespace
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventName {
    pub event_type: String,
    pub namespace: Option<String>,
}

impl EventName {
    pub fn parse(name: &str) -> Self {
        match name.split_once('.') {
            Some((base, namespace)) if NATIVE_EVENTS.contains(&base) => Self {
                event_type: base.to_string(),
                namespace: Some(namespace.to_string()),
            },
            _ => Self {
                event_type: name.to_string(),
                namespace: None,
            },
        }
    }

    /// Whether a listener registered under `self` is removed by `off(filter)`
    ///
    /// A filter without a namespace removes every listener of that type.
    fn matches_filter(&self, filter: &EventName) -> bool {
        self.event_type == filter.event_type
            && (filter.namespace.is_none() || self.namespace == filter.namespace)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{}.{}", self.event_type, namespace),
            None => write!(f, "{}", self.event_type),
        }
    }
}

/// Options for a dispatched event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
}

impl EventInit {
    /// Bubbles, cannot be canceled
    pub const fn notify() -> Self {
        Self {
            bubbles: true,
            cancelable: false,
        }
    }

    /// Bubbles and can be canceled with `prevent_default`
    pub const fn cancelable() -> Self {
        Self {
            bubbles: true,
            cancelable: true,
        }
    }
}

impl Default for EventInit {
    fn default() -> Self {
        Self::notify()
    }
}

/// An event travelling through the element tree
#[derive(Debug)]
pub struct DomEvent {
    event_type: String,
    target: ElementId,
    init: EventInit,
    current_target: Cell<ElementId>,
    delegate_target: Cell<Option<ElementId>>,
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl DomEvent {
    pub fn new(event_type: impl Into<String>, target: ElementId, init: EventInit) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            init,
            current_target: Cell::new(target),
            delegate_target: Cell::new(None),
            default_prevented: Cell::new(false),
            propagation_stopped: Cell::new(false),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Element the event was dispatched on
    pub fn target(&self) -> ElementId {
        self.target
    }

    /// Element whose listener is currently running
    pub fn current_target(&self) -> ElementId {
        self.current_target.get()
    }

    /// For delegated listeners, the element that matched the selector
    pub fn delegate_target(&self) -> Option<ElementId> {
        self.delegate_target.get()
    }

    pub fn bubbles(&self) -> bool {
        self.init.bubbles
    }

    pub fn is_cancelable(&self) -> bool {
        self.init.cancelable
    }

    /// Cancel the default action; ignored for non-cancelable events
    pub fn prevent_default(&self) {
        if self.init.cancelable {
            self.default_prevented.set(true);
        }
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    /// Stop bubbling after the current element's listeners have run
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub(crate) fn set_current_target(&self, id: ElementId) {
        self.current_target.set(id);
    }

    pub(crate) fn set_delegate_target(&self, id: Option<ElementId>) {
        self.delegate_target.set(id);
    }
}

struct Listener {
    element: ElementId,
    name: EventName,
    selector: Option<Selector>,
    once: bool,
    callback: EventCallback,
}

/// Snapshot of a listener taken before callbacks run
#[derive(Clone)]
pub struct ListenerEntry {
    pub id: ListenerId,
    pub selector: Option<Selector>,
    pub once: bool,
    pub callback: EventCallback,
}

/// Listener registry keyed by element
#[derive(Default)]
pub struct EventDispatcher {
    listeners: SlotMap<ListenerId, Listener>,
    by_element: FxHashMap<ElementId, Vec<ListenerId>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(
        &mut self,
        element: ElementId,
        name: &str,
        selector: Option<Selector>,
        once: bool,
        callback: EventCallback,
    ) -> ListenerId {
        let name = EventName::parse(name);
        tracing::trace!(?element, event = %name, once, "add listener");
        let id = self.listeners.insert(Listener {
            element,
            name,
            selector,
            once,
            callback,
        });
        self.by_element.entry(element).or_default().push(id);
        id
    }

    /// Listen for `name` on `element`
    pub fn on<F>(&mut self, element: ElementId, name: &str, callback: F) -> ListenerId
    where
        F: Fn(&DomEvent) + 'static,
    {
        self.insert(element, name, None, false, Rc::new(callback))
    }

    /// Listen for `name` on `element`, removing the listener after its first call
    pub fn one<F>(&mut self, element: ElementId, name: &str, callback: F) -> ListenerId
    where
        F: Fn(&DomEvent) + 'static,
    {
        self.insert(element, name, None, true, Rc::new(callback))
    }

    /// Listen for `name` on `element`, but only for events whose target is
    /// (or is inside) a descendant matching `selector`
    pub fn on_delegated<F>(
        &mut self,
        element: ElementId,
        name: &str,
        selector: Selector,
        callback: F,
    ) -> ListenerId
    where
        F: Fn(&DomEvent) + 'static,
    {
        self.insert(element, name, Some(selector), false, Rc::new(callback))
    }

    /// Remove a single listener; returns false if it was already gone
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(listener) = self.listeners.remove(id) else {
            return false;
        };
        if let Some(ids) = self.by_element.get_mut(&listener.element) {
            ids.retain(|l| *l != id);
            if ids.is_empty() {
                self.by_element.remove(&listener.element);
            }
        }
        true
    }

    /// Remove the listeners on `element` registered under `name`
    ///
    /// `off(el, "click")` removes every click listener while
    /// `off(el, "click.dismiss.gl.toast")` only removes that namespace.
    /// Returns the number of listeners removed.
    pub fn off(&mut self, element: ElementId, name: &str) -> usize {
        let filter = EventName::parse(name);
        let doomed: Vec<ListenerId> = self
            .by_element
            .get(&element)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| {
                        self.listeners
                            .get(*id)
                            .is_some_and(|l| l.name.matches_filter(&filter))
                    })
                    .collect()
            })
            .unwrap_or_default();

        for id in &doomed {
            self.remove(*id);
        }
        tracing::trace!(?element, event = %filter, removed = doomed.len(), "off");
        doomed.len()
    }

    /// Drop every listener attached to `element`
    pub fn remove_element(&mut self, element: ElementId) -> usize {
        let ids = self.by_element.remove(&element).unwrap_or_default();
        for id in &ids {
            self.listeners.remove(*id);
        }
        ids.len()
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(id)
    }

    /// Number of listeners on `element`
    pub fn listener_count(&self, element: ElementId) -> usize {
        self.by_element.get(&element).map_or(0, Vec::len)
    }

    /// Listeners on `element` for `event_type`, in registration order
    pub fn snapshot(&self, element: ElementId, event_type: &str) -> Vec<ListenerEntry> {
        let Some(ids) = self.by_element.get(&element) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| {
                let listener = self.listeners.get(*id)?;
                (listener.name.event_type == event_type).then(|| ListenerEntry {
                    id: *id,
                    selector: listener.selector.clone(),
                    once: listener.once,
                    callback: Rc::clone(&listener.callback),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_event_name_parse() {
        let native = EventName::parse("click.dismiss.gl.toast");
        assert_eq!(native.event_type, "click");
        assert_eq!(native.namespace.as_deref(), Some("dismiss.gl.toast"));
        assert_eq!(native.to_string(), "click.dismiss.gl.toast");

        let custom = EventName::parse("show.gl.toast");
        assert_eq!(custom.event_type, "show.gl.toast");
        assert_eq!(custom.namespace, None);

        let plain = EventName::parse("transitionend");
        assert_eq!(plain.event_type, "transitionend");
        assert_eq!(plain.namespace, None);
    }

    #[test]
    fn test_off_by_namespace() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let mut events = EventDispatcher::new();

        events.on(el, "click.dismiss.gl.toast", |_| {});
        events.on(el, "click.other", |_| {});
        events.on(el, "show.gl.toast", |_| {});
        assert_eq!(events.listener_count(el), 3);

        assert_eq!(events.off(el, "click.dismiss.gl.toast"), 1);
        assert_eq!(events.snapshot(el, "click").len(), 1);

        assert_eq!(events.off(el, "click"), 1);
        assert_eq!(events.snapshot(el, "click").len(), 0);
        assert_eq!(events.snapshot(el, "show.gl.toast").len(), 1);
    }

    #[test]
    fn test_remove_and_snapshot_order() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let mut events = EventDispatcher::new();

        let first = events.on(el, "click", |_| {});
        let second = events.one(el, "click", |_| {});
        let ids: Vec<_> = events.snapshot(el, "click").iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(events.snapshot(el, "click")[1].once);

        assert!(events.remove(first));
        assert!(!events.remove(first));
        assert!(!events.contains(first));
        assert_eq!(events.listener_count(el), 1);

        assert_eq!(events.remove_element(el), 1);
        assert_eq!(events.listener_count(el), 0);
    }

    #[test]
    fn test_prevent_default_requires_cancelable() {
        let mut doc = Document::new();
        let el = doc.create_element("div");

        let shown = DomEvent::new("shown.gl.toast", el, EventInit::notify());
        shown.prevent_default();
        assert!(!shown.is_default_prevented());

        let show = DomEvent::new("show.gl.toast", el, EventInit::cancelable());
        show.prevent_default();
        assert!(show.is_default_prevented());
        assert!(show.bubbles());
    }
}
