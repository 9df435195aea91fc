//! Glint Runtime
//!
//! The runtime bundles the document, event listeners, per-element data and
//! the scheduler behind one cheap-to-clone handle. Components hold a
//! [`WeakRuntime`] so that listeners and timers stored inside the runtime do
//! not keep it alive.
//!
//! No `RefCell` borrow is held while user code runs: dispatch snapshots the
//! listeners of each node first, and the scheduler releases its state before
//! invoking callbacks. Callbacks are therefore free to call back into the
//! runtime, for example to hide a toast from inside a `shown` listener.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::data::DataStore;
use crate::document::{Document, ElementId};
use crate::error::Result;
use crate::events::{DomEvent, EventDispatcher, EventInit, EventName, ListenerId};
use crate::scheduler::{FrameId, Scheduler, TimerId};
use crate::selector::Selector;

struct RuntimeInner {
    document: RefCell<Document>,
    events: RefCell<EventDispatcher>,
    data: RefCell<DataStore>,
    scheduler: Scheduler,
}

/// The element runtime - owns the document, listeners, data and scheduler
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

/// Non-owning runtime handle for storage inside listeners and timers
#[derive(Clone)]
pub struct WeakRuntime {
    inner: Weak<RuntimeInner>,
}

impl WeakRuntime {
    pub fn upgrade(&self) -> Option<Runtime> {
        self.inner.upgrade().map(|inner| Runtime { inner })
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                document: RefCell::new(Document::new()),
                events: RefCell::new(EventDispatcher::new()),
                data: RefCell::new(DataStore::new()),
                scheduler: Scheduler::new(),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakRuntime {
        WeakRuntime {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same runtime
    pub fn ptr_eq(&self, other: &Runtime) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Subsystems
    // ========================================================================

    pub fn document(&self) -> Ref<'_, Document> {
        self.inner.document.borrow()
    }

    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.inner.document.borrow_mut()
    }

    pub fn events(&self) -> Ref<'_, EventDispatcher> {
        self.inner.events.borrow()
    }

    pub fn events_mut(&self) -> RefMut<'_, EventDispatcher> {
        self.inner.events.borrow_mut()
    }

    pub fn data(&self) -> Ref<'_, DataStore> {
        self.inner.data.borrow()
    }

    pub fn data_mut(&self) -> RefMut<'_, DataStore> {
        self.inner.data.borrow_mut()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    // ========================================================================
    // Document shortcuts
    // ========================================================================

    pub fn create_element(&self, tag: &str) -> ElementId {
        self.document_mut().create_element(tag)
    }

    pub fn append_child(&self, parent: ElementId, child: ElementId) -> bool {
        self.document_mut().append_child(parent, child)
    }

    /// Remove an element subtree along with its listeners and data
    pub fn remove_element(&self, id: ElementId) {
        let removed = self.document_mut().remove(id);
        let mut events = self.events_mut();
        let mut data = self.data_mut();
        for element in removed {
            events.remove_element(element);
            data.remove_element(element);
        }
    }

    pub fn set_attribute(&self, id: ElementId, name: &str, value: &str) -> bool {
        self.document_mut().set_attribute(id, name, value)
    }

    pub fn add_class(&self, id: ElementId, class: &str) -> bool {
        self.document_mut().add_class(id, class)
    }

    pub fn remove_class(&self, id: ElementId, class: &str) -> bool {
        self.document_mut().remove_class(id, class)
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.document().has_class(id, class)
    }

    pub fn class_name(&self, id: ElementId) -> String {
        self.document().class_name(id)
    }

    pub fn set_style(&self, id: ElementId, property: &str, value: &str) -> bool {
        self.document_mut().set_style(id, property, value)
    }

    pub fn add_stylesheet(&self, css: &str) -> Result<usize> {
        self.document_mut().add_stylesheet(css)
    }

    pub fn computed_style(&self, id: ElementId, property: &str) -> Option<String> {
        self.document()
            .computed_style(id, property)
            .map(str::to_string)
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn on<F>(&self, element: ElementId, name: &str, callback: F) -> ListenerId
    where
        F: Fn(&DomEvent) + 'static,
    {
        self.events_mut().on(element, name, callback)
    }

    pub fn one<F>(&self, element: ElementId, name: &str, callback: F) -> ListenerId
    where
        F: Fn(&DomEvent) + 'static,
    {
        self.events_mut().one(element, name, callback)
    }

    /// Delegated listener, see [`EventDispatcher::on_delegated`]
    pub fn on_delegated<F>(
        &self,
        element: ElementId,
        name: &str,
        selector: &str,
        callback: F,
    ) -> Result<ListenerId>
    where
        F: Fn(&DomEvent) + 'static,
    {
        let selector = Selector::parse(selector)?;
        Ok(self
            .events_mut()
            .on_delegated(element, name, selector, callback))
    }

    pub fn off(&self, element: ElementId, name: &str) -> usize {
        self.events_mut().off(element, name)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.events_mut().remove(id)
    }

    /// Create and dispatch an event on `element`
    ///
    /// A namespaced native name such as `click.dismiss` dispatches a plain
    /// `click`.
    pub fn trigger(&self, element: ElementId, name: &str, init: EventInit) -> DomEvent {
        let event = DomEvent::new(EventName::parse(name).event_type, element, init);
        self.dispatch(&event);
        event
    }

    /// Dispatch a `click` on `element`
    pub fn click(&self, element: ElementId) -> DomEvent {
        self.trigger(element, "click", EventInit::cancelable())
    }

    /// Deliver `event` to its target, then to each ancestor while it bubbles
    ///
    /// The propagation path is fixed before any listener runs. At each node
    /// the matching listeners are snapshotted; a listener removed by an
    /// earlier callback in the same dispatch is skipped.
    pub fn dispatch(&self, event: &DomEvent) {
        let path: Vec<ElementId> = {
            let document = self.document();
            if event.bubbles() {
                document.ancestors(event.target()).collect()
            } else {
                document
                    .contains(event.target())
                    .then_some(event.target())
                    .into_iter()
                    .collect()
            }
        };

        tracing::trace!(event = event.event_type(), target = ?event.target(), "dispatch");

        for node in path {
            event.set_current_target(node);
            let listeners = self.events().snapshot(node, event.event_type());

            for listener in listeners {
                if !self.events().contains(listener.id) {
                    continue;
                }

                let delegate = match &listener.selector {
                    Some(selector) => {
                        let matched =
                            self.document()
                                .closest_within(event.target(), selector, node);
                        match matched {
                            Some(matched) => Some(matched),
                            None => continue,
                        }
                    }
                    None => None,
                };
                event.set_delegate_target(delegate);

                if listener.once {
                    self.events_mut().remove(listener.id);
                }
                (listener.callback)(event);
            }

            event.set_delegate_target(None);
            if event.is_propagation_stopped() {
                break;
            }
        }
    }

    // ========================================================================
    // Data
    // ========================================================================

    pub fn set_data<T: 'static>(&self, element: ElementId, key: &str, value: T) {
        self.data_mut().set(element, key, value);
    }

    pub fn get_data<T: Clone + 'static>(&self, element: ElementId, key: &str) -> Option<T> {
        self.data().get(element, key)
    }

    pub fn remove_data(&self, element: ElementId, key: &str) -> bool {
        self.data_mut().remove(element, key)
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    pub fn now(&self) -> Duration {
        self.scheduler().now()
    }

    pub fn set_timeout<F>(&self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce() + 'static,
    {
        self.scheduler().set_timeout(delay, callback)
    }

    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.scheduler().clear_timeout(id)
    }

    pub fn request_animation_frame<F>(&self, callback: F) -> FrameId
    where
        F: FnOnce() + 'static,
    {
        self.scheduler().request_animation_frame(callback)
    }

    pub fn cancel_animation_frame(&self, id: FrameId) -> bool {
        self.scheduler().cancel_animation_frame(id)
    }

    pub fn run_animation_frame(&self) -> usize {
        self.scheduler().run_animation_frame()
    }

    pub fn advance(&self, elapsed: Duration) -> usize {
        self.scheduler().advance(elapsed)
    }

    /// Get statistics about the runtime
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            elements: self.document().len(),
            data_entries: self.data().len(),
            pending_timers: self.scheduler().pending_timers(),
            pending_frames: self.scheduler().pending_frames(),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStats {
    pub elements: usize,
    pub data_entries: usize,
    pub pending_timers: usize,
    pub pending_frames: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn tree(runtime: &Runtime) -> (ElementId, ElementId, ElementId) {
        let root = runtime.create_element("div");
        let toast = runtime.create_element("div");
        let button = runtime.create_element("button");
        runtime.append_child(root, toast);
        runtime.append_child(toast, button);
        (root, toast, button)
    }

    #[test]
    fn test_bubbling_order_and_stop_propagation() {
        let runtime = Runtime::new();
        let (root, toast, button) = tree(&runtime);
        let log = Rc::new(RefCell::new(Vec::new()));

        for (el, name) in [(button, "button"), (toast, "toast"), (root, "root")] {
            let log = Rc::clone(&log);
            runtime.on(el, "show.gl.toast", move |e| {
                assert_eq!(e.current_target(), el);
                log.borrow_mut().push(name);
            });
        }

        runtime.trigger(button, "show.gl.toast", EventInit::notify());
        assert_eq!(*log.borrow(), vec!["button", "toast", "root"]);

        log.borrow_mut().clear();
        runtime.on(toast, "show.gl.toast", |e| e.stop_propagation());
        runtime.trigger(button, "show.gl.toast", EventInit::notify());
        assert_eq!(*log.borrow(), vec!["button", "toast"]);

        log.borrow_mut().clear();
        let init = EventInit {
            bubbles: false,
            cancelable: false,
        };
        runtime.trigger(button, "show.gl.toast", init);
        assert_eq!(*log.borrow(), vec!["button"]);
    }

    #[test]
    fn test_prevent_default_visible_to_caller() {
        let runtime = Runtime::new();
        let (_, toast, _) = tree(&runtime);
        runtime.on(toast, "hide.gl.toast", |e| e.prevent_default());

        let event = runtime.trigger(toast, "hide.gl.toast", EventInit::cancelable());
        assert!(event.is_default_prevented());

        let event = runtime.trigger(toast, "hidden.gl.toast", EventInit::notify());
        assert!(!event.is_default_prevented());
    }

    #[test]
    fn test_one_runs_once() {
        let runtime = Runtime::new();
        let (_, toast, _) = tree(&runtime);
        let count = Rc::new(RefCell::new(0));
        let c = Rc::clone(&count);
        runtime.one(toast, "transitionend", move |_| *c.borrow_mut() += 1);

        runtime.trigger(toast, "transitionend", EventInit::notify());
        runtime.trigger(toast, "transitionend", EventInit::notify());
        assert_eq!(*count.borrow(), 1);
        assert_eq!(runtime.events().listener_count(toast), 0);
    }

    #[test]
    fn test_delegated_click() {
        let runtime = Runtime::new();
        let (_, toast, button) = tree(&runtime);
        let icon = runtime.create_element("span");
        runtime.append_child(button, icon);
        runtime.set_attribute(button, "data-dismiss", "toast");

        let hits = Rc::new(RefCell::new(Vec::new()));
        let h = Rc::clone(&hits);
        runtime
            .on_delegated(toast, "click.dismiss.gl.toast", r#"[data-dismiss="toast"]"#, move |e| {
                h.borrow_mut().push(e.delegate_target());
            })
            .unwrap();

        runtime.click(icon);
        runtime.click(toast);
        runtime.click(button);
        assert_eq!(*hits.borrow(), vec![Some(button), Some(button)]);

        assert_eq!(runtime.off(toast, "click.dismiss.gl.toast"), 1);
        runtime.click(button);
        assert_eq!(hits.borrow().len(), 2);
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let runtime = Runtime::new();
        let (_, toast, _) = tree(&runtime);
        let log = Rc::new(RefCell::new(Vec::new()));

        let second: Rc<RefCell<Option<ListenerId>>> = Rc::new(RefCell::new(None));
        let rt = runtime.clone();
        let s = Rc::clone(&second);
        let l = Rc::clone(&log);
        runtime.on(toast, "click", move |_| {
            l.borrow_mut().push("first");
            if let Some(id) = *s.borrow() {
                rt.remove_listener(id);
            }
        });
        let l = Rc::clone(&log);
        let id = runtime.on(toast, "click", move |_| l.borrow_mut().push("second"));
        *second.borrow_mut() = Some(id);

        runtime.click(toast);
        assert_eq!(*log.borrow(), vec!["first"]);
    }

    #[test]
    fn test_remove_element_releases_state() {
        let runtime = Runtime::new();
        let (root, toast, button) = tree(&runtime);
        runtime.on(button, "click", |_| {});
        runtime.set_data(toast, "gl.toast", 1u8);

        runtime.remove_element(toast);
        assert_eq!(runtime.events().listener_count(button), 0);
        assert_eq!(runtime.get_data::<u8>(toast, "gl.toast"), None);
        assert_eq!(
            runtime.stats(),
            RuntimeStats {
                elements: 1,
                data_entries: 0,
                pending_timers: 0,
                pending_frames: 0,
            }
        );
        assert!(runtime.document().contains(root));
    }

    #[test]
    fn test_weak_runtime() {
        let runtime = Runtime::new();
        let weak = runtime.downgrade();
        assert!(weak.upgrade().is_some_and(|rt| rt.ptr_eq(&runtime)));
        drop(runtime);
        assert!(weak.upgrade().is_none());
    }
}
