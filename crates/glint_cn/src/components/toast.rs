//! Toast component for dismissible, auto-hiding notifications
//!
//! A toast is bound to an existing element. Showing it adds the `show` class
//! and, when a transition name is configured, drives the CSS transition
//! classes of the enter and leave phases. Once shown, the toast hides itself
//! after `delay` unless `autohide` is off. Any descendant carrying
//! `data-dismiss="toast"` hides it when clicked.
//!
//! # Events
//!
//! | event             | when                                  | cancelable |
//! |-------------------|---------------------------------------|------------|
//! | `show.gl.toast`   | `show()` is called                    | yes        |
//! | `shown.gl.toast`  | the enter transition has finished     | no         |
//! | `hide.gl.toast`   | `hide()` is called on a visible toast | yes        |
//! | `hidden.gl.toast` | the leave transition has finished     | no         |
//!
//! # Example
//!
//! ```rust
//! use glint_cn::prelude::*;
//! use glint_core::Runtime;
//! use std::time::Duration;
//!
//! let runtime = Runtime::new();
//! let element = runtime.create_element("div");
//! runtime.set_attribute(element, "data-delay", "1000");
//!
//! let toast = Toast::new(&runtime, element, None).unwrap();
//! toast.show();
//! assert!(runtime.has_class(element, "show"));
//!
//! // Auto-hides once the delay has elapsed
//! runtime.advance(Duration::from_millis(1000));
//! assert!(!runtime.has_class(element, "show"));
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use glint_animation::{
    on_transition_end, transition_duration, PendingTransition, TransitionClasses,
    TransitionPhase,
};
use glint_core::{
    get_data_attributes, ComponentConfig, ConfigMap, ElementId, EventInit, FrameId, Result,
    Runtime, TimerId, TypeSchema, WeakRuntime,
};
use serde::Serialize;
use serde_json::Value;

/// Registry key of the instance bound to an element
pub const DATA_KEY: &str = "gl.toast";

pub const EVENT_SHOW: &str = "show.gl.toast";
pub const EVENT_SHOWN: &str = "shown.gl.toast";
pub const EVENT_HIDE: &str = "hide.gl.toast";
pub const EVENT_HIDDEN: &str = "hidden.gl.toast";
pub const EVENT_CLICK_DISMISS: &str = "click.dismiss.gl.toast";

/// Class present while the toast is visible
pub const CLASS_NAME_SHOW: &str = "show";

/// Descendants matching this selector dismiss the toast on click
pub const SELECTOR_DATA_DISMISS: &str = r#"[data-dismiss="toast"]"#;

// =============================================================================
// ToastConfig
// =============================================================================

/// Resolved toast configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ToastConfig {
    /// Hide automatically once shown
    pub autohide: bool,
    /// Time the toast stays visible before auto-hiding
    pub delay: Duration,
    /// Prefix of the transition classes; `None` disables them
    pub transition_name: Option<String>,
}

impl ComponentConfig for ToastConfig {
    const NAME: &'static str = "toast";

    const SCHEMA: TypeSchema = &[
        ("autohide", "boolean"),
        ("delay", "number"),
        ("transitionName", "string|null"),
    ];

    fn defaults() -> ConfigMap {
        let mut defaults = ConfigMap::new();
        defaults.insert("autohide".into(), Value::Bool(true));
        defaults.insert("delay".into(), Value::from(500));
        defaults.insert("transitionName".into(), Value::from("fade"));
        defaults
    }

    fn from_validated(config: &ConfigMap) -> Self {
        let delay = config
            .get("delay")
            .and_then(Value::as_f64)
            .filter(|ms| ms.is_finite() && *ms > 0.0)
            .map_or(Duration::ZERO, |ms| {
                Duration::from_micros((ms * 1000.0).round() as u64)
            });

        Self {
            autohide: config
                .get("autohide")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            delay,
            transition_name: config
                .get("transitionName")
                .and_then(Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_owned),
        }
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self::from_validated(&Self::defaults())
    }
}

/// Typed partial configuration, converted into an explicit config map
///
/// Unset fields fall through to `data-*` attributes and then defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToastOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autohide: Option<bool>,
    #[serde(rename = "delay", skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    /// `Some(None)` explicitly disables transition classes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_name: Option<Option<String>>,
}

impl ToastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn autohide(mut self, autohide: bool) -> Self {
        self.autohide = Some(autohide);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay_ms = Some(delay.as_millis() as u64);
        self
    }

    pub fn transition_name(mut self, name: impl Into<String>) -> Self {
        self.transition_name = Some(Some(name.into()));
        self
    }

    pub fn no_transition(mut self) -> Self {
        self.transition_name = Some(None);
        self
    }

    pub fn to_config_map(&self) -> ConfigMap {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => ConfigMap::new(),
        }
    }
}

// =============================================================================
// ToastState - FSM for toast lifecycle
// =============================================================================

/// Toast state machine events
pub mod toast_events {
    /// `show()` passed its cancelable event
    pub const SHOW: u32 = 30001;
    /// `hide()` passed its cancelable event
    pub const HIDE: u32 = 30002;
    /// The running enter/leave transition finished
    pub const TRANSITION_COMPLETE: u32 = 30003;
    /// `dispose()` was called
    pub const DISPOSE: u32 = 30004;
}

/// State machine for toast lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ToastState {
    /// Not visible
    #[default]
    Hidden,
    /// Enter transition is running
    Showing,
    /// Fully visible, autohide timer may be pending
    Shown,
    /// Leave transition is running
    Hiding,
    /// Released; the instance must not be used again
    Disposed,
}

impl ToastState {
    /// Whether the `show` class is expected on the element
    pub fn is_visible(&self) -> bool {
        matches!(
            self,
            ToastState::Showing | ToastState::Shown | ToastState::Hiding
        )
    }

    pub fn on_event(&self, event: u32) -> Option<Self> {
        use toast_events::*;
        use ToastState::*;

        match (self, event) {
            // Disposed is terminal
            (Disposed, _) => None,
            (_, DISPOSE) => Some(Disposed),

            // show() restarts the enter phase from anywhere, interrupting a leave
            (_, SHOW) => Some(Showing),

            // hide() is gated on the `show` class, not on the state
            (_, HIDE) => Some(Hiding),

            (Showing, TRANSITION_COMPLETE) => Some(Shown),
            (Hiding, TRANSITION_COMPLETE) => Some(Hidden),

            _ => None,
        }
    }
}

// =============================================================================
// Toast
// =============================================================================

/// Transition currently running on the element
struct ActiveTransition {
    classes: Option<TransitionClasses>,
    pending: Option<PendingTransition>,
}

struct ToastInner {
    runtime: WeakRuntime,
    element: ElementId,
    config: ToastConfig,
    state: Cell<ToastState>,
    /// Bumped by show/hide/dispose; continuations from older generations are dropped
    generation: Cell<u64>,
    timeout: Cell<Option<TimerId>>,
    frame: Cell<Option<FrameId>>,
    transition: RefCell<Option<ActiveTransition>>,
}

/// Handle to the toast bound to an element (cheap to clone)
#[derive(Clone)]
pub struct Toast {
    inner: Rc<ToastInner>,
}

impl std::fmt::Debug for Toast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toast")
            .field("element", &self.inner.element)
            .field("state", &self.inner.state.get())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Toast {
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    /// Bind a toast to `element`
    ///
    /// Configuration is merged from defaults, the element's `data-*`
    /// attributes and `config`, in increasing precedence. A toast already
    /// bound to the element is disposed first.
    pub fn new(runtime: &Runtime, element: ElementId, config: Option<&ConfigMap>) -> Result<Self> {
        let attributes = get_data_attributes(&runtime.document(), element);
        let config = ToastConfig::resolve(&attributes, config)?;

        if let Some(previous) = Self::get_instance(runtime, element) {
            tracing::debug!(?element, "replacing existing toast");
            previous.release(runtime);
            previous.transition_state(toast_events::DISPOSE);
        }

        let state = if runtime.has_class(element, CLASS_NAME_SHOW) {
            ToastState::Shown
        } else {
            ToastState::Hidden
        };

        let toast = Self {
            inner: Rc::new(ToastInner {
                runtime: runtime.downgrade(),
                element,
                config,
                state: Cell::new(state),
                generation: Cell::new(0),
                timeout: Cell::new(None),
                frame: Cell::new(None),
                transition: RefCell::new(None),
            }),
        };

        toast.set_listeners(runtime)?;
        runtime.set_data(element, DATA_KEY, toast.clone());
        tracing::debug!(?element, config = ?toast.inner.config, "toast created");
        Ok(toast)
    }

    /// Bind a toast with typed options
    pub fn with_options(runtime: &Runtime, element: ElementId, options: ToastOptions) -> Result<Self> {
        Self::new(runtime, element, Some(&options.to_config_map()))
    }

    /// The toast bound to `element`, constructing one if there is none
    ///
    /// `config` only applies when a new toast is constructed.
    pub fn get_or_create(
        runtime: &Runtime,
        element: ElementId,
        config: Option<&ConfigMap>,
    ) -> Result<Self> {
        match Self::get_instance(runtime, element) {
            Some(toast) => Ok(toast),
            None => Self::new(runtime, element, config),
        }
    }

    /// The toast bound to `element`, if any
    pub fn get_instance(runtime: &Runtime, element: ElementId) -> Option<Self> {
        runtime.get_data::<Toast>(element, DATA_KEY)
    }

    pub fn element(&self) -> ElementId {
        self.inner.element
    }

    pub fn config(&self) -> &ToastConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ToastState {
        self.inner.state.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.state() == ToastState::Disposed
    }

    /// Whether both handles refer to the same toast
    pub fn ptr_eq(&self, other: &Toast) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Show the toast, running the enter transition
    pub fn show(&self) {
        let Some(runtime) = self.live_runtime("show") else {
            return;
        };
        let element = self.inner.element;

        let event = runtime.trigger(element, EVENT_SHOW, EventInit::cancelable());
        if event.is_default_prevented() {
            tracing::debug!(?element, "show prevented");
            return;
        }
        if self.is_disposed() {
            return;
        }

        self.invalidate(&runtime);
        self.transition_state(toast_events::SHOW);
        self.start_transition(&runtime, TransitionPhase::Enter);
    }

    /// Hide the toast, running the leave transition
    ///
    /// Does nothing unless the element carries the `show` class.
    pub fn hide(&self) {
        let Some(runtime) = self.live_runtime("hide") else {
            return;
        };
        let element = self.inner.element;

        if !runtime.has_class(element, CLASS_NAME_SHOW) {
            return;
        }

        let event = runtime.trigger(element, EVENT_HIDE, EventInit::cancelable());
        if event.is_default_prevented() {
            tracing::debug!(?element, "hide prevented");
            return;
        }
        if self.is_disposed() {
            return;
        }

        self.invalidate(&runtime);
        self.transition_state(toast_events::HIDE);
        self.start_transition(&runtime, TransitionPhase::Leave);
    }

    /// Release the toast and unbind it from its element
    ///
    /// Cancels pending work, removes the `show` class and the dismiss
    /// listener. Any later call on this toast is ignored.
    pub fn dispose(&self) {
        if self.is_disposed() {
            tracing::warn!(element = ?self.inner.element, "dispose called on a disposed toast");
            return;
        }

        if let Some(runtime) = self.inner.runtime.upgrade() {
            self.release(&runtime);
            runtime.remove_class(self.inner.element, CLASS_NAME_SHOW);
        }

        self.transition_state(toast_events::DISPOSE);
        tracing::debug!(element = ?self.inner.element, "toast disposed");
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn upgrade(weak: &Weak<ToastInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn live_runtime(&self, operation: &str) -> Option<Runtime> {
        if self.is_disposed() {
            tracing::warn!(element = ?self.inner.element, operation, "toast used after dispose");
            return None;
        }
        let runtime = self.inner.runtime.upgrade();
        if runtime.is_none() {
            tracing::warn!(element = ?self.inner.element, operation, "runtime dropped");
        }
        runtime
    }

    /// Whether a continuation captured at `generation` should be dropped
    fn is_stale(&self, generation: u64) -> bool {
        self.is_disposed() || self.inner.generation.get() != generation
    }

    fn transition_state(&self, event: u32) {
        let current = self.inner.state.get();
        if let Some(next) = current.on_event(event) {
            tracing::trace!(element = ?self.inner.element, from = ?current, to = ?next, "toast state");
            self.inner.state.set(next);
        }
    }

    fn set_listeners(&self, runtime: &Runtime) -> Result<()> {
        let weak = Rc::downgrade(&self.inner);
        runtime.on_delegated(
            self.inner.element,
            EVENT_CLICK_DISMISS,
            SELECTOR_DATA_DISMISS,
            move |_| {
                if let Some(toast) = Self::upgrade(&weak) {
                    toast.hide();
                }
            },
        )?;
        Ok(())
    }

    /// Unbind from the element without touching its visibility: pending work
    /// is canceled, the dismiss listener and the registry entry are removed
    fn release(&self, runtime: &Runtime) {
        let element = self.inner.element;
        self.invalidate(runtime);
        runtime.off(element, EVENT_CLICK_DISMISS);

        let bound = Self::get_instance(runtime, element).is_some_and(|toast| toast.ptr_eq(self));
        if bound {
            runtime.remove_data(element, DATA_KEY);
        }
    }

    /// Drop every pending continuation: autohide timer, class swap frame and
    /// transition completion. Transient classes of the interrupted phase are
    /// stripped.
    fn invalidate(&self, runtime: &Runtime) {
        let inner = &self.inner;
        inner.generation.set(inner.generation.get().wrapping_add(1));

        if let Some(timer) = inner.timeout.take() {
            runtime.clear_timeout(timer);
        }
        if let Some(frame) = inner.frame.take() {
            runtime.cancel_animation_frame(frame);
        }

        let active = inner.transition.borrow_mut().take();
        if let Some(active) = active {
            if let Some(pending) = active.pending {
                pending.cancel(runtime);
            }
            if let Some(classes) = active.classes {
                tracing::trace!(element = ?inner.element, phase = %classes.phase, "transition interrupted");
                for class in classes.all() {
                    runtime.remove_class(inner.element, class);
                }
            }
        }
    }

    fn start_transition(&self, runtime: &Runtime, phase: TransitionPhase) {
        let element = self.inner.element;
        let generation = self.inner.generation.get();
        let classes = self
            .inner
            .config
            .transition_name
            .as_deref()
            .map(|name| TransitionClasses::new(name, phase));

        if let Some(classes) = &classes {
            runtime.add_class(element, &classes.start);
            runtime.add_class(element, &classes.active);
        }
        if phase == TransitionPhase::Enter {
            runtime.add_class(element, CLASS_NAME_SHOW);
        }

        let duration = transition_duration(runtime, element);

        if let Some(classes) = &classes {
            let weak = Rc::downgrade(&self.inner);
            let start = classes.start.clone();
            let end = classes.end.clone();
            let frame = runtime.request_animation_frame(move || {
                let Some(toast) = Self::upgrade(&weak) else {
                    return;
                };
                if toast.is_stale(generation) {
                    return;
                }
                toast.inner.frame.set(None);
                if let Some(runtime) = toast.inner.runtime.upgrade() {
                    runtime.remove_class(element, &start);
                    runtime.add_class(element, &end);
                }
            });
            self.inner.frame.set(Some(frame));
        }

        *self.inner.transition.borrow_mut() = Some(ActiveTransition {
            classes,
            pending: None,
        });

        tracing::debug!(?element, %phase, ?duration, "toast transition");

        if duration.is_zero() {
            self.complete(runtime, phase);
            return;
        }

        let weak = Rc::downgrade(&self.inner);
        let pending = on_transition_end(runtime, element, duration, move || {
            let Some(toast) = Self::upgrade(&weak) else {
                return;
            };
            if toast.is_stale(generation) {
                return;
            }
            if let Some(runtime) = toast.inner.runtime.upgrade() {
                toast.complete(&runtime, phase);
            }
        });
        if let Some(active) = self.inner.transition.borrow_mut().as_mut() {
            active.pending = Some(pending);
        }
    }

    fn complete(&self, runtime: &Runtime, phase: TransitionPhase) {
        let element = self.inner.element;

        if let Some(frame) = self.inner.frame.take() {
            runtime.cancel_animation_frame(frame);
        }
        let active = self.inner.transition.borrow_mut().take();
        if let Some(active) = active {
            if let Some(pending) = active.pending {
                pending.cancel(runtime);
            }
            if let Some(classes) = active.classes {
                for class in classes.all() {
                    runtime.remove_class(element, class);
                }
            }
        }

        self.transition_state(toast_events::TRANSITION_COMPLETE);

        match phase {
            TransitionPhase::Enter => {
                let generation = self.inner.generation.get();
                runtime.trigger(element, EVENT_SHOWN, EventInit::notify());

                // A `shown` listener may already have hidden or disposed us
                if self.inner.config.autohide && !self.is_stale(generation) {
                    self.schedule_autohide(runtime, generation);
                }
            }
            TransitionPhase::Leave => {
                runtime.remove_class(element, CLASS_NAME_SHOW);
                runtime.trigger(element, EVENT_HIDDEN, EventInit::notify());
            }
        }
    }

    fn schedule_autohide(&self, runtime: &Runtime, generation: u64) {
        let weak = Rc::downgrade(&self.inner);
        let timer = runtime.set_timeout(self.inner.config.delay, move || {
            let Some(toast) = Self::upgrade(&weak) else {
                return;
            };
            if toast.is_stale(generation) {
                return;
            }
            toast.inner.timeout.set(None);
            tracing::trace!(element = ?toast.inner.element, "autohide");
            toast.hide();
        });
        self.inner.timeout.set(Some(timer));
    }
}
