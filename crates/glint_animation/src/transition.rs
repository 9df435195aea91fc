//! CSS transition timing
//!
//! Components measure how long an element's transition will take from its
//! computed `transition-duration` and `transition-delay`, then wait for the
//! element's `transitionend` event. Because that event never fires when no
//! transition actually runs (display changes, missing stylesheet, ...), a
//! timer emulates it shortly after the measured duration.
//!
//! ```text
//! measure duration ──► 0 ──► complete synchronously
//!        │
//!        └─ > 0 ──► wait for `transitionend` on the element
//!                   └─ emulated after duration + 5ms if it never arrives
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use glint_core::{ElementId, EventInit, ListenerId, Runtime, TimerId};

/// Native transition-end event name
pub const TRANSITION_END: &str = "transitionend";

/// Extra time granted to a real `transitionend` before it is emulated
pub const EMULATION_PADDING: Duration = Duration::from_millis(5);

/// Parse a single CSS time value into milliseconds
///
/// Accepts `150ms`, `0.15s`, and plain numbers (milliseconds).
pub fn parse_time_value(input: &str) -> Option<f64> {
    let input = input.trim();

    // Try milliseconds
    if let Some(ms_str) = input.strip_suffix("ms") {
        return ms_str.trim().parse::<f64>().ok();
    }

    // Try seconds
    if let Some(s_str) = input.strip_suffix('s') {
        return s_str.trim().parse::<f64>().ok().map(|s| s * 1000.0);
    }

    // Try plain number (assume milliseconds)
    input.parse::<f64>().ok()
}

/// First entry of a comma separated time list, in milliseconds
fn first_time_value(list: &str) -> f64 {
    list.split(',')
        .next()
        .and_then(parse_time_value)
        .filter(|ms| ms.is_finite())
        .unwrap_or(0.0)
}

/// Measure the transition duration of `element` from its computed style
///
/// Sums the first `transition-duration` and `transition-delay` entries.
/// Returns zero when neither is set, both are zero, or they cancel out.
pub fn transition_duration(runtime: &Runtime, element: ElementId) -> Duration {
    let (duration, delay) = {
        let document = runtime.document();
        (
            document
                .computed_style(element, "transition-duration")
                .map_or(0.0, first_time_value),
            document
                .computed_style(element, "transition-delay")
                .map_or(0.0, first_time_value),
        )
    };

    let total_ms = duration + delay;
    if total_ms <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_micros((total_ms * 1000.0).round() as u64)
}

/// Dispatch a `transitionend` event on `element`
pub fn trigger_transition_end(runtime: &Runtime, element: ElementId) {
    runtime.trigger(element, TRANSITION_END, EventInit::notify());
}

/// Register a listener that runs once for a `transitionend` whose target is
/// `element` itself; bubbled events from descendants are ignored
fn once_from_target<F>(runtime: &Runtime, element: ElementId, callback: F) -> ListenerId
where
    F: FnOnce(&Runtime) + 'static,
{
    let callback = RefCell::new(Some(callback));
    let own_id: Rc<Cell<Option<ListenerId>>> = Rc::default();
    let slot = Rc::clone(&own_id);
    let weak = runtime.downgrade();

    let id = runtime.on(element, TRANSITION_END, move |event| {
        if event.target() != element {
            return;
        }
        let Some(runtime) = weak.upgrade() else {
            return;
        };
        if let Some(id) = slot.get() {
            runtime.remove_listener(id);
        }
        let callback = callback.borrow_mut().take();
        if let Some(callback) = callback {
            callback(&runtime);
        }
    });
    own_id.set(Some(id));
    id
}

/// Timer fallback for a `transitionend` that may never arrive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmulatedTransitionEnd {
    listener: ListenerId,
    timer: TimerId,
}

impl EmulatedTransitionEnd {
    /// Stop watching; the event will not be emulated
    pub fn cancel(&self, runtime: &Runtime) {
        runtime.remove_listener(self.listener);
        runtime.clear_timeout(self.timer);
    }
}

/// Fire `transitionend` on `element` after `duration` plus padding unless a
/// real one arrives first
pub fn emulate_transition_end(
    runtime: &Runtime,
    element: ElementId,
    duration: Duration,
) -> EmulatedTransitionEnd {
    let called = Rc::new(Cell::new(false));
    let flag = Rc::clone(&called);
    let listener = once_from_target(runtime, element, move |_| flag.set(true));

    let weak = runtime.downgrade();
    let timer = runtime.set_timeout(duration + EMULATION_PADDING, move || {
        if called.get() {
            return;
        }
        if let Some(runtime) = weak.upgrade() {
            tracing::trace!(?element, "emulating transitionend");
            trigger_transition_end(&runtime, element);
        }
    });

    EmulatedTransitionEnd { listener, timer }
}

/// A transition whose completion is still outstanding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTransition {
    completion: ListenerId,
    emulation: EmulatedTransitionEnd,
}

impl PendingTransition {
    /// Drop the completion without running it
    pub fn cancel(&self, runtime: &Runtime) {
        runtime.remove_listener(self.completion);
        self.emulation.cancel(runtime);
    }
}

/// Run `complete` once `element` finishes a transition of `duration`
///
/// Completion is triggered by the element's own `transitionend` or by its
/// emulation, whichever comes first, and runs at most once.
pub fn on_transition_end<F>(
    runtime: &Runtime,
    element: ElementId,
    duration: Duration,
    complete: F,
) -> PendingTransition
where
    F: FnOnce() + 'static,
{
    let completion = once_from_target(runtime, element, move |_| complete());
    let emulation = emulate_transition_end(runtime, element, duration);
    PendingTransition {
        completion,
        emulation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_parse_time_value() {
        assert_eq!(parse_time_value("150ms"), Some(150.0));
        assert_eq!(parse_time_value(" 0.15s "), Some(150.0));
        assert_eq!(parse_time_value("1s"), Some(1000.0));
        assert_eq!(parse_time_value("20"), Some(20.0));
        assert_eq!(parse_time_value("fast"), None);
    }

    #[test]
    fn test_transition_duration_from_style() {
        let runtime = Runtime::new();
        let el = runtime.create_element("div");
        assert_eq!(transition_duration(&runtime, el), Duration::ZERO);

        runtime.set_style(el, "transition-duration", "0.15s, 1s");
        assert_eq!(transition_duration(&runtime, el), ms(150));

        runtime.set_style(el, "transition-delay", "50ms");
        assert_eq!(transition_duration(&runtime, el), ms(200));

        runtime.set_style(el, "transition-duration", "0s");
        runtime.set_style(el, "transition-delay", "0s");
        assert_eq!(transition_duration(&runtime, el), Duration::ZERO);

        runtime.set_style(el, "transition-duration", "bogus");
        assert_eq!(transition_duration(&runtime, el), Duration::ZERO);
    }

    #[test]
    fn test_transition_duration_follows_classes() {
        let runtime = Runtime::new();
        let el = runtime.create_element("div");
        runtime
            .add_stylesheet(".fade-enter-active { transition-duration: 300ms; }")
            .unwrap();

        assert_eq!(transition_duration(&runtime, el), Duration::ZERO);
        runtime.add_class(el, "fade-enter-active");
        assert_eq!(transition_duration(&runtime, el), ms(300));
    }

    #[test]
    fn test_emulated_completion() {
        let runtime = Runtime::new();
        let el = runtime.create_element("div");
        let done = Rc::new(Cell::new(0));
        let d = Rc::clone(&done);

        on_transition_end(&runtime, el, ms(150), move || d.set(d.get() + 1));
        assert_eq!(runtime.events().listener_count(el), 2);

        runtime.advance(ms(154));
        assert_eq!(done.get(), 0);
        runtime.advance(ms(1));
        assert_eq!(done.get(), 1);
        assert_eq!(runtime.events().listener_count(el), 0);

        runtime.advance(ms(1000));
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn test_real_transition_end_wins() {
        let runtime = Runtime::new();
        let el = runtime.create_element("div");
        let child = runtime.create_element("span");
        runtime.append_child(el, child);

        let done = Rc::new(Cell::new(0));
        let d = Rc::clone(&done);
        on_transition_end(&runtime, el, ms(150), move || d.set(d.get() + 1));

        // Bubbled from a descendant: ignored
        trigger_transition_end(&runtime, child);
        assert_eq!(done.get(), 0);

        runtime.advance(ms(100));
        trigger_transition_end(&runtime, el);
        assert_eq!(done.get(), 1);

        // The emulation timer no longer re-fires the event
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        runtime.on(el, TRANSITION_END, move |_| s.set(s.get() + 1));
        runtime.advance(ms(100));
        assert_eq!(seen.get(), 0);
        assert_eq!(done.get(), 1);
    }

    #[test]
    fn test_cancel() {
        let runtime = Runtime::new();
        let el = runtime.create_element("div");
        let done = Rc::new(Cell::new(false));
        let d = Rc::clone(&done);

        let pending = on_transition_end(&runtime, el, ms(150), move || d.set(true));
        pending.cancel(&runtime);

        runtime.advance(ms(500));
        trigger_transition_end(&runtime, el);
        assert!(!done.get());
        assert_eq!(runtime.scheduler().pending_timers(), 0);
    }
}
