//! Glint Animation
//!
//! CSS transition support for Glint components.
//!
//! # Features
//!
//! - **Transition Timing**: measure an element's transition from its computed
//!   `transition-duration` and `transition-delay`
//! - **Transition-End Emulation**: a timer fallback for `transitionend` events
//!   that never arrive
//! - **Phase Classes**: `<name>-enter`, `<name>-enter-active`, `<name>-enter-to`
//!   and their `leave` counterparts

pub mod phase;
pub mod transition;

pub use phase::{TransitionClasses, TransitionPhase};
pub use transition::{
    emulate_transition_end, on_transition_end, parse_time_value, transition_duration,
    trigger_transition_end, EmulatedTransitionEnd, PendingTransition, EMULATION_PADDING,
    TRANSITION_END,
};
