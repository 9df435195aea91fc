//! Transition phases and their marker classes
//!
//! A named transition (`fade`, `slide`, ...) is driven purely through class
//! names so stylesheets can key animations off them:
//!
//! | phase | start          | active                | end               |
//! |-------|----------------|-----------------------|-------------------|
//! | enter | `fade-enter`   | `fade-enter-active`   | `fade-enter-to`   |
//! | leave | `fade-leave`   | `fade-leave-active`   | `fade-leave-to`   |
//!
//! `start` and `active` are added together, `start` is swapped for `end` on
//! the next animation frame, and `active`/`end` are removed when the
//! transition completes.

use std::fmt;

/// Direction of a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionPhase {
    /// Element is becoming visible
    Enter,
    /// Element is going away
    Leave,
}

impl TransitionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            TransitionPhase::Enter => "enter",
            TransitionPhase::Leave => "leave",
        }
    }
}

impl fmt::Display for TransitionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker class names for one phase of a named transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionClasses {
    pub phase: TransitionPhase,
    /// `<name>-<phase>`, present for the first frame only
    pub start: String,
    /// `<name>-<phase>-active`, present for the whole transition
    pub active: String,
    /// `<name>-<phase>-to`, replaces `start` from the second frame on
    pub end: String,
}

impl TransitionClasses {
    pub fn new(name: &str, phase: TransitionPhase) -> Self {
        Self {
            phase,
            start: format!("{name}-{phase}"),
            active: format!("{name}-{phase}-active"),
            end: format!("{name}-{phase}-to"),
        }
    }

    /// All three class names
    pub fn all(&self) -> [&str; 3] {
        [&self.start, &self.active, &self.end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names() {
        let enter = TransitionClasses::new("fade", TransitionPhase::Enter);
        assert_eq!(enter.start, "fade-enter");
        assert_eq!(enter.active, "fade-enter-active");
        assert_eq!(enter.end, "fade-enter-to");

        let leave = TransitionClasses::new("slide", TransitionPhase::Leave);
        assert_eq!(
            leave.all(),
            ["slide-leave", "slide-leave-active", "slide-leave-to"]
        );
        assert_eq!(leave.phase.to_string(), "leave");
    }
}
