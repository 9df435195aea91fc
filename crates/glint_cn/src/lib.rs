//! # Glint Component Library (glint_cn)
//!
//! Behavioral components bound to elements of a [`glint_core::Runtime`].
//!
//! Components own no markup of their own. They attach to an element, read
//! their configuration from `data-*` attributes, react to events, and drive
//! CSS transition classes; the stylesheet decides what things look like.
//!
//! ## Example
//!
//! ```rust
//! use glint_cn::prelude::*;
//! use glint_core::Runtime;
//!
//! let runtime = Runtime::new();
//! let element = runtime.create_element("div");
//!
//! let toast = cn::toast(&runtime, element, ToastOptions::new().autohide(false)).unwrap();
//! toast.show();
//! assert_eq!(toast.state(), ToastState::Shown);
//! ```
//!
//! ## Components
//!
//! - **Toast** - dismissible notification that hides itself after a delay
//!
//! The [`plugin`] module exposes the string-command bridge for plugin-style
//! callers.

pub mod components;
pub mod plugin;

pub use components::*;

/// Convenience module for accessing components with `cn::` prefix
pub mod cn {
    use glint_core::{ElementId, Result, Runtime};

    use crate::components::toast::{Toast, ToastOptions};

    /// Bind a toast to `element` with typed options
    pub fn toast(runtime: &Runtime, element: ElementId, options: ToastOptions) -> Result<Toast> {
        Toast::with_options(runtime, element, options)
    }
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cn;
    pub use crate::components::toast::{Toast, ToastConfig, ToastOptions, ToastState};
    pub use crate::plugin::{toast_interface, PluginArg, ToastCommand};
    pub use glint_core::ComponentConfig;
}
