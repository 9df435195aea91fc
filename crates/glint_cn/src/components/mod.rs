//! Components built on glint_core elements
//!
//! Each component follows a consistent pattern:
//! - Bound to an existing element with `new(runtime, element, config)`
//! - Configured from defaults, `data-*` attributes and an explicit map
//! - Registered per element, retrieved with `get_instance`

pub mod toast;

pub use toast::{Toast, ToastConfig, ToastOptions, ToastState};
