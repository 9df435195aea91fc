//! Glint Core Runtime
//!
//! Headless building blocks for Glint components:
//!
//! - **Document**: arena of elements with attributes, class lists and inline style
//! - **Selectors & Stylesheets**: compound selectors, computed style lookup
//! - **Event Dispatch**: named, namespaced events with bubbling, cancelation
//!   and delegation
//! - **Data Store**: per-element instance registry
//! - **Config**: three-tier config merging with type-schema validation
//! - **Scheduler**: cooperative timers and animation frames on a virtual clock
//!
//! # Example
//!
//! ```rust
//! use glint_core::{EventInit, Runtime};
//!
//! let runtime = Runtime::new();
//! let toast = runtime.create_element("div");
//!
//! runtime.on(toast, "show.gl.toast", |event| event.prevent_default());
//!
//! let event = runtime.trigger(toast, "show.gl.toast", EventInit::cancelable());
//! assert!(event.is_default_prevented());
//! ```

pub mod config;
pub mod data;
pub mod document;
pub mod error;
pub mod events;
pub mod manipulator;
pub mod runtime;
pub mod scheduler;
pub mod selector;
pub mod style;

pub use config::{merge_config, type_check_config, value_type, ComponentConfig, ConfigMap, TypeSchema};
pub use data::DataStore;
pub use document::{Document, Element, ElementId};
pub use error::{GlintError, Result};
pub use events::{DomEvent, EventCallback, EventDispatcher, EventInit, EventName, ListenerId};
pub use manipulator::{get_data_attributes, normalize_data};
pub use runtime::{Runtime, RuntimeStats, WeakRuntime};
pub use scheduler::{FrameId, Scheduler, TimerId};
pub use selector::Selector;
pub use style::{StyleRule, Stylesheet};
