//! Legacy plugin bridge
//!
//! Drives toasts over a set of elements with a single loosely typed argument,
//! the way plugin-style callers do:
//!
//! ```rust
//! use glint_cn::plugin::{toast_interface, PluginArg};
//! use glint_core::Runtime;
//!
//! let runtime = Runtime::new();
//! let a = runtime.create_element("div");
//! let b = runtime.create_element("div");
//!
//! toast_interface(&runtime, &[a, b], PluginArg::Command("show")).unwrap();
//! assert!(runtime.has_class(a, "show") && runtime.has_class(b, "show"));
//!
//! assert!(toast_interface(&runtime, &[a], PluginArg::Command("frobnicate")).is_err());
//! ```

use std::str::FromStr;

use glint_core::{ConfigMap, ElementId, GlintError, Result, Runtime};

use crate::components::toast::Toast;

/// Argument accepted by [`toast_interface`]
#[derive(Clone, Debug, PartialEq)]
pub enum PluginArg<'a> {
    /// Invoke a named operation
    Command(&'a str),
    /// Construct with an explicit config
    Config(ConfigMap),
    /// Construct with defaults and `data-*` attributes only
    None,
}

/// Operations reachable through the bridge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToastCommand {
    Show,
    Hide,
    Dispose,
}

impl ToastCommand {
    const TABLE: &'static [(&'static str, ToastCommand)] = &[
        ("show", ToastCommand::Show),
        ("hide", ToastCommand::Hide),
        ("dispose", ToastCommand::Dispose),
    ];

    pub fn name(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(_, command)| *command == self)
            .map_or("", |(name, _)| name)
    }

    pub fn invoke(self, toast: &Toast) {
        match self {
            ToastCommand::Show => toast.show(),
            ToastCommand::Hide => toast.hide(),
            ToastCommand::Dispose => toast.dispose(),
        }
    }
}

impl FromStr for ToastCommand {
    type Err = GlintError;

    fn from_str(name: &str) -> Result<Self> {
        Self::TABLE
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, command)| *command)
            .ok_or_else(|| GlintError::UnknownMethod {
                name: name.to_string(),
            })
    }
}

/// Apply `arg` to the toast of every element, constructing missing ones
///
/// A command name is resolved before anything is touched, so an unknown name
/// fails without constructing or mutating anything.
pub fn toast_interface(runtime: &Runtime, elements: &[ElementId], arg: PluginArg<'_>) -> Result<()> {
    let (command, config) = match &arg {
        PluginArg::Command(name) => (Some(name.parse::<ToastCommand>()?), None),
        PluginArg::Config(config) => (None, Some(config)),
        PluginArg::None => (None, None),
    };

    for &element in elements {
        let toast = Toast::get_or_create(runtime, element, config)?;
        if let Some(command) = command {
            tracing::trace!(?element, command = command.name(), "plugin command");
            command.invoke(&toast);
        }
    }
    Ok(())
}
