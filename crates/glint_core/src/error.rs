//! Error types for glint_core

use thiserror::Error;

/// Errors surfaced by the element runtime and the components built on it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlintError {
    /// A merged configuration option has the wrong runtime type
    #[error("{component}: Option \"{option}\" provided type \"{found}\" but expected type \"{expected}\".")]
    ConfigType {
        /// Upper-cased component name, e.g. `TOAST`
        component: String,
        option: String,
        found: String,
        expected: String,
    },

    /// The plugin bridge was asked for an operation that does not exist
    #[error("No method named \"{name}\"")]
    UnknownMethod { name: String },

    /// Selector or stylesheet text could not be parsed
    #[error("Invalid CSS \"{input}\": {reason}")]
    Css { input: String, reason: String },
}

/// Result type for glint operations
pub type Result<T> = std::result::Result<T, GlintError>;
