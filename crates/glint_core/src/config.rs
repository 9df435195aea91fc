//! Component configuration: merging and type checking
//!
//! A component's configuration is resolved from three tiers, lowest
//! precedence first:
//!
//! 1. the component's built-in defaults
//! 2. `data-*` attributes read off the element (see [`crate::manipulator`])
//! 3. an explicit config map supplied by the caller
//!
//! The merged map is checked against the component's type schema before any
//! typed value is extracted, so a wrong type is reported with the component
//! and option name instead of surfacing later as odd behavior.

use serde_json::Value;

use crate::error::{GlintError, Result};

/// Untyped configuration, as read from attributes or supplied by callers
pub type ConfigMap = serde_json::Map<String, Value>;

/// Declared option types, e.g. `("delay", "number")`
///
/// Alternatives are separated by `|`: `"string|null"`.
pub type TypeSchema = &'static [(&'static str, &'static str)];

/// Runtime type name of a config value; `undefined` for a missing option
pub fn value_type(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

/// Merge tiers left to right; later tiers override earlier ones key by key
pub fn merge_config(tiers: &[&ConfigMap]) -> ConfigMap {
    let mut merged = ConfigMap::new();
    for tier in tiers {
        for (key, value) in tier.iter() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Check every option declared in `schema` against the merged config
///
/// Options not named in the schema are ignored.
pub fn type_check_config(component: &str, config: &ConfigMap, schema: TypeSchema) -> Result<()> {
    for (option, expected) in schema {
        let found = value_type(config.get(*option));
        if !expected.split('|').any(|t| t == found) {
            tracing::debug!(component, option, found, expected, "config type mismatch");
            return Err(GlintError::ConfigType {
                component: component.to_ascii_uppercase(),
                option: option.to_string(),
                found: found.to_string(),
                expected: expected.to_string(),
            });
        }
    }
    Ok(())
}

/// A component configuration resolved from defaults, attributes and an
/// explicit map
pub trait ComponentConfig: Sized {
    /// Component name used in error messages
    const NAME: &'static str;

    /// Declared types of every option
    const SCHEMA: TypeSchema;

    fn defaults() -> ConfigMap;

    /// Extract typed values from a map that already passed
    /// [`type_check_config`] against [`Self::SCHEMA`]
    fn from_validated(config: &ConfigMap) -> Self;

    /// Merge the three tiers, validate, and extract
    fn resolve(attributes: &ConfigMap, explicit: Option<&ConfigMap>) -> Result<Self> {
        let defaults = Self::defaults();
        let empty = ConfigMap::new();
        let merged = merge_config(&[&defaults, attributes, explicit.unwrap_or(&empty)]);
        type_check_config(Self::NAME, &merged, Self::SCHEMA)?;
        Ok(Self::from_validated(&merged))
    }
}
