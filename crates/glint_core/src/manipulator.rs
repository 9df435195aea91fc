//! `data-*` attribute extraction
//!
//! Attributes are exposed under camelCased keys with the `data-` prefix
//! stripped (`data-transition-name` becomes `transitionName`) and their text
//! normalized into typed values:
//!
//! | attribute text            | value            |
//! |---------------------------|------------------|
//! | `true` / `false`          | boolean          |
//! | numeric text (`500`, `1.5`) | number         |
//! | empty or `null`           | null             |
//! | anything else             | string           |

use serde_json::{Number, Value};

use crate::config::ConfigMap;
use crate::document::{Document, ElementId};

const DATA_PREFIX: &str = "data-";

/// Convert attribute text into a typed value
///
/// `NaN` and `Infinity` have no JSON number form and stay strings, so a
/// numeric option set to either fails the config type check.
pub fn normalize_data(value: &str) -> Value {
    match value {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "" | "null" => return Value::Null,
        _ => {}
    }

    // Only text that round-trips is numeric, so "007" or "1e3" stay strings
    if let Ok(int) = value.parse::<i64>() {
        if int.to_string() == value {
            return Value::Number(int.into());
        }
    }
    if let Ok(float) = value.parse::<f64>() {
        if float.to_string() == value {
            if let Some(number) = Number::from_f64(float) {
                return Value::Number(number);
            }
        }
    }

    Value::String(value.to_string())
}

/// `data-transition-name` -> `transitionName`; `None` for non-data attributes
pub fn data_key(attribute: &str) -> Option<String> {
    let rest = attribute.strip_prefix(DATA_PREFIX)?;
    if rest.is_empty() {
        return None;
    }

    let mut key = String::with_capacity(rest.len());
    let mut upper_next = false;
    for c in rest.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            key.extend(c.to_uppercase());
            upper_next = false;
        } else {
            key.push(c);
        }
    }
    Some(key)
}

/// Every `data-*` attribute of `element`, normalized
pub fn get_data_attributes(document: &Document, element: ElementId) -> ConfigMap {
    let Some(element) = document.element(element) else {
        return ConfigMap::new();
    };
    element
        .attributes()
        .filter_map(|(name, value)| data_key(name).map(|key| (key, normalize_data(value))))
        .collect()
}
