//! Per-element data storage
//!
//! Components keep their instance associated with the element it is bound
//! to, so a later lookup by element returns the same instance. Entries are
//! keyed by `(ElementId, key)`; a key such as `gl.toast` holds at most one
//! value per element.
//!
//! The association is weak in both directions: the store never owns the
//! element (it only holds a generational id, which cannot alias a newer
//! element), and entries are dropped explicitly on dispose or when the
//! element is removed from the document.
//!
//! # Example
//!
//! ```ignore
//! use glint_core::data::DataStore;
//!
//! let mut store = DataStore::new();
//! store.set(element, "gl.toast", toast.clone());
//!
//! let same: Option<Toast> = store.get(element, "gl.toast");
//! store.remove(element, "gl.toast");
//! ```

use std::any::Any;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::document::ElementId;

/// Type-erased values keyed by element and string key
#[derive(Default)]
pub struct DataStore {
    entries: FxHashMap<ElementId, FxHashMap<String, Rc<dyn Any>>>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value under the same key
    pub fn set<T: 'static>(&mut self, element: ElementId, key: &str, value: T) {
        self.entries
            .entry(element)
            .or_default()
            .insert(key.to_string(), Rc::new(value));
    }

    /// Get a clone of the value if it exists and has type `T`
    pub fn get<T: Clone + 'static>(&self, element: ElementId, key: &str) -> Option<T> {
        self.entries
            .get(&element)?
            .get(key)?
            .downcast_ref::<T>()
            .cloned()
    }

    pub fn contains(&self, element: ElementId, key: &str) -> bool {
        self.entries
            .get(&element)
            .is_some_and(|values| values.contains_key(key))
    }

    /// Remove a single entry; returns true if it existed
    pub fn remove(&mut self, element: ElementId, key: &str) -> bool {
        let Some(values) = self.entries.get_mut(&element) else {
            return false;
        };
        let removed = values.remove(key).is_some();
        if values.is_empty() {
            self.entries.remove(&element);
        }
        removed
    }

    /// Drop every entry for `element`
    pub fn remove_element(&mut self, element: ElementId) -> usize {
        self.entries.remove(&element).map_or(0, |values| values.len())
    }

    /// Keys stored for `element`
    pub fn keys(&self, element: ElementId) -> Vec<String> {
        self.entries
            .get(&element)
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of entries across all elements
    pub fn len(&self) -> usize {
        self.entries.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[derive(Clone, Debug, PartialEq)]
    struct Instance {
        name: String,
    }

    #[test]
    fn test_set_get_remove() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let mut store = DataStore::new();

        assert_eq!(store.get::<Instance>(el, "gl.toast"), None);

        store.set(el, "gl.toast", Instance { name: "a".into() });
        assert!(store.contains(el, "gl.toast"));
        assert_eq!(
            store.get::<Instance>(el, "gl.toast"),
            Some(Instance { name: "a".into() })
        );

        // At most one value per key
        store.set(el, "gl.toast", Instance { name: "b".into() });
        assert_eq!(store.len(), 1);
        assert_eq!(store.get::<Instance>(el, "gl.toast").unwrap().name, "b");

        assert!(store.remove(el, "gl.toast"));
        assert!(!store.remove(el, "gl.toast"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_wrong_type_is_none() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        let mut store = DataStore::new();

        store.set(el, "count", 3u32);
        assert_eq!(store.get::<String>(el, "count"), None);
        assert_eq!(store.get::<u32>(el, "count"), Some(3));
    }

    #[test]
    fn test_remove_element() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let mut store = DataStore::new();

        store.set(a, "one", 1u8);
        store.set(a, "two", 2u8);
        store.set(b, "one", 1u8);

        let mut keys = store.keys(a);
        keys.sort();
        assert_eq!(keys, vec!["one".to_string(), "two".to_string()]);

        assert_eq!(store.remove_element(a), 2);
        assert_eq!(store.len(), 1);
        assert!(store.contains(b, "one"));
    }
}
