//! Headless element tree
//!
//! The document owns every element in an arena keyed by [`ElementId`].
//! Ids are generational, so an id held after its element was removed never
//! resolves to a newer element that reused the slot.
//!
//! Elements carry exactly what components need to drive visual state:
//!
//! - a tag name and ordered attributes (`data-*`, `id`, ...)
//! - a class list (marker classes such as `show` or `fade-enter-active`)
//! - inline style declarations
//! - parent/child links for bubbling and delegation
//!
//! Computed style combines inline style with the document stylesheet, see
//! [`crate::style`].

use indexmap::IndexMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::error::Result;
use crate::selector::Selector;
use crate::style::Stylesheet;

new_key_type! {
    /// Handle to an element in a [`Document`]
    pub struct ElementId;
}

/// A single element
#[derive(Clone, Debug)]
pub struct Element {
    tag: String,
    attributes: IndexMap<String, String>,
    classes: SmallVec<[String; 4]>,
    style: IndexMap<String, String>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: IndexMap::new(),
            classes: SmallVec::new(),
            style: IndexMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Get an attribute value. The `class` attribute is exposed through
    /// [`Element::classes`] instead.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attributes in the order they were first set
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Space separated class list, in insertion order
    pub fn class_name(&self) -> String {
        self.classes.join(" ")
    }

    pub fn inline_style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

/// Arena of elements plus the stylesheet used for computed style
#[derive(Default)]
pub struct Document {
    elements: SlotMap<ElementId, Element>,
    stylesheet: Stylesheet,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.elements.insert(Element::new(tag))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append `child` to `parent`, detaching it from any previous parent
    ///
    /// Returns false (and changes nothing) if either id is stale or the move
    /// would make an element its own ancestor.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> bool {
        if !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if self.ancestors(parent).any(|ancestor| ancestor == child) {
            tracing::warn!(?parent, ?child, "append_child would create a cycle");
            return false;
        }

        self.detach(child);
        if let Some(element) = self.elements.get_mut(child) {
            element.parent = Some(parent);
        }
        if let Some(element) = self.elements.get_mut(parent) {
            element.children.push(child);
        }
        true
    }

    fn detach(&mut self, child: ElementId) {
        let old_parent = self.elements.get_mut(child).and_then(|e| e.parent.take());
        if let Some(parent) = old_parent.and_then(|p| self.elements.get_mut(p)) {
            parent.children.retain(|c| *c != child);
        }
    }

    /// Remove an element and its whole subtree
    ///
    /// Returns every removed id so owners of per-element state (listeners,
    /// data) can release it.
    pub fn remove(&mut self, id: ElementId) -> Vec<ElementId> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.detach(id);

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(element) = self.elements.remove(current) {
                stack.extend(element.children);
                removed.push(current);
            }
        }
        removed
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(id).and_then(Element::parent)
    }

    /// Iterate from `id` up to the root, starting with `id` itself
    pub fn ancestors(&self, id: ElementId) -> Ancestors<'_> {
        Ancestors {
            document: self,
            next: self.contains(id).then_some(id),
        }
    }

    /// Find the nearest element, starting at `from` and walking up to and
    /// including `root`, that matches `selector`
    ///
    /// Returns `None` if `from` is not `root` or one of its descendants.
    pub fn closest_within(
        &self,
        from: ElementId,
        selector: &Selector,
        root: ElementId,
    ) -> Option<ElementId> {
        let mut found = None;
        for id in self.ancestors(from) {
            if found.is_none() && self.elements.get(id).is_some_and(|e| selector.matches(e)) {
                found = Some(id);
            }
            if id == root {
                return found;
            }
        }
        None
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// Set an attribute; `class` replaces the class list
    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) -> bool {
        let Some(element) = self.elements.get_mut(id) else {
            return false;
        };
        if name == "class" {
            element.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            element.attributes.insert(name.to_string(), value.to_string());
        }
        true
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.elements.get(id).and_then(|e| e.attribute(name))
    }

    pub fn remove_attribute(&mut self, id: ElementId, name: &str) -> bool {
        self.elements
            .get_mut(id)
            .is_some_and(|e| e.attributes.shift_remove(name).is_some())
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// Add a class; returns true if it was not already present
    pub fn add_class(&mut self, id: ElementId, class: &str) -> bool {
        let Some(element) = self.elements.get_mut(id) else {
            return false;
        };
        if element.has_class(class) {
            return false;
        }
        tracing::trace!(?id, class, "add class");
        element.classes.push(class.to_string());
        true
    }

    /// Remove a class; returns true if it was present
    pub fn remove_class(&mut self, id: ElementId, class: &str) -> bool {
        let Some(element) = self.elements.get_mut(id) else {
            return false;
        };
        let before = element.classes.len();
        element.classes.retain(|c| c != class);
        let removed = element.classes.len() != before;
        if removed {
            tracing::trace!(?id, class, "remove class");
        }
        removed
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.elements.get(id).is_some_and(|e| e.has_class(class))
    }

    pub fn class_name(&self, id: ElementId) -> String {
        self.elements
            .get(id)
            .map(Element::class_name)
            .unwrap_or_default()
    }

    // ========================================================================
    // Style
    // ========================================================================

    pub fn set_style(&mut self, id: ElementId, property: &str, value: &str) -> bool {
        let Some(element) = self.elements.get_mut(id) else {
            return false;
        };
        element.style.insert(property.to_string(), value.to_string());
        true
    }

    pub fn remove_style(&mut self, id: ElementId, property: &str) -> bool {
        self.elements
            .get_mut(id)
            .is_some_and(|e| e.style.shift_remove(property).is_some())
    }

    /// Parse CSS and append its rules to the document stylesheet
    ///
    /// Returns the number of rules added.
    pub fn add_stylesheet(&mut self, css: &str) -> Result<usize> {
        let sheet = Stylesheet::parse(css)?;
        let count = sheet.len();
        self.stylesheet.extend(sheet);
        Ok(count)
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// Resolve a property: inline style first, then the stylesheet
    pub fn computed_style(&self, id: ElementId, property: &str) -> Option<&str> {
        let element = self.elements.get(id)?;
        element
            .inline_style(property)
            .or_else(|| self.stylesheet.resolve(element, property))
    }
}

/// Iterator over an element and its ancestors
pub struct Ancestors<'a> {
    document: &'a Document,
    next: Option<ElementId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.document.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_and_ancestors() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        let toast = doc.create_element("div");
        let button = doc.create_element("button");

        assert!(doc.append_child(root, toast));
        assert!(doc.append_child(toast, button));

        let path: Vec<_> = doc.ancestors(button).collect();
        assert_eq!(path, vec![button, toast, root]);

        // Cycles are rejected
        assert!(!doc.append_child(button, root));
        assert_eq!(doc.parent(root), None);
    }

    #[test]
    fn test_reparent() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("div");
        let child = doc.create_element("span");

        doc.append_child(a, child);
        doc.append_child(b, child);

        assert!(doc.element(a).unwrap().children().is_empty());
        assert_eq!(doc.element(b).unwrap().children(), &[child]);
        assert_eq!(doc.parent(child), Some(b));
    }

    #[test]
    fn test_remove_subtree() {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        let toast = doc.create_element("div");
        let button = doc.create_element("button");
        doc.append_child(root, toast);
        doc.append_child(toast, button);

        let removed = doc.remove(toast);
        assert_eq!(removed.len(), 2);
        assert!(doc.contains(root));
        assert!(!doc.contains(toast));
        assert!(!doc.contains(button));
        assert!(doc.element(root).unwrap().children().is_empty());

        // Stale ids stay stale even after the slot is reused
        let fresh = doc.create_element("div");
        assert_ne!(fresh, toast);
        assert!(!doc.has_class(toast, "anything"));
    }

    #[test]
    fn test_classes() {
        let mut doc = Document::new();
        let el = doc.create_element("div");

        assert!(doc.add_class(el, "toast"));
        assert!(doc.add_class(el, "show"));
        assert!(!doc.add_class(el, "show"));
        assert_eq!(doc.class_name(el), "toast show");

        assert!(doc.remove_class(el, "toast"));
        assert!(!doc.remove_class(el, "toast"));
        assert_eq!(doc.class_name(el), "show");

        doc.set_attribute(el, "class", "a  b c");
        assert_eq!(doc.class_name(el), "a b c");
        assert_eq!(doc.attribute(el, "class"), None);
    }

    #[test]
    fn test_attributes_keep_order() {
        let mut doc = Document::new();
        let el = doc.create_element("DIV");
        doc.set_attribute(el, "data-delay", "100");
        doc.set_attribute(el, "data-autohide", "false");
        doc.set_attribute(el, "data-delay", "200");

        let element = doc.element(el).unwrap();
        assert_eq!(element.tag(), "div");
        let attrs: Vec<_> = element.attributes().collect();
        assert_eq!(attrs, vec![("data-delay", "200"), ("data-autohide", "false")]);

        assert!(doc.remove_attribute(el, "data-delay"));
        assert_eq!(doc.attribute(el, "data-delay"), None);
    }

    #[test]
    fn test_closest_within() {
        let mut doc = Document::new();
        let toast = doc.create_element("div");
        let button = doc.create_element("button");
        let icon = doc.create_element("span");
        doc.append_child(toast, button);
        doc.append_child(button, icon);
        doc.set_attribute(button, "data-dismiss", "toast");

        let selector = Selector::parse(r#"[data-dismiss="toast"]"#).unwrap();
        assert_eq!(doc.closest_within(icon, &selector, toast), Some(button));
        assert_eq!(doc.closest_within(toast, &selector, toast), None);

        // Matches above the root are not considered
        let outer = doc.create_element("div");
        doc.append_child(outer, toast);
        doc.set_attribute(outer, "data-dismiss", "toast");
        assert_eq!(doc.closest_within(toast, &selector, toast), None);
    }

    #[test]
    fn test_computed_style_prefers_inline() {
        let mut doc = Document::new();
        let el = doc.create_element("div");
        doc.add_class(el, "fade-enter-active");
        doc.add_stylesheet(".fade-enter-active { transition-duration: 150ms; }")
            .unwrap();

        assert_eq!(doc.computed_style(el, "transition-duration"), Some("150ms"));

        doc.set_style(el, "transition-duration", "0s");
        assert_eq!(doc.computed_style(el, "transition-duration"), Some("0s"));

        doc.remove_style(el, "transition-duration");
        doc.remove_class(el, "fade-enter-active");
        assert_eq!(doc.computed_style(el, "transition-duration"), None);
    }
}
