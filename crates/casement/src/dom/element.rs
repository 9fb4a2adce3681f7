//! Element records stored in the document arena.

use std::collections::BTreeMap;

use slotmap::new_key_type;

new_key_type! {
    /// A stable handle to an element in the document arena.
    ///
    /// Handles stay valid as the tree changes shape and become invalid only
    /// when the element is removed from the document. Every item, view and
    /// widget in the toolkit is addressed through an `ElementId`; rendered
    /// output is a projection of the arena, never the source of truth.
    pub struct ElementId;
}

/// A single element: tag, classes, attributes, text and tree links.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    text: Option<String>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
}

impl Element {
    pub(crate) fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            text: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// The element's tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The element's parent, if attached.
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    /// The element's children, in document order.
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    /// The element's own text content.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub(crate) fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    /// Get an attribute value.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether the attribute is present (possibly with an empty value).
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub(crate) fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub(crate) fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// Whether the class is present.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub(crate) fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_string());
        }
    }

    pub(crate) fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// The class list, in insertion order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
