//! Item and view helpers shared by the collection engines.
//!
//! An *item* is a direct child of a linear container bearing the `w-item`
//! attribute; a *view* is a stacked-container child bearing `w-view`. Both
//! derive their ordinal from document position (written to `w-index` by a
//! sort pass), mark selection with the `select` class and disabling with
//! the `disabled` attribute.

use casement_core::{Result, UiError};

use crate::dom::{Document, ElementId};

/// Marks a linear container entry.
pub const ITEM_ATTR: &str = "w-item";
/// Marks a stacked container entry.
pub const VIEW_ATTR: &str = "w-view";
/// Derived ordinal, maintained by sort passes.
pub const INDEX_ATTR: &str = "w-index";
/// Marks descendants whose text participates in filtration.
pub const FILTER_TEXT_ATTR: &str = "w-filter-text";

/// Selection marker class.
pub const SELECT_CLASS: &str = "select";
/// Preselection (candidate highlight) class.
pub const PRESELECT_CLASS: &str = "preselect";
/// Hidden-by-filtration class.
pub const FILTERED_CLASS: &str = "filtered";
/// Fixed (not reorderable) class.
pub const FIXED_CLASS: &str = "fixed";
/// Disabling attribute.
pub const DISABLED_ATTR: &str = "disabled";

/// How an entry error should be reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryRole {
    Item,
    View,
}

impl EntryRole {
    fn missing(self, what: impl std::fmt::Display) -> UiError {
        match self {
            Self::Item => UiError::not_exist_item(what),
            Self::View => UiError::not_exist_view(what),
        }
    }
}

/// An entry argument: an ordinal or a concrete handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemRef {
    /// Resolve by current ordinal.
    Index(usize),
    /// A concrete element, validated to belong to the container.
    Element(ElementId),
}

impl From<usize> for ItemRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<ElementId> for ItemRef {
    fn from(element: ElementId) -> Self {
        Self::Element(element)
    }
}

/// Content accepted by `add_item`-style operations.
#[derive(Clone, Debug)]
pub enum ItemContent {
    /// Plain text, wrapped into a fresh entry element.
    Text(String),
    /// A pre-built entry element (must carry the entry attribute).
    Element(ElementId),
}

impl From<&str> for ItemContent {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ItemContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for ItemContent {
    fn from(number: i64) -> Self {
        Self::Text(number.to_string())
    }
}

impl From<f64> for ItemContent {
    fn from(number: f64) -> Self {
        Self::Text(number.to_string())
    }
}

impl From<ElementId> for ItemContent {
    fn from(element: ElementId) -> Self {
        Self::Element(element)
    }
}

/// Direct children of `container` bearing `attr`, in document order.
pub fn entries(doc: &Document, container: ElementId, attr: &str) -> Result<Vec<ElementId>> {
    let mut out = Vec::new();
    for child in doc.children(container)? {
        if doc.element(child)?.has_attr(attr) {
            out.push(child);
        }
    }
    Ok(out)
}

/// Resolve an [`ItemRef`] against a container's own entries.
///
/// A handle that is stale, lacks the entry attribute, or belongs to a
/// different container fails with `ParameterMismatch` — cross-container
/// references must not silently corrupt state. An out-of-range ordinal
/// fails with the role's not-exist error.
pub fn resolve(
    doc: &Document,
    container: ElementId,
    attr: &str,
    role: EntryRole,
    entry: ItemRef,
) -> Result<ElementId> {
    match entry {
        ItemRef::Index(index) => entries(doc, container, attr)?
            .get(index)
            .copied()
            .ok_or_else(|| role.missing(index)),
        ItemRef::Element(element) => {
            if !doc.exists(element)
                || !doc.element(element)?.has_attr(attr)
                || doc.parent(element)? != Some(container)
            {
                return Err(UiError::parameter_mismatch(format!("{element:?}")));
            }
            Ok(element)
        }
    }
}

/// Reassign dense `w-index` ordinals (0..n-1) in document order.
pub fn sort(doc: &mut Document, container: ElementId, attr: &str) -> Result<()> {
    for (index, entry) in entries(doc, container, attr)?.into_iter().enumerate() {
        doc.set_attr(entry, INDEX_ATTR, &index.to_string())?;
    }
    Ok(())
}

/// The entry's recorded ordinal, if a sort pass has assigned one.
pub fn recorded_index(doc: &Document, entry: ElementId) -> Option<usize> {
    doc.attr(entry, INDEX_ATTR)
        .ok()
        .flatten()
        .and_then(|value| value.parse().ok())
}

/// Whether the entry carries the `disabled` attribute.
pub fn is_disabled(doc: &Document, entry: ElementId) -> bool {
    doc.has_attr(entry, DISABLED_ATTR).unwrap_or(false)
}

/// Remove the selection class from every entry of the container.
pub fn clear_selected(doc: &mut Document, container: ElementId, attr: &str) -> Result<()> {
    for entry in entries(doc, container, attr)? {
        doc.remove_class(entry, SELECT_CLASS)?;
    }
    Ok(())
}

/// Mark the entry selected. A disabled entry is unselectable: the class is
/// stripped instead and `false` returned.
pub fn select(doc: &mut Document, entry: ElementId) -> Result<bool> {
    if is_disabled(doc, entry) {
        doc.remove_class(entry, SELECT_CLASS)?;
        return Ok(false);
    }
    doc.add_class(entry, SELECT_CLASS)?;
    Ok(true)
}

/// Locate the container entry enclosing `target`: the nearest
/// ancestor-or-self bearing `attr` whose parent is `container`.
pub fn find_entry(
    doc: &Document,
    container: ElementId,
    attr: &str,
    target: ElementId,
) -> Option<ElementId> {
    let mut current = Some(target);
    while let Some(id) = current {
        let element = doc.element(id).ok()?;
        if element.has_attr(attr) && element.parent() == Some(container) {
            return Some(id);
        }
        current = element.parent();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;

    fn container_with_items(dom: &Dom, count: usize) -> (ElementId, Vec<ElementId>) {
        let root = dom.root();
        let container = dom.create_element("div");
        dom.append_child(root, container).unwrap();
        let mut items = Vec::new();
        for i in 0..count {
            let item = dom.create_text_element("div", format!("item {i}"));
            dom.with_mut(|doc| doc.set_attr(item, ITEM_ATTR, "")).unwrap();
            dom.append_child(container, item).unwrap();
            items.push(item);
        }
        (container, items)
    }

    #[test]
    fn resolve_by_index_and_element() {
        let dom = Dom::new();
        let (container, items) = container_with_items(&dom, 3);

        dom.with(|doc| {
            assert_eq!(
                resolve(doc, container, ITEM_ATTR, EntryRole::Item, ItemRef::Index(1)).unwrap(),
                items[1]
            );
            assert_eq!(
                resolve(
                    doc,
                    container,
                    ITEM_ATTR,
                    EntryRole::Item,
                    ItemRef::Element(items[2])
                )
                .unwrap(),
                items[2]
            );
        });
    }

    #[test]
    fn foreign_entries_are_parameter_mismatches() {
        let dom = Dom::new();
        let (container, _) = container_with_items(&dom, 1);
        let (_, other_items) = container_with_items(&dom, 1);

        dom.with(|doc| {
            let err = resolve(
                doc,
                container,
                ITEM_ATTR,
                EntryRole::Item,
                ItemRef::Element(other_items[0]),
            )
            .unwrap_err();
            assert!(matches!(err, UiError::ParameterMismatch { .. }));

            let err = resolve(doc, container, ITEM_ATTR, EntryRole::Item, ItemRef::Index(7))
                .unwrap_err();
            assert!(matches!(err, UiError::NotExistItem { .. }));
        });
    }

    #[test]
    fn sort_assigns_dense_indices() {
        let dom = Dom::new();
        let (container, items) = container_with_items(&dom, 3);

        dom.with_mut(|doc| sort(doc, container, ITEM_ATTR)).unwrap();
        dom.with(|doc| {
            for (i, &item) in items.iter().enumerate() {
                assert_eq!(recorded_index(doc, item), Some(i));
            }
        });
    }

    #[test]
    fn disabled_entries_reject_selection() {
        let dom = Dom::new();
        let (_, items) = container_with_items(&dom, 1);
        dom.with_mut(|doc| doc.set_attr(items[0], DISABLED_ATTR, "")).unwrap();

        let selected = dom.with_mut(|doc| select(doc, items[0])).unwrap();
        assert!(!selected);
        dom.with(|doc| assert!(!doc.has_class(items[0], SELECT_CLASS).unwrap()));
    }

    #[test]
    fn find_entry_walks_to_the_container_child() {
        let dom = Dom::new();
        let (container, items) = container_with_items(&dom, 2);
        let inner = dom.create_text_element("span", "nested");
        dom.append_child(items[1], inner).unwrap();

        dom.with(|doc| {
            assert_eq!(find_entry(doc, container, ITEM_ATTR, inner), Some(items[1]));
            assert_eq!(find_entry(doc, container, ITEM_ATTR, container), None);
        });
    }
}
