//! The document: an arena of elements plus a mutation stream.
//!
//! Elements live in a slotmap keyed by [`ElementId`]; the tree shape is
//! parent/child links between records. Structural changes are recorded as
//! [`Mutation`]s and published on the [`Dom`] handle's signal *after* the
//! write lock is released, so subscribers (the scope renderer, application
//! code) can freely read or mutate the document from their slots.

use std::sync::Arc;

use casement_core::{Result, Signal, UiError};
use parking_lot::RwLock;
use slotmap::SlotMap;

use super::element::{Element, ElementId};

/// A structural change to the document.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// A detached subtree was attached under `parent`.
    Attached {
        /// Root of the attached subtree.
        element: ElementId,
        /// Its new parent.
        parent: ElementId,
    },
    /// A subtree was removed from the document.
    ///
    /// `subtree` lists every removed element (root first, depth-first) —
    /// the handles are already invalid when the mutation is observed, so
    /// the list is the only way to learn what was dropped.
    Detached {
        /// Root of the removed subtree.
        element: ElementId,
        /// Its former parent.
        parent: ElementId,
        /// Every element of the removed subtree.
        subtree: Vec<ElementId>,
    },
    /// An attached subtree changed position (same or different parent).
    ///
    /// Moves are deliberately not reported as detach + attach: controllers
    /// bound inside a moved subtree stay bound.
    Moved {
        /// Root of the moved subtree.
        element: ElementId,
        /// The previous parent.
        from: ElementId,
        /// The new parent.
        to: ElementId,
    },
}

/// The element arena.
pub struct Document {
    nodes: SlotMap<ElementId, Element>,
    root: ElementId,
    pending: Vec<Mutation>,
}

impl Document {
    fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Element::new("body"));
        Self {
            nodes,
            root,
            pending: Vec::new(),
        }
    }

    /// The root element. Always present, never removable.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Whether the handle refers to a live element.
    pub fn exists(&self, id: ElementId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Borrow an element record.
    pub fn element(&self, id: ElementId) -> Result<&Element> {
        self.nodes
            .get(id)
            .ok_or_else(|| UiError::parameter_mismatch(format!("{id:?}")))
    }

    fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| UiError::parameter_mismatch(format!("{id:?}")))
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> ElementId {
        self.nodes.insert(Element::new(tag))
    }

    // =========================================================================
    // Tree structure
    // =========================================================================

    /// Append `child` as the last child of `parent`.
    ///
    /// An already-attached child is moved (reported as [`Mutation::Moved`],
    /// not detach + attach).
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.pre_attach_check(parent, child)?;
        let old_parent = self.unlink(child)?;
        self.element_mut(parent)?.children.push(child);
        self.element_mut(child)?.parent = Some(parent);
        self.record_attach(child, old_parent, parent);
        Ok(())
    }

    /// Insert `child` immediately before `reference` under the same parent.
    pub fn insert_before(&mut self, child: ElementId, reference: ElementId) -> Result<()> {
        let parent = self
            .element(reference)?
            .parent()
            .ok_or_else(|| UiError::parameter_mismatch("reference has no parent"))?;
        self.pre_attach_check(parent, child)?;
        let old_parent = self.unlink(child)?;
        let index = self.position(parent, reference)?;
        self.element_mut(parent)?.children.insert(index, child);
        self.element_mut(child)?.parent = Some(parent);
        self.record_attach(child, old_parent, parent);
        Ok(())
    }

    /// Insert `child` immediately after `reference` under the same parent.
    pub fn insert_after(&mut self, child: ElementId, reference: ElementId) -> Result<()> {
        let parent = self
            .element(reference)?
            .parent()
            .ok_or_else(|| UiError::parameter_mismatch("reference has no parent"))?;
        self.pre_attach_check(parent, child)?;
        let old_parent = self.unlink(child)?;
        let index = self.position(parent, reference)? + 1;
        self.element_mut(parent)?.children.insert(index, child);
        self.element_mut(child)?.parent = Some(parent);
        self.record_attach(child, old_parent, parent);
        Ok(())
    }

    /// Detach an element from its parent without destroying it.
    pub fn detach(&mut self, id: ElementId) -> Result<Option<ElementId>> {
        self.unlink(id)
    }

    /// Deep-copy an element and its subtree. The copy is detached.
    pub fn clone_subtree(&mut self, id: ElementId) -> Result<ElementId> {
        let mut copy = self.element(id)?.clone();
        copy.parent = None;
        let children = std::mem::take(&mut copy.children);
        let clone = self.nodes.insert(copy);
        for child in children {
            let child_clone = self.clone_subtree(child)?;
            self.nodes[child_clone].parent = Some(clone);
            self.nodes[clone].children.push(child_clone);
        }
        Ok(clone)
    }

    /// Remove an element and its entire subtree from the document.
    ///
    /// Every handle into the subtree becomes invalid.
    pub fn remove(&mut self, id: ElementId) -> Result<()> {
        if id == self.root {
            return Err(UiError::parameter_mismatch("cannot remove the root"));
        }
        let subtree = self.descendants(id)?;
        let parent = self.unlink(id)?.unwrap_or(self.root);
        for &node in &subtree {
            self.nodes.remove(node);
        }
        tracing::trace!(
            target: "casement::dom",
            element = ?id,
            count = subtree.len(),
            "removed subtree"
        );
        self.pending.push(Mutation::Detached {
            element: id,
            parent,
            subtree,
        });
        Ok(())
    }

    fn pre_attach_check(&self, parent: ElementId, child: ElementId) -> Result<()> {
        if parent == child || self.contains(child, parent)? {
            return Err(UiError::parameter_mismatch(
                "cannot attach an element under itself",
            ));
        }
        Ok(())
    }

    /// Remove the parent link, returning the old parent. No mutation record.
    fn unlink(&mut self, id: ElementId) -> Result<Option<ElementId>> {
        let old_parent = self.element(id)?.parent();
        if let Some(parent) = old_parent {
            self.element_mut(parent)?.children.retain(|&c| c != id);
            self.element_mut(id)?.parent = None;
        }
        Ok(old_parent)
    }

    fn record_attach(&mut self, child: ElementId, old_parent: Option<ElementId>, parent: ElementId) {
        match old_parent {
            Some(from) => self.pending.push(Mutation::Moved {
                element: child,
                from,
                to: parent,
            }),
            None => self.pending.push(Mutation::Attached {
                element: child,
                parent,
            }),
        }
    }

    fn position(&self, parent: ElementId, child: ElementId) -> Result<usize> {
        self.element(parent)?
            .children()
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| UiError::parameter_mismatch("reference not under parent"))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The element's parent.
    pub fn parent(&self, id: ElementId) -> Result<Option<ElementId>> {
        Ok(self.element(id)?.parent())
    }

    /// The element's children, cloned.
    pub fn children(&self, id: ElementId) -> Result<Vec<ElementId>> {
        Ok(self.element(id)?.children().to_vec())
    }

    /// Position of `id` among its siblings.
    pub fn index_in_parent(&self, id: ElementId) -> Result<Option<usize>> {
        match self.element(id)?.parent() {
            Some(parent) => Ok(self
                .element(parent)?
                .children()
                .iter()
                .position(|&c| c == id)),
            None => Ok(None),
        }
    }

    /// Whether `node` is `ancestor` or inside `ancestor`'s subtree.
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> Result<bool> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.element(id)?.parent();
        }
        Ok(false)
    }

    /// The subtree of `id` in pre-order (root first).
    pub fn descendants(&self, id: ElementId) -> Result<Vec<ElementId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = self.element(node)?.children();
            for &child in children.iter().rev() {
                stack.push(child);
            }
        }
        Ok(out)
    }

    /// The subtree of `id` in post-order (children before parents).
    pub fn post_order(&self, id: ElementId) -> Result<Vec<ElementId>> {
        let mut pre = self.descendants(id)?;
        pre.reverse();
        Ok(pre)
    }

    /// Walk from `start` towards the root, returning the first element for
    /// which `predicate` holds.
    pub fn nearest_ancestor(
        &self,
        start: ElementId,
        mut predicate: impl FnMut(&Element) -> bool,
    ) -> Result<Option<ElementId>> {
        let mut current = Some(start);
        while let Some(id) = current {
            let element = self.element(id)?;
            if predicate(element) {
                return Ok(Some(id));
            }
            current = element.parent();
        }
        Ok(None)
    }

    /// Find every descendant (including `root`) with the given attribute.
    pub fn find_by_attr(&self, root: ElementId, name: &str) -> Result<Vec<ElementId>> {
        Ok(self
            .descendants(root)?
            .into_iter()
            .filter(|&id| self.nodes.get(id).is_some_and(|e| e.has_attr(name)))
            .collect())
    }

    // =========================================================================
    // Attributes, classes, text
    // =========================================================================

    /// Get an attribute value, cloned.
    pub fn attr(&self, id: ElementId, name: &str) -> Result<Option<String>> {
        Ok(self.element(id)?.attr(name).map(str::to_owned))
    }

    /// Whether the attribute is present.
    pub fn has_attr(&self, id: ElementId, name: &str) -> Result<bool> {
        Ok(self.element(id)?.has_attr(name))
    }

    /// Set an attribute.
    pub fn set_attr(&mut self, id: ElementId, name: &str, value: &str) -> Result<()> {
        self.element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    /// Remove an attribute, returning its former value.
    pub fn remove_attr(&mut self, id: ElementId, name: &str) -> Result<Option<String>> {
        Ok(self.element_mut(id)?.remove_attr(name))
    }

    /// Whether the class is present.
    pub fn has_class(&self, id: ElementId, class: &str) -> Result<bool> {
        Ok(self.element(id)?.has_class(class))
    }

    /// Add a class.
    pub fn add_class(&mut self, id: ElementId, class: &str) -> Result<()> {
        self.element_mut(id)?.add_class(class);
        Ok(())
    }

    /// Remove a class.
    pub fn remove_class(&mut self, id: ElementId, class: &str) -> Result<()> {
        self.element_mut(id)?.remove_class(class);
        Ok(())
    }

    /// Add or remove a class depending on `present`.
    pub fn set_class(&mut self, id: ElementId, class: &str, present: bool) -> Result<()> {
        if present {
            self.add_class(id, class)
        } else {
            self.remove_class(id, class)
        }
    }

    /// The element's own text.
    pub fn text(&self, id: ElementId) -> Result<Option<String>> {
        Ok(self.element(id)?.text().map(str::to_owned))
    }

    /// Set the element's own text.
    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) -> Result<()> {
        self.element_mut(id)?.set_text(Some(text.into()));
        Ok(())
    }

    /// Concatenated text of the element and its subtree, document order.
    pub fn deep_text(&self, id: ElementId) -> Result<String> {
        let mut out = String::new();
        for node in self.descendants(id)? {
            if let Some(text) = self.element(node)?.text() {
                out.push_str(text);
            }
        }
        Ok(out)
    }

    fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.pending)
    }
}

/// A cheap-clone handle to a shared [`Document`].
///
/// All toolkit state lives behind this handle; controllers keep a clone.
/// Structural mutations made through [`with_mut`](Dom::with_mut) (or the
/// convenience wrappers) are published on [`mutations`](Dom::mutations)
/// after the write lock is released.
#[derive(Clone)]
pub struct Dom {
    inner: Arc<RwLock<Document>>,
    mutations: Arc<Signal<Mutation>>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create a fresh document with an empty root.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Document::new())),
            mutations: Arc::new(Signal::new()),
        }
    }

    /// The structural mutation stream.
    pub fn mutations(&self) -> &Signal<Mutation> {
        &self.mutations
    }

    /// The root element.
    pub fn root(&self) -> ElementId {
        self.inner.read().root()
    }

    /// Run a closure with read access to the document.
    pub fn with<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        f(&self.inner.read())
    }

    /// Run a closure with write access, then publish recorded mutations.
    ///
    /// The lock is released before any mutation subscriber runs, so slots
    /// may re-enter the document freely.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        let (result, mutations) = {
            let mut doc = self.inner.write();
            let result = f(&mut doc);
            (result, doc.take_mutations())
        };
        for mutation in mutations {
            self.mutations.emit(mutation);
        }
        result
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: impl Into<String>) -> ElementId {
        self.inner.write().create_element(tag)
    }

    /// Create a detached element with text content.
    pub fn create_text_element(&self, tag: impl Into<String>, text: impl Into<String>) -> ElementId {
        let mut doc = self.inner.write();
        let id = doc.create_element(tag);
        // A fresh element always exists.
        let _ = doc.set_text(id, text);
        id
    }

    /// Append `child` under `parent`. See [`Document::append_child`].
    pub fn append_child(&self, parent: ElementId, child: ElementId) -> Result<()> {
        self.with_mut(|doc| doc.append_child(parent, child))
    }

    /// Remove an element and its subtree. See [`Document::remove`].
    pub fn remove(&self, id: ElementId) -> Result<()> {
        self.with_mut(|doc| doc.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn append_and_query_children() {
        let dom = Dom::new();
        let root = dom.root();
        let a = dom.create_element("div");
        let b = dom.create_element("div");
        dom.append_child(root, a).unwrap();
        dom.append_child(root, b).unwrap();

        dom.with(|doc| {
            assert_eq!(doc.children(root).unwrap(), vec![a, b]);
            assert_eq!(doc.parent(a).unwrap(), Some(root));
            assert_eq!(doc.index_in_parent(b).unwrap(), Some(1));
            assert!(doc.contains(root, b).unwrap());
            assert!(!doc.contains(a, b).unwrap());
        });
    }

    #[test]
    fn insert_before_and_after_order() {
        let dom = Dom::new();
        let root = dom.root();
        let a = dom.create_element("div");
        let b = dom.create_element("div");
        let c = dom.create_element("div");
        dom.append_child(root, a).unwrap();
        dom.append_child(root, c).unwrap();

        dom.with_mut(|doc| doc.insert_before(b, c)).unwrap();
        dom.with(|doc| assert_eq!(doc.children(root).unwrap(), vec![a, b, c]));

        dom.with_mut(|doc| doc.insert_after(a, c)).unwrap();
        dom.with(|doc| assert_eq!(doc.children(root).unwrap(), vec![b, c, a]));
    }

    #[test]
    fn remove_invalidates_subtree_handles() {
        let dom = Dom::new();
        let root = dom.root();
        let outer = dom.create_element("div");
        let inner = dom.create_element("div");
        dom.append_child(root, outer).unwrap();
        dom.append_child(outer, inner).unwrap();

        dom.remove(outer).unwrap();
        dom.with(|doc| {
            assert!(!doc.exists(outer));
            assert!(!doc.exists(inner));
            assert!(doc.children(root).unwrap().is_empty());
        });
    }

    #[test]
    fn cycle_attach_is_rejected() {
        let dom = Dom::new();
        let root = dom.root();
        let a = dom.create_element("div");
        let b = dom.create_element("div");
        dom.append_child(root, a).unwrap();
        dom.append_child(a, b).unwrap();

        assert!(dom.with_mut(|doc| doc.append_child(b, a)).is_err());
        assert!(dom.with_mut(|doc| doc.append_child(a, a)).is_err());
    }

    #[test]
    fn attach_detach_and_move_are_distinguished() {
        let dom = Dom::new();
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        dom.mutations().connect(move |mutation| {
            let name = match mutation {
                Mutation::Attached { .. } => "attached",
                Mutation::Detached { .. } => "detached",
                Mutation::Moved { .. } => "moved",
            };
            log.lock().push(name.to_string());
        });

        let root = dom.root();
        let a = dom.create_element("div");
        let b = dom.create_element("div");
        dom.append_child(root, a).unwrap();
        dom.append_child(root, b).unwrap();
        // Reordering an attached element is a move, not detach + attach.
        dom.with_mut(|doc| doc.insert_before(b, a)).unwrap();
        dom.remove(b).unwrap();

        assert_eq!(
            seen.lock().clone(),
            vec!["attached", "attached", "moved", "detached"]
        );
    }

    #[test]
    fn detached_mutation_lists_the_subtree() {
        let dom = Dom::new();
        let root = dom.root();
        let outer = dom.create_element("div");
        let inner = dom.create_element("div");
        dom.append_child(root, outer).unwrap();
        dom.append_child(outer, inner).unwrap();

        let captured: Arc<Mutex<Vec<ElementId>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        dom.mutations().connect(move |mutation| {
            if let Mutation::Detached { subtree, .. } = mutation {
                *sink.lock() = subtree.clone();
            }
        });

        dom.remove(outer).unwrap();
        assert_eq!(captured.lock().clone(), vec![outer, inner]);
    }

    #[test]
    fn deep_text_concatenates_in_document_order() {
        let dom = Dom::new();
        let root = dom.root();
        let item = dom.create_text_element("div", "alpha ");
        let span = dom.create_text_element("span", "beta");
        dom.append_child(root, item).unwrap();
        dom.append_child(item, span).unwrap();

        dom.with(|doc| assert_eq!(doc.deep_text(item).unwrap(), "alpha beta"));
    }
}
