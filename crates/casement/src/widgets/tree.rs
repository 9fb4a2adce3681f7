//! The hierarchical collection engine.
//!
//! Unlike the list engine, node identity must survive re-parenting and
//! nested fold state, so the forest is held in an explicit in-memory model
//! (`roots`) and synchronized to the document by render passes. Rows are
//! flat `w-item` siblings of the bound element carrying `data-id`,
//! `parent-id` and `w-depth` attributes; visibility under fold is purely a
//! class (`show`), never detachment, so handles and ids survive collapse.
//!
//! Id lookups that find nothing fail loudly with `NotExistItem` — the
//! original's silent-no-op behavior was an unintended asymmetry with the
//! list engine and masks integration bugs.

use casement_core::{Result, UiError};
use serde::{Deserialize, Serialize};

use crate::callback::{CallbackDetail, CallbackRegistry, CallbackTable, SlotKind};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase, Outcome};
use crate::dom::{Document, Dom, ElementId, EventKind, InputEvent};
use crate::widgets::item;

/// Role class for tree containers.
pub const TREE_CLASS: &str = "w-tree";

/// Class of the fold-toggle icon element inside a row.
pub const TWISTIE_CLASS: &str = "w-twistie";

/// Visibility class applied by the render passes.
pub const SHOW_CLASS: &str = "show";
/// Expanded-branch class applied by the render passes.
pub const OPEN_CLASS: &str = "open";

const DATA_ID_ATTR: &str = "data-id";
const PARENT_ID_ATTR: &str = "parent-id";
const DEPTH_ATTR: &str = "w-depth";

const KIND: &str = "Tree";

const SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("add_item", SlotKind::Notify),
    ("remove_item", SlotKind::Notify),
    ("select_item", SlotKind::Gate),
    ("fold", SlotKind::Notify),
];

/// One node of the in-memory forest.
#[derive(Debug)]
pub struct TreeNode {
    element: ElementId,
    expanded: bool,
    data_id: usize,
    id_key: Option<String>,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn new(element: ElementId) -> Self {
        Self {
            element,
            expanded: false,
            data_id: 0,
            id_key: None,
            children: Vec::new(),
        }
    }

    /// The node's row element.
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// The node's dense depth-first id (valid after the last render).
    pub fn data_id(&self) -> usize {
        self.data_id
    }

    /// The node's stable external key, if one was assigned.
    pub fn id_key(&self) -> Option<&str> {
        self.id_key.as_deref()
    }

    /// Whether the node is expanded.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// The node's children.
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }
}

/// Serializable tree content for `get_data`/`load_data`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeNodeData {
    /// Row text.
    pub text: String,
    /// Stable external key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_key: Option<String>,
    /// Fold state.
    #[serde(default)]
    pub expanded: bool,
    /// Child nodes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNodeData>,
}

/// A whole forest.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeData {
    /// Root nodes.
    pub nodes: Vec<TreeNodeData>,
}

impl TreeData {
    /// Serialize to a JSON document.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| UiError::custom("tree data", err))
    }

    /// Parse from a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| UiError::custom("tree data", err))
    }
}

// Forest helpers.

fn find(nodes: &[TreeNode], id: usize) -> Option<&TreeNode> {
    for node in nodes {
        if node.data_id == id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_mut(nodes: &mut [TreeNode], id: usize) -> Option<&mut TreeNode> {
    for node in nodes {
        if node.data_id == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_by_element(nodes: &[TreeNode], element: ElementId) -> Option<&TreeNode> {
    for node in nodes {
        if node.element == element {
            return Some(node);
        }
        if let Some(found) = find_by_element(&node.children, element) {
            return Some(found);
        }
    }
    None
}

/// Splice the node with `id` out of the forest.
fn take(nodes: &mut Vec<TreeNode>, id: usize) -> Option<TreeNode> {
    if let Some(position) = nodes.iter().position(|n| n.data_id == id) {
        return Some(nodes.remove(position));
    }
    for node in nodes {
        if let Some(taken) = take(&mut node.children, id) {
            return Some(taken);
        }
    }
    None
}

/// Splice `node` into the forest next to the node with `target` id.
/// Hands the node back if the target is not found.
fn insert_relative(
    nodes: &mut Vec<TreeNode>,
    target: usize,
    node: TreeNode,
    before: bool,
) -> std::result::Result<(), TreeNode> {
    if let Some(position) = nodes.iter().position(|n| n.data_id == target) {
        let at = if before { position } else { position + 1 };
        nodes.insert(at, node);
        return Ok(());
    }
    let mut node = node;
    for parent in nodes {
        match insert_relative(&mut parent.children, target, node, before) {
            Ok(()) => return Ok(()),
            Err(returned) => node = returned,
        }
    }
    Err(node)
}

fn flatten_elements(nodes: &[TreeNode], out: &mut Vec<ElementId>) {
    for node in nodes {
        out.push(node.element);
        flatten_elements(&node.children, out);
    }
}

fn collect_elements(node: &TreeNode, out: &mut Vec<ElementId>) {
    out.push(node.element);
    for child in &node.children {
        collect_elements(child, out);
    }
}

/// The hierarchical collection container.
pub struct TreeController {
    base: ControllerBase,
    callbacks: CallbackTable,
    roots: Vec<TreeNode>,
    accurate_fold: bool,
}

impl TreeController {
    /// Bind to `element`, or create a fresh `w-tree` element when `None`.
    pub fn new(dom: Dom, registry: &CallbackRegistry, element: Option<ElementId>) -> Result<Self> {
        let element = match element {
            Some(element) => element,
            None => {
                let element = dom.create_element("div");
                dom.with_mut(|doc| doc.add_class(element, TREE_CLASS))?;
                element
            }
        };

        let base = ControllerBase::adopt(dom, element, KIND)?;
        let mut tree = Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
            roots: Vec::new(),
            accurate_fold: false,
        };

        let config = tree
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut tree.callbacks)?;
        if config.has("accurateFold") {
            tree.accurate_fold = true;
        }
        Ok(tree)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// Restrict fold toggling to clicks precisely on the twistie icon.
    pub fn set_accurate_fold(&mut self, accurate: bool) {
        self.accurate_fold = accurate;
    }

    /// The root nodes (read-only).
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    /// Total node count.
    pub fn node_size(&self) -> usize {
        fn count(nodes: &[TreeNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.children)).sum()
        }
        count(&self.roots)
    }

    /// Look up a node by id.
    pub fn get_node(&self, id: usize) -> Result<&TreeNode> {
        find(&self.roots, id).ok_or_else(|| UiError::not_exist_item(id))
    }

    /// Look up a node's id by its row element.
    pub fn node_id_of(&self, element: ElementId) -> Result<usize> {
        find_by_element(&self.roots, element)
            .map(|n| n.data_id)
            .ok_or_else(|| UiError::not_exist_item(format!("{element:?}")))
    }

    fn create_row(doc: &mut Document, container: ElementId, text: &str) -> Result<ElementId> {
        let row = doc.create_element("div");
        doc.set_attr(row, item::ITEM_ATTR, "")?;
        doc.set_text(row, text)?;
        let twistie = doc.create_element("span");
        doc.add_class(twistie, TWISTIE_CLASS)?;
        doc.append_child(row, twistie)?;
        doc.append_child(container, row)?;
        Ok(row)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Append a root node. Returns its id (valid until the next structural
    /// render renumbers).
    pub fn add_item(&mut self, text: impl Into<String>) -> Result<usize> {
        let container = self.base.element();
        let text = text.into();
        let row = self
            .base
            .dom()
            .with_mut(|doc| Self::create_row(doc, container, &text))?;
        self.roots.push(TreeNode::new(row));
        self.render()?;

        let id = self.node_id_of(row)?;
        self.callbacks
            .notify("add_item", &self.base.args(CallbackDetail::Node { id }));
        Ok(id)
    }

    /// Append a child under the node with `parent_id`, auto-expanding the
    /// parent. Returns the new node's id.
    pub fn add_child_item(&mut self, parent_id: usize, text: impl Into<String>) -> Result<usize> {
        let container = self.base.element();
        let text = text.into();
        if find(&self.roots, parent_id).is_none() {
            return Err(UiError::not_exist_item(parent_id));
        }

        let row = self
            .base
            .dom()
            .with_mut(|doc| Self::create_row(doc, container, &text))?;
        let parent = find_mut(&mut self.roots, parent_id)
            .ok_or_else(|| UiError::not_exist_item(parent_id))?;
        parent.children.push(TreeNode::new(row));
        parent.expanded = true;
        self.render()?;

        let id = self.node_id_of(row)?;
        self.callbacks
            .notify("add_item", &self.base.args(CallbackDetail::Node { id }));
        Ok(id)
    }

    /// Remove the node with `id` and its whole subtree.
    pub fn remove_item(&mut self, id: usize) -> Result<()> {
        let node = take(&mut self.roots, id).ok_or_else(|| UiError::not_exist_item(id))?;
        let mut elements = Vec::new();
        collect_elements(&node, &mut elements);
        self.base.dom().with_mut(|doc| -> Result<()> {
            for element in elements {
                doc.remove(element)?;
            }
            Ok(())
        })?;
        self.render()?;
        self.callbacks
            .notify("remove_item", &self.base.args(CallbackDetail::Node { id }));
        Ok(())
    }

    fn relocate(&mut self, source_id: usize, target_id: usize, before: bool) -> Result<()> {
        if source_id == target_id {
            return Err(UiError::parameter_mismatch("source equals target"));
        }
        let source = find(&self.roots, source_id).ok_or_else(|| UiError::not_exist_item(source_id))?;
        if find(&source.children, target_id).is_some() {
            return Err(UiError::parameter_mismatch(
                "cannot move a node into its own subtree",
            ));
        }
        if find(&self.roots, target_id).is_none() {
            return Err(UiError::not_exist_item(target_id));
        }

        let node = take(&mut self.roots, source_id)
            .ok_or_else(|| UiError::not_exist_item(source_id))?;
        match insert_relative(&mut self.roots, target_id, node, before) {
            Ok(()) => {}
            Err(node) => {
                // Target verified above; restore rather than lose the node.
                self.roots.push(node);
                return Err(UiError::not_exist_item(target_id));
            }
        }
        self.render()
    }

    /// Move the node with `source_id` to sit immediately after the node
    /// with `target_id`, anywhere in the forest. A move, not a copy.
    pub fn insert_item(&mut self, source_id: usize, target_id: usize) -> Result<()> {
        self.relocate(source_id, target_id, false)
    }

    /// Move the node with `source_id` to sit immediately before the node
    /// with `target_id`.
    pub fn insert_before_item(&mut self, source_id: usize, target_id: usize) -> Result<()> {
        self.relocate(source_id, target_id, true)
    }

    /// Assign a stable external key to a node.
    pub fn set_id_key(&mut self, id: usize, key: impl Into<String>) -> Result<()> {
        let node = find_mut(&mut self.roots, id).ok_or_else(|| UiError::not_exist_item(id))?;
        node.id_key = Some(key.into());
        Ok(())
    }

    // =========================================================================
    // Fold state
    // =========================================================================

    /// Flip a node's fold state. Only visibility changes, so this runs
    /// [`fast_render`](Self::fast_render), not a full render.
    pub fn toggle(&mut self, id: usize) -> Result<()> {
        let node = find_mut(&mut self.roots, id).ok_or_else(|| UiError::not_exist_item(id))?;
        node.expanded = !node.expanded;
        let expanded = node.expanded;
        self.fast_render()?;
        self.callbacks
            .notify("fold", &self.base.args(CallbackDetail::Fold { id, expanded }));
        Ok(())
    }

    /// Set a node's fold state explicitly.
    pub fn set_fold(&mut self, id: usize, expanded: bool) -> Result<()> {
        let node = find_mut(&mut self.roots, id).ok_or_else(|| UiError::not_exist_item(id))?;
        if node.expanded != expanded {
            node.expanded = expanded;
            self.fast_render()?;
            self.callbacks
                .notify("fold", &self.base.args(CallbackDetail::Fold { id, expanded }));
        }
        Ok(())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Two-pass synchronization: (1) dense depth-first id assignment and
    /// structural attributes, independent of fold state; (2) visibility
    /// classes as a pure function of ancestor fold state. Rows are never
    /// detached here, so ids and handles stay stable.
    pub fn fast_render(&mut self) -> Result<()> {
        let roots = &mut self.roots;
        self.base.dom().with_mut(|doc| -> Result<()> {
            let mut counter = 0usize;
            assign_pass(doc, roots, None, 0, &mut counter)?;
            visibility_pass(doc, roots, true)?;
            Ok(())
        })
    }

    /// Full render: [`fast_render`](Self::fast_render), then flatten the
    /// forest and re-append every row in document order as one batch.
    pub fn render(&mut self) -> Result<()> {
        self.fast_render()?;
        let container = self.base.element();
        let mut order = Vec::new();
        flatten_elements(&self.roots, &mut order);
        self.base.dom().with_mut(|doc| -> Result<()> {
            for element in order {
                doc.append_child(container, element)?;
            }
            Ok(())
        })
    }

    // =========================================================================
    // Data round-trip
    // =========================================================================

    /// Snapshot the forest.
    pub fn get_data(&self) -> Result<TreeData> {
        fn snapshot(doc: &Document, nodes: &[TreeNode]) -> Result<Vec<TreeNodeData>> {
            let mut out = Vec::with_capacity(nodes.len());
            for node in nodes {
                out.push(TreeNodeData {
                    text: doc.text(node.element)?.unwrap_or_default(),
                    id_key: node.id_key.clone(),
                    expanded: node.expanded,
                    children: snapshot(doc, &node.children)?,
                });
            }
            Ok(out)
        }

        let roots = &self.roots;
        let nodes = self.base.dom().with(|doc| snapshot(doc, roots))?;
        Ok(TreeData { nodes })
    }

    /// Replace the forest with `data`. Node ids are renumbered; text,
    /// `id_key` and nesting are reproduced exactly.
    pub fn load_data(&mut self, data: &TreeData) -> Result<()> {
        let container = self.base.element();

        // Drop the existing forest.
        let mut old = Vec::new();
        flatten_elements(&self.roots, &mut old);
        self.roots.clear();
        self.base.dom().with_mut(|doc| -> Result<()> {
            for element in old {
                doc.remove(element)?;
            }
            Ok(())
        })?;

        fn build(
            doc: &mut Document,
            container: ElementId,
            data: &[TreeNodeData],
        ) -> Result<Vec<TreeNode>> {
            let mut out = Vec::with_capacity(data.len());
            for entry in data {
                let row = TreeController::create_row(doc, container, &entry.text)?;
                let mut node = TreeNode::new(row);
                node.id_key = entry.id_key.clone();
                node.expanded = entry.expanded;
                node.children = build(doc, container, &entry.children)?;
                out.push(node);
            }
            Ok(out)
        }

        self.roots = self
            .base
            .dom()
            .with_mut(|doc| build(doc, container, &data.nodes))?;
        self.render()
    }

    // =========================================================================
    // Input
    // =========================================================================

    fn click(&mut self, target: ElementId) -> Vec<Outcome> {
        let container = self.base.element();
        let dom = self.base.dom().clone();

        let Some(row) = dom.with(|doc| item::find_entry(doc, container, item::ITEM_ATTR, target))
        else {
            return Vec::new();
        };
        if dom.with(|doc| item::is_disabled(doc, row)) {
            return Vec::new();
        }
        let Ok(id) = self.node_id_of(row) else {
            return Vec::new();
        };

        let on_twistie = dom
            .with(|doc| -> Result<bool> {
                Ok(doc.contains(row, target)?
                    && target != row
                    && doc.has_class(target, TWISTIE_CLASS)?)
            })
            .unwrap_or(false);

        let has_children = self
            .get_node(id)
            .map(|n| !n.children().is_empty())
            .unwrap_or(false);

        let fold = has_children && if self.accurate_fold { on_twistie } else { true };
        if fold {
            // toggle() runs fast_render only: order is unchanged, just
            // visibility.
            let _ = self.toggle(id);
        }

        let mut outcomes = Vec::new();
        if !on_twistie {
            let allowed = self.callbacks.gate(
                "select_item",
                &self.base.args(CallbackDetail::Select {
                    item: row,
                    origin: target,
                }),
            );
            if allowed {
                let applied = dom
                    .with_mut(|doc| -> Result<bool> {
                        item::clear_selected(doc, container, item::ITEM_ATTR)?;
                        item::select(doc, row)
                    })
                    .unwrap_or(false);
                if applied {
                    let index = id;
                    outcomes.push(Outcome::ItemSelected {
                        container,
                        item: row,
                        index,
                    });
                }
            }
        }
        outcomes
    }
}

fn assign_pass(
    doc: &mut Document,
    nodes: &mut [TreeNode],
    parent: Option<usize>,
    depth: usize,
    counter: &mut usize,
) -> Result<()> {
    for node in nodes.iter_mut() {
        node.data_id = *counter;
        *counter += 1;
        doc.set_attr(node.element, DATA_ID_ATTR, &node.data_id.to_string())?;
        match parent {
            Some(parent_id) => {
                doc.set_attr(node.element, PARENT_ID_ATTR, &parent_id.to_string())?
            }
            None => {
                doc.remove_attr(node.element, PARENT_ID_ATTR)?;
            }
        }
        doc.set_attr(node.element, DEPTH_ATTR, &depth.to_string())?;
        let id = node.data_id;
        assign_pass(doc, &mut node.children, Some(id), depth + 1, counter)?;
    }
    Ok(())
}

fn visibility_pass(doc: &mut Document, nodes: &[TreeNode], visible: bool) -> Result<()> {
    for node in nodes {
        doc.set_class(node.element, SHOW_CLASS, visible)?;
        doc.set_class(
            node.element,
            OPEN_CLASS,
            node.expanded && !node.children.is_empty(),
        )?;
        visibility_pass(doc, &node.children, visible && node.expanded)?;
    }
    Ok(())
}

impl Controller for TreeController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    fn callbacks_mut(&mut self) -> &mut CallbackTable {
        &mut self.callbacks
    }

    fn handle_event(&mut self, event: &InputEvent) -> Vec<Outcome> {
        match event.kind {
            EventKind::Click | EventKind::PointerDown => self.click(event.target),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Dom, TreeController) {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let tree = TreeController::new(dom.clone(), &registry, None).unwrap();
        dom.append_child(dom.root(), tree.element()).unwrap();
        (dom, tree)
    }

    /// roots: a(a1, a2(a21)), b
    fn populated() -> (Dom, TreeController, [usize; 5]) {
        let (dom, mut tree) = fixture();
        let a = tree.add_item("a").unwrap();
        let a1 = tree.add_child_item(a, "a1").unwrap();
        // Renumbering: re-resolve "a" by key after each structural change.
        tree.set_id_key(0, "a").unwrap();
        let a2 = tree.add_child_item(0, "a2").unwrap();
        let a21 = tree.add_child_item(a2, "a21").unwrap();
        let b = tree.add_item("b").unwrap();
        let _ = a1;
        (dom, tree, [0, 1, a2, a21, b])
    }

    fn text_of(dom: &Dom, el: ElementId) -> String {
        dom.with(|doc| doc.text(el).unwrap().unwrap_or_default())
    }

    #[test]
    fn ids_are_dense_depth_first_and_mirrored_to_attributes() {
        let (dom, tree, ids) = populated();
        let [a, a1, a2, a21, b] = ids;
        assert_eq!((a, a1, a2, a21, b), (0, 1, 2, 3, 4));
        assert_eq!(tree.node_size(), 5);

        let a2_el = tree.get_node(a2).unwrap().element();
        dom.with(|doc| {
            assert_eq!(doc.attr(a2_el, "data-id").unwrap().unwrap(), "2");
            assert_eq!(doc.attr(a2_el, "parent-id").unwrap().unwrap(), "0");
            assert_eq!(doc.attr(a2_el, "w-depth").unwrap().unwrap(), "1");
        });
    }

    #[test]
    fn rows_follow_forest_order_after_render() {
        let (dom, tree, _) = populated();
        let rows = dom.with(|doc| {
            item::entries(doc, tree.element(), item::ITEM_ATTR).unwrap()
        });
        let texts: Vec<String> = rows.iter().map(|&r| text_of(&dom, r)).collect();
        assert_eq!(texts, vec!["a", "a1", "a2", "a21", "b"]);
    }

    #[test]
    fn add_child_auto_expands_the_parent() {
        let (_, tree, ids) = populated();
        assert!(tree.get_node(ids[0]).unwrap().is_expanded());
        assert!(tree.get_node(ids[2]).unwrap().is_expanded());
    }

    #[test]
    fn fold_hides_descendants_without_detaching() {
        let (dom, mut tree, ids) = populated();
        let a1_el = tree.get_node(ids[1]).unwrap().element();
        let a21_el = tree.get_node(ids[3]).unwrap().element();

        tree.toggle(ids[0]).unwrap(); // collapse "a"
        dom.with(|doc| {
            assert!(doc.exists(a1_el));
            assert!(!doc.has_class(a1_el, SHOW_CLASS).unwrap());
            assert!(!doc.has_class(a21_el, SHOW_CLASS).unwrap());
        });

        tree.toggle(ids[0]).unwrap(); // expand again
        dom.with(|doc| {
            assert!(doc.has_class(a1_el, SHOW_CLASS).unwrap());
            // a2 is expanded, so a21 shows again too.
            assert!(doc.has_class(a21_el, SHOW_CLASS).unwrap());
        });
    }

    #[test]
    fn ids_and_keys_survive_collapse_expand() {
        let (_, mut tree, ids) = populated();
        tree.set_id_key(ids[3], "deep").unwrap();

        let before: Vec<(usize, Option<String>)> = (0..tree.node_size())
            .map(|id| {
                let node = tree.get_node(id).unwrap();
                (node.data_id(), node.id_key().map(str::to_owned))
            })
            .collect();

        tree.toggle(ids[0]).unwrap();
        tree.toggle(ids[0]).unwrap();

        let after: Vec<(usize, Option<String>)> = (0..tree.node_size())
            .map(|id| {
                let node = tree.get_node(id).unwrap();
                (node.data_id(), node.id_key().map(str::to_owned))
            })
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn insert_item_moves_across_subtrees() {
        let (dom, mut tree, ids) = populated();
        // Move a21 (id 3) after b (id 4): it becomes a root sibling.
        tree.insert_item(ids[3], ids[4]).unwrap();

        let rows = dom.with(|doc| item::entries(doc, tree.element(), item::ITEM_ATTR).unwrap());
        let texts: Vec<String> = rows.iter().map(|&r| text_of(&dom, r)).collect();
        assert_eq!(texts, vec!["a", "a1", "a2", "b", "a21"]);
        // a2 lost its only child.
        let a2 = tree.get_node(2).unwrap();
        assert!(a2.children().is_empty());
    }

    #[test]
    fn moving_into_own_subtree_is_rejected() {
        let (_, mut tree, ids) = populated();
        let err = tree.insert_item(ids[0], ids[3]).unwrap_err();
        assert!(matches!(err, UiError::ParameterMismatch { .. }));
    }

    #[test]
    fn missing_ids_fail_loudly() {
        let (_, mut tree, _) = populated();
        assert!(matches!(
            tree.remove_item(99).unwrap_err(),
            UiError::NotExistItem { .. }
        ));
        assert!(matches!(
            tree.toggle(99).unwrap_err(),
            UiError::NotExistItem { .. }
        ));
        assert!(matches!(
            tree.insert_item(0, 99).unwrap_err(),
            UiError::NotExistItem { .. }
        ));
    }

    #[test]
    fn remove_item_drops_the_subtree() {
        let (dom, mut tree, ids) = populated();
        let a2_el = tree.get_node(ids[2]).unwrap().element();
        let a21_el = tree.get_node(ids[3]).unwrap().element();

        tree.remove_item(ids[2]).unwrap();
        assert_eq!(tree.node_size(), 3);
        dom.with(|doc| {
            assert!(!doc.exists(a2_el));
            assert!(!doc.exists(a21_el));
        });
    }

    #[test]
    fn data_round_trip_is_isomorphic() {
        let (_, mut tree, ids) = populated();
        tree.set_id_key(ids[3], "deep").unwrap();
        let snapshot = tree.get_data().unwrap();

        tree.load_data(&snapshot).unwrap();
        let reloaded = tree.get_data().unwrap();
        assert_eq!(snapshot, reloaded);
        assert_eq!(tree.node_size(), 5);
        assert_eq!(tree.get_node(3).unwrap().id_key(), Some("deep"));
    }

    #[test]
    fn data_serializes_through_json() {
        let (_, tree, _) = populated();
        let data = tree.get_data().unwrap();
        let json = data.to_json().unwrap();
        let back = TreeData::from_json(&json).unwrap();
        assert_eq!(data, back);
        assert!(TreeData::from_json("not json").is_err());
    }

    #[test]
    fn accurate_fold_requires_the_twistie() {
        let (dom, mut tree, ids) = populated();
        tree.set_accurate_fold(true);
        let a_el = tree.get_node(ids[0]).unwrap().element();

        // Click the row body: no fold change.
        tree.handle_event(&InputEvent::new(a_el, EventKind::Click));
        assert!(tree.get_node(ids[0]).unwrap().is_expanded());

        // Click the twistie: folds.
        let twistie = dom.with(|doc| {
            doc.children(a_el)
                .unwrap()
                .into_iter()
                .find(|&c| doc.has_class(c, TWISTIE_CLASS).unwrap())
                .unwrap()
        });
        tree.handle_event(&InputEvent::new(twistie, EventKind::Click));
        assert!(!tree.get_node(ids[0]).unwrap().is_expanded());
    }

    #[test]
    fn row_click_selects_exclusively() {
        let (dom, mut tree, ids) = populated();
        let b_el = tree.get_node(ids[4]).unwrap().element();
        let a1_el = tree.get_node(ids[1]).unwrap().element();

        tree.handle_event(&InputEvent::new(b_el, EventKind::Click));
        tree.handle_event(&InputEvent::new(a1_el, EventKind::Click));

        dom.with(|doc| {
            assert!(doc.has_class(a1_el, item::SELECT_CLASS).unwrap());
            assert!(!doc.has_class(b_el, item::SELECT_CLASS).unwrap());
        });
    }
}
