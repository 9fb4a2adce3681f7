//! Scope rendering: role-class discovery and mutation-driven auto-binding.
//!
//! A *scope* is a subtree whose role-tagged elements are bound
//! automatically. [`Scope::render`] is the one-shot pass: it scans the
//! subtree and binds every unmarked role element (marked ones are skipped,
//! which is what makes repeated passes safe). [`Scope::observe`] keeps a
//! scope live by subscribing to the document's attach/detach stream:
//! attached subtrees are scanned and bound, detached subtrees have their
//! controllers torn down.
//!
//! Programmatic shells (dialogs, drawers, floating panels, context menus,
//! messages) are not in the role table — they are always constructed
//! through their `Ui::open_*` entry points.

use casement_core::{ConnectionId, Result};

use crate::controller::INIT_MARKER;
use crate::dom::{ElementId, Mutation};
use crate::ui::Ui;
use crate::widgets::{appbar, edit, fieldset, list, paging, sash, select, stacked, tabs, tree};

/// A widget role discoverable from markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    List,
    Tree,
    Stacked,
    Tab,
    Select,
    DropList,
    Paging,
    AppBar,
    Edit,
    Fieldset,
    Sash,
}

/// The role table: role class → role.
///
/// Order matters: composites come before the primitives they contain, so a
/// `w-tab` element binds as a tab even though its bar also carries
/// `w-list` (the bar child is bound by the composite itself and then
/// skipped here by its marker).
pub const ROLE_TABLE: &[(&str, Role)] = &[
    (tabs::TAB_CLASS, Role::Tab),
    (select::SELECT_ROLE_CLASS, Role::Select),
    (select::DROPLIST_CLASS, Role::DropList),
    (tree::TREE_CLASS, Role::Tree),
    (list::LIST_CLASS, Role::List),
    (stacked::STACKED_CLASS, Role::Stacked),
    (paging::PAGING_CLASS, Role::Paging),
    (appbar::APPBAR_CLASS, Role::AppBar),
    (edit::EDIT_CLASS, Role::Edit),
    (fieldset::FIELDSET_CLASS, Role::Fieldset),
    (sash::SASH_CLASS, Role::Sash),
];

/// The auto-discovery renderer.
pub struct Scope;

impl Scope {
    /// Scan `root`'s subtree and bind every unmarked role element.
    ///
    /// Returns the number of controllers bound by this pass.
    pub fn render(ui: &Ui, root: ElementId) -> Result<usize> {
        let candidates = ui.dom().with(|doc| -> Result<Vec<(ElementId, Role)>> {
            let mut out = Vec::new();
            if !doc.exists(root) {
                return Ok(out);
            }
            for element in doc.descendants(root)? {
                let record = doc.element(element)?;
                if record.has_attr(INIT_MARKER) {
                    continue;
                }
                for &(class, role) in ROLE_TABLE {
                    if record.has_class(class) {
                        out.push((element, role));
                        break;
                    }
                }
            }
            Ok(out)
        })?;

        let mut bound = 0usize;
        for (element, role) in candidates {
            // A composite bound earlier in this pass may have claimed the
            // element (e.g. a tab binding its own bar list).
            let already = ui
                .dom()
                .with(|doc| doc.has_attr(element, INIT_MARKER))
                .unwrap_or(true);
            if already {
                continue;
            }
            Self::bind(ui, element, role)?;
            bound += 1;
        }
        tracing::debug!(target: "casement::scope", ?root, bound, "scope render pass");
        Ok(bound)
    }

    fn bind(ui: &Ui, element: ElementId, role: Role) -> Result<()> {
        match role {
            Role::List => ui.bind_list(Some(element)).map(|_| ()),
            Role::Tree => ui.bind_tree(Some(element)).map(|_| ()),
            Role::Stacked => ui.bind_stacked(Some(element)).map(|_| ()),
            Role::Tab => ui.bind_tab(Some(element)).map(|_| ()),
            Role::Select => ui.bind_select(Some(element)).map(|_| ()),
            Role::DropList => ui.bind_droplist(Some(element)).map(|_| ()),
            Role::Paging => ui.bind_paging(Some(element)).map(|_| ()),
            Role::AppBar => ui.bind_appbar(Some(element)).map(|_| ()),
            Role::Edit => ui.bind_edit(Some(element)).map(|_| ()),
            Role::Fieldset => ui.bind_fieldset(Some(element)).map(|_| ()),
            Role::Sash => ui.bind_sash(Some(element)).map(|_| ()),
        }
    }

    /// Keep the whole document auto-bound: attached subtrees are scanned,
    /// detached subtrees have their controllers deleted.
    ///
    /// Returns the mutation-stream connection; disconnect it to stop
    /// observing.
    pub fn observe(ui: &Ui) -> ConnectionId {
        let observer = ui.clone();
        ui.dom().mutations().connect(move |mutation| match mutation {
            Mutation::Attached { element, .. } => {
                if let Err(err) = Scope::render(&observer, *element) {
                    tracing::warn!(target: "casement::scope", %err, "auto-bind failed");
                }
            }
            Mutation::Detached { subtree, .. } => {
                for &element in subtree {
                    observer.drop_controller(element);
                }
            }
            Mutation::Moved { .. } => {}
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;

    fn role_element(dom: &Dom, class: &str) -> ElementId {
        let element = dom.create_element("div");
        dom.with_mut(|doc| doc.add_class(element, class)).unwrap();
        element
    }

    #[test]
    fn render_binds_each_role_once() {
        let ui = Ui::new();
        let dom = ui.dom().clone();
        let root = dom.root();

        let list = role_element(&dom, list::LIST_CLASS);
        let tree = role_element(&dom, tree::TREE_CLASS);
        dom.append_child(root, list).unwrap();
        dom.append_child(root, tree).unwrap();

        let bound = Scope::render(&ui, root).unwrap();
        assert_eq!(bound, 2);
        assert!(ui.controller(list).is_some());
        assert!(ui.controller(tree).is_some());

        // A second pass over the same subtree binds nothing new.
        assert_eq!(Scope::render(&ui, root).unwrap(), 0);
        assert_eq!(ui.controller_count(), 2);
    }

    #[test]
    fn rescan_preserves_callback_customizations() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let ui = Ui::new();
        let dom = ui.dom().clone();
        let list = role_element(&dom, list::LIST_CLASS);
        dom.append_child(dom.root(), list).unwrap();
        Scope::render(&ui, dom.root()).unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        ui.set_callback(
            list,
            "add_item",
            crate::callback::Handler::notify(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        Scope::render(&ui, dom.root()).unwrap();
        let controller = ui.bind_list(Some(list)).unwrap();
        controller.lock().add_item("after rescan", true).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn tab_composite_claims_its_own_bar() {
        let ui = Ui::new();
        let dom = ui.dom().clone();
        let tab = role_element(&dom, tabs::TAB_CLASS);
        dom.append_child(dom.root(), tab).unwrap();

        Scope::render(&ui, dom.root()).unwrap();
        let controller = ui.controller(tab).unwrap();
        assert_eq!(controller.kind(), "Tab");
        // Bar and content primitives were bound by the composite.
        assert_eq!(ui.controller_count(), 3);
    }

    #[test]
    fn observe_binds_attachments_and_tears_down_detachments() {
        let ui = Ui::new();
        let dom = ui.dom().clone();
        let _observer = Scope::observe(&ui);

        let list = role_element(&dom, list::LIST_CLASS);
        dom.append_child(dom.root(), list).unwrap();
        assert!(ui.controller(list).is_some());

        dom.remove(list).unwrap();
        assert!(ui.controller(list).is_none());
        assert_eq!(ui.controller_count(), 0);
    }
}
