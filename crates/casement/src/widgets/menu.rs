//! Context menu: a transient popup list shown at a point.
//!
//! The menu clamps itself to the viewport after a zero-length deferral (a
//! geometry read must wait for layout to settle) and installs an
//! outside-dismiss watcher at show time. The watcher is removed on close,
//! on outside pointer-down and on Escape — it must not leak on any path.

use std::sync::Arc;

use casement_core::{Debouncer, Result};
use parking_lot::Mutex;

use crate::callback::{CallbackDetail, CallbackRegistry, CallbackTable, SlotKind};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase, DismissWatchers, Outcome};
use crate::dom::{Dom, ElementId};
use crate::widgets::list::{LIST_CLASS, ListController};

/// Role class for context menus.
pub const MENU_CLASS: &str = "w-menu";

/// Class marking an open menu.
pub const OPEN_CLASS: &str = "open";

const KIND: &str = "ContextMenu";

const SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("select_item", SlotKind::Notify),
    ("close", SlotKind::Notify),
];

/// Ensure a menu element has its entry-list child; returns the list
/// element for the caller to bind.
pub fn prepare(dom: &Dom, element: ElementId) -> Result<ElementId> {
    dom.with_mut(|doc| {
        let existing = doc
            .children(element)?
            .into_iter()
            .find(|&child| doc.element(child).is_ok_and(|e| e.has_class(LIST_CLASS)));
        match existing {
            Some(list) => Ok(list),
            None => {
                let list = doc.create_element("div");
                doc.add_class(list, LIST_CLASS)?;
                doc.append_child(element, list)?;
                Ok(list)
            }
        }
    })
}

/// The context-menu controller.
pub struct ContextMenuController {
    base: ControllerBase,
    callbacks: CallbackTable,
    list: Arc<Mutex<ListController>>,
    list_element: ElementId,
    watchers: DismissWatchers,
    watch_token: Option<u64>,
    clamp: Debouncer<(i64, i64)>,
}

impl ContextMenuController {
    /// Assemble the menu from its bound entry list.
    pub fn new(
        dom: Dom,
        registry: &CallbackRegistry,
        element: ElementId,
        list: Arc<Mutex<ListController>>,
        watchers: DismissWatchers,
    ) -> Result<Self> {
        let list_element = list.lock().element();
        let base = ControllerBase::adopt(dom, element, KIND)?;
        let mut menu = Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
            list,
            list_element,
            watchers,
            watch_token: None,
            clamp: Debouncer::deferred(),
        };

        let config = menu
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut menu.callbacks)?;
        Ok(menu)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// The entry list element.
    pub fn list_element(&self) -> ElementId {
        self.list_element
    }

    /// Replace the menu entries.
    pub fn set_entries(&mut self, entries: &[&str]) -> Result<()> {
        let mut list = self.list.lock();
        list.remove_item_all()?;
        list.add_items(entries.iter().map(|&e| e.into()).collect(), true)
    }

    /// Whether the menu is showing.
    pub fn is_open(&self) -> bool {
        self.watch_token.is_some()
    }

    /// Show the menu at a point. The position is applied immediately and
    /// clamped to the viewport on the next pump.
    pub fn show_at(&mut self, x: i64, y: i64) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            doc.set_attr(element, "left", &x.to_string())?;
            doc.set_attr(element, "top", &y.to_string())?;
            doc.add_class(element, OPEN_CLASS)
        })?;
        if self.watch_token.is_none() {
            self.watch_token = Some(self.watchers.install(element, element));
        }
        self.clamp.trigger((x, y));
        Ok(())
    }

    /// Hide the menu and tear the watcher down.
    pub fn close(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| doc.remove_class(element, OPEN_CLASS))?;
        if let Some(token) = self.watch_token.take() {
            self.watchers.remove(token);
        }
        self.clamp.cancel();
        self.callbacks
            .notify("close", &self.base.args(CallbackDetail::None));
        Ok(())
    }

    fn apply_clamp(&mut self, x: i64, y: i64) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            let read = |id: ElementId, name: &str| -> i64 {
                doc.attr(id, name)
                    .ok()
                    .flatten()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0)
            };
            let viewport_w = read(doc.root(), "width");
            let viewport_h = read(doc.root(), "height");
            let own_w = read(element, "width");
            let own_h = read(element, "height");

            let x = if viewport_w > 0 {
                x.min(viewport_w - own_w).max(0)
            } else {
                x.max(0)
            };
            let y = if viewport_h > 0 {
                y.min(viewport_h - own_h).max(0)
            } else {
                y.max(0)
            };
            doc.set_attr(element, "left", &x.to_string())?;
            doc.set_attr(element, "top", &y.to_string())
        })
    }
}

impl Controller for ContextMenuController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    fn callbacks_mut(&mut self) -> &mut CallbackTable {
        &mut self.callbacks
    }

    fn on_child_outcome(&mut self, outcome: &Outcome) -> Vec<Outcome> {
        let Outcome::ItemSelected {
            container,
            item,
            index,
        } = outcome
        else {
            return Vec::new();
        };
        if *container != self.list_element {
            return Vec::new();
        }

        self.callbacks.notify(
            "select_item",
            &self.base.args(CallbackDetail::Item {
                item: *item,
                index: *index,
            }),
        );
        let _ = self.close();
        Vec::new()
    }

    fn pump(&mut self) -> Vec<Outcome> {
        if let Some((x, y)) = self.clamp.fire_due() {
            let _ = self.apply_clamp(x, y);
        }
        Vec::new()
    }

    fn on_dismiss(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Dom, ContextMenuController, DismissWatchers) {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let watchers = DismissWatchers::new();

        let element = dom.create_element("div");
        dom.with_mut(|doc| doc.add_class(element, MENU_CLASS)).unwrap();
        dom.append_child(dom.root(), element).unwrap();

        let list_el = prepare(&dom, element).unwrap();
        let list = Arc::new(Mutex::new(
            ListController::new(dom.clone(), &registry, Some(list_el)).unwrap(),
        ));
        let menu =
            ContextMenuController::new(dom.clone(), &registry, element, list, watchers.clone())
                .unwrap();
        (dom, menu, watchers)
    }

    #[test]
    fn show_installs_watcher_and_close_removes_it() {
        let (_, mut menu, watchers) = fixture();
        menu.set_entries(&["Cut", "Copy", "Paste"]).unwrap();

        menu.show_at(10, 20).unwrap();
        assert!(menu.is_open());
        assert_eq!(watchers.count(), 1);

        menu.close().unwrap();
        assert!(!menu.is_open());
        assert_eq!(watchers.count(), 0);
    }

    #[test]
    fn position_clamps_to_viewport_on_pump() {
        let (dom, mut menu, _) = fixture();
        let element = menu.element();
        dom.with_mut(|doc| {
            let root = doc.root();
            doc.set_attr(root, "width", "800")?;
            doc.set_attr(root, "height", "600")?;
            doc.set_attr(element, "width", "120")?;
            doc.set_attr(element, "height", "200")
        })
        .unwrap();

        menu.show_at(750, 550).unwrap();
        // Before the pump the raw position is applied.
        dom.with(|doc| {
            assert_eq!(doc.attr(element, "left").unwrap().unwrap(), "750");
        });

        menu.pump();
        dom.with(|doc| {
            assert_eq!(doc.attr(element, "left").unwrap().unwrap(), "680");
            assert_eq!(doc.attr(element, "top").unwrap().unwrap(), "400");
        });
    }

    #[test]
    fn selection_notifies_and_closes() {
        let (_, mut menu, watchers) = fixture();
        menu.set_entries(&["Rename", "Delete"]).unwrap();
        menu.show_at(0, 0).unwrap();

        let outcomes = menu.list.lock().select_item(1usize).unwrap();
        for outcome in &outcomes {
            menu.on_child_outcome(outcome);
        }
        assert!(!menu.is_open());
        assert_eq!(watchers.count(), 0);
    }

    #[test]
    fn dismissal_by_escape_path_does_not_leak() {
        let (_, mut menu, watchers) = fixture();
        menu.set_entries(&["One"]).unwrap();
        menu.show_at(5, 5).unwrap();

        // The Ui pops the watcher and calls on_dismiss for Escape; closing
        // again afterwards must not double-free anything.
        let watcher = watchers.take_top().unwrap();
        assert_eq!(watcher.owner, menu.element());
        menu.on_dismiss();
        assert_eq!(watchers.count(), 0);
        assert!(!menu.is_open());
        menu.close().unwrap();
    }
}
