//! Select and drop-list composites: a popup list with auto-dismiss.
//!
//! Both widgets own a nested list controller for their options and install
//! a [`DismissWatchers`] entry while open, so an outside pointer-down or
//! Escape closes them without leaking the registration.

use std::sync::Arc;

use casement_core::Result;
use parking_lot::Mutex;

use crate::callback::{CallbackDetail, CallbackRegistry, CallbackTable, SlotKind};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase, DismissWatchers, Outcome};
use crate::dom::{Dom, ElementId, EventKind, InputEvent};
use crate::widgets::list::{LIST_CLASS, ListController};

/// Role class for select widgets.
pub const SELECT_ROLE_CLASS: &str = "w-select";
/// Role class for drop lists.
pub const DROPLIST_CLASS: &str = "w-droplist";

/// Class of the closed field part of a select.
pub const FIELD_CLASS: &str = "w-select-field";

/// Class marking an open popup.
pub const OPEN_CLASS: &str = "open";

const SELECT_KIND: &str = "Select";
const DROPLIST_KIND: &str = "DropList";

const SELECT_SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("value_change", SlotKind::Notify),
    ("open", SlotKind::Notify),
    ("close", SlotKind::Notify),
];

const DROPLIST_SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("select_item", SlotKind::Notify),
    ("open", SlotKind::Notify),
    ("close", SlotKind::Notify),
];

/// Ensure a select/drop-list element has its popup list child; returns
/// `(field_element_or_none, popup_element)`.
///
/// The caller binds a [`ListController`] on the popup before constructing
/// the composite.
pub fn prepare(dom: &Dom, element: ElementId, with_field: bool) -> Result<(Option<ElementId>, ElementId)> {
    dom.with_mut(|doc| {
        let mut field = None;
        let mut popup = None;
        for child in doc.children(element)? {
            if doc.element(child)?.has_class(FIELD_CLASS) {
                field = Some(child);
            } else if doc.element(child)?.has_class(LIST_CLASS) {
                popup = Some(child);
            }
        }

        let field = match (with_field, field) {
            (false, _) => None,
            (true, Some(field)) => Some(field),
            (true, None) => {
                let field = doc.create_element("div");
                doc.add_class(field, FIELD_CLASS)?;
                doc.append_child(element, field)?;
                Some(field)
            }
        };
        let popup = match popup {
            Some(popup) => popup,
            None => {
                let popup = doc.create_element("div");
                doc.add_class(popup, LIST_CLASS)?;
                doc.append_child(element, popup)?;
                popup
            }
        };
        Ok((field, popup))
    })
}

/// The select composite: a closed field plus a popup option list.
pub struct SelectController {
    base: ControllerBase,
    callbacks: CallbackTable,
    field: ElementId,
    popup: Arc<Mutex<ListController>>,
    popup_element: ElementId,
    watchers: DismissWatchers,
    watch_token: Option<u64>,
}

impl SelectController {
    /// Assemble the composite from its bound popup list.
    pub fn new(
        dom: Dom,
        registry: &CallbackRegistry,
        element: ElementId,
        field: ElementId,
        popup: Arc<Mutex<ListController>>,
        watchers: DismissWatchers,
    ) -> Result<Self> {
        let popup_element = popup.lock().element();
        let base = ControllerBase::adopt(dom, element, SELECT_KIND)?;
        let mut select = Self {
            base,
            callbacks: CallbackTable::new(SELECT_KIND, SELECT_SLOTS),
            field,
            popup,
            popup_element,
            watchers,
            watch_token: None,
        };

        let config = select
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut select.callbacks)?;
        Ok(select)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// The popup list's element.
    pub fn popup_element(&self) -> ElementId {
        self.popup_element
    }

    /// The current field value.
    pub fn value(&self) -> Result<String> {
        let field = self.field;
        Ok(self
            .base
            .dom()
            .with(|doc| doc.text(field))?
            .unwrap_or_default())
    }

    /// Add an option to the popup list.
    pub fn add_option(&mut self, text: impl Into<String>) -> Result<ElementId> {
        self.popup.lock().add_item(text.into(), true)
    }

    /// Whether the popup is open.
    pub fn is_open(&self) -> bool {
        self.watch_token.is_some()
    }

    /// Open the popup and arm the outside-dismiss watcher.
    pub fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| doc.add_class(element, OPEN_CLASS))?;
        self.watch_token = Some(self.watchers.install(element, element));
        self.callbacks
            .notify("open", &self.base.args(CallbackDetail::None));
        Ok(())
    }

    /// Close the popup and tear the watcher down.
    pub fn close(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| doc.remove_class(element, OPEN_CLASS))?;
        if let Some(token) = self.watch_token.take() {
            self.watchers.remove(token);
        }
        self.callbacks
            .notify("close", &self.base.args(CallbackDetail::None));
        Ok(())
    }
}

impl Controller for SelectController {
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
        if !matches!(event.kind, EventKind::PointerDown | EventKind::Click) {
            return Vec::new();
        }
        let on_field = self
            .base
            .dom()
            .with(|doc| doc.contains(self.field, event.target))
            .unwrap_or(false);
        if on_field {
            let _ = if self.is_open() { self.close() } else { self.open() };
        }
        Vec::new()
    }

    fn on_child_outcome(&mut self, outcome: &Outcome) -> Vec<Outcome> {
        let Outcome::ItemSelected {
            container, item, ..
        } = outcome
        else {
            return Vec::new();
        };
        if *container != self.popup_element {
            return Vec::new();
        }

        let text = self
            .base
            .dom()
            .with(|doc| doc.deep_text(*item))
            .unwrap_or_default();
        let field = self.field;
        let _ = self
            .base
            .dom()
            .with_mut(|doc| doc.set_text(field, text.clone()));
        self.callbacks.notify(
            "value_change",
            &self.base.args(CallbackDetail::Value {
                value: text.clone(),
            }),
        );
        let _ = self.close();
        vec![Outcome::ValueCommitted {
            element: self.base.element(),
            value: text,
        }]
    }

    fn on_dismiss(&mut self) {
        let _ = self.close();
    }
}

/// The drop list: an anchored popup list without a field.
pub struct DropListController {
    base: ControllerBase,
    callbacks: CallbackTable,
    popup: Arc<Mutex<ListController>>,
    popup_element: ElementId,
    watchers: DismissWatchers,
    watch_token: Option<u64>,
}

impl DropListController {
    /// Assemble the composite from its bound popup list.
    pub fn new(
        dom: Dom,
        registry: &CallbackRegistry,
        element: ElementId,
        popup: Arc<Mutex<ListController>>,
        watchers: DismissWatchers,
    ) -> Result<Self> {
        let popup_element = popup.lock().element();
        let base = ControllerBase::adopt(dom, element, DROPLIST_KIND)?;
        let mut droplist = Self {
            base,
            callbacks: CallbackTable::new(DROPLIST_KIND, DROPLIST_SLOTS),
            popup,
            popup_element,
            watchers,
            watch_token: None,
        };

        let config = droplist
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut droplist.callbacks)?;
        Ok(droplist)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// Add an entry to the popup list.
    pub fn add_option(&mut self, text: impl Into<String>) -> Result<ElementId> {
        self.popup.lock().add_item(text.into(), true)
    }

    /// Whether the popup is open.
    pub fn is_open(&self) -> bool {
        self.watch_token.is_some()
    }

    /// Show the popup at a position and arm the dismiss watcher.
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
        self.callbacks
            .notify("open", &self.base.args(CallbackDetail::None));
        Ok(())
    }

    /// Close the popup and tear the watcher down.
    pub fn close(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| doc.remove_class(element, OPEN_CLASS))?;
        if let Some(token) = self.watch_token.take() {
            self.watchers.remove(token);
        }
        self.callbacks
            .notify("close", &self.base.args(CallbackDetail::None));
        Ok(())
    }
}

impl Controller for DropListController {
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
        if *container != self.popup_element {
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

    fn on_dismiss(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select_fixture() -> (Dom, SelectController, DismissWatchers) {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let watchers = DismissWatchers::new();

        let element = dom.create_element("div");
        dom.with_mut(|doc| doc.add_class(element, SELECT_ROLE_CLASS)).unwrap();
        dom.append_child(dom.root(), element).unwrap();

        let (field, popup_el) = prepare(&dom, element, true).unwrap();
        let popup = Arc::new(Mutex::new(
            ListController::new(dom.clone(), &registry, Some(popup_el)).unwrap(),
        ));
        let select = SelectController::new(
            dom.clone(),
            &registry,
            element,
            field.unwrap(),
            popup,
            watchers.clone(),
        )
        .unwrap();
        (dom, select, watchers)
    }

    #[test]
    fn field_press_toggles_open_state() {
        let (_, mut select, watchers) = select_fixture();
        let field = select.field;

        select.handle_event(&InputEvent::new(field, EventKind::PointerDown));
        assert!(select.is_open());
        assert_eq!(watchers.count(), 1);

        select.handle_event(&InputEvent::new(field, EventKind::PointerDown));
        assert!(!select.is_open());
        assert_eq!(watchers.count(), 0);
    }

    #[test]
    fn choosing_an_option_sets_the_field_and_closes() {
        let (_, mut select, watchers) = select_fixture();
        select.add_option("Red").unwrap();
        select.add_option("Green").unwrap();
        select.open().unwrap();

        // Route the popup list's selection outcome, the way the Ui does.
        let outcomes = select.popup.lock().select_item(1usize).unwrap();
        let mut committed = Vec::new();
        for outcome in &outcomes {
            committed.extend(select.on_child_outcome(outcome));
        }

        assert_eq!(select.value().unwrap(), "Green");
        assert!(!select.is_open());
        assert_eq!(watchers.count(), 0);
        assert!(matches!(
            committed.as_slice(),
            [Outcome::ValueCommitted { value, .. }] if value == "Green"
        ));
    }

    #[test]
    fn dismissal_closes_without_selection() {
        let (_, mut select, watchers) = select_fixture();
        select.add_option("Only").unwrap();
        select.open().unwrap();
        assert_eq!(watchers.count(), 1);

        select.on_dismiss();
        assert!(!select.is_open());
        assert_eq!(watchers.count(), 0);
        assert_eq!(select.value().unwrap(), "");
    }

    #[test]
    fn droplist_notifies_and_closes_on_selection() {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let watchers = DismissWatchers::new();

        let element = dom.create_element("div");
        dom.with_mut(|doc| doc.add_class(element, DROPLIST_CLASS)).unwrap();
        dom.append_child(dom.root(), element).unwrap();

        let (_, popup_el) = prepare(&dom, element, false).unwrap();
        let popup = Arc::new(Mutex::new(
            ListController::new(dom.clone(), &registry, Some(popup_el)).unwrap(),
        ));
        let mut droplist = DropListController::new(
            dom.clone(),
            &registry,
            element,
            popup.clone(),
            watchers.clone(),
        )
        .unwrap();

        droplist.add_option("Cut").unwrap();
        droplist.add_option("Paste").unwrap();
        droplist.show_at(40, 60).unwrap();
        dom.with(|doc| {
            assert_eq!(doc.attr(element, "left").unwrap().unwrap(), "40");
            assert_eq!(doc.attr(element, "top").unwrap().unwrap(), "60");
        });

        let chosen = std::sync::Arc::new(parking_lot::Mutex::new(None::<usize>));
        let sink = chosen.clone();
        droplist
            .callbacks_mut()
            .set("select_item", crate::callback::Handler::notify(move |args| {
                if let CallbackDetail::Item { index, .. } = args.detail {
                    *sink.lock() = Some(index);
                }
            }))
            .unwrap();

        let outcomes = popup.lock().select_item(0usize).unwrap();
        for outcome in &outcomes {
            droplist.on_child_outcome(outcome);
        }
        assert_eq!(*chosen.lock(), Some(0));
        assert!(!droplist.is_open());
        assert_eq!(watchers.count(), 0);
    }
}
