//! Tabs: a bar list and a content stack kept in lockstep.
//!
//! The content stack's view list is the single source of truth. The bar is
//! a derived projection: every structural change re-renders bar items from
//! the views' `tab-title` / `tab-config` attributes. A bar/content count
//! mismatch is a fatal consistency error, never silently tolerated.

use std::sync::Arc;

use casement_core::{Result, UiError};
use parking_lot::Mutex;

use crate::callback::{CallbackDetail, CallbackRegistry, CallbackTable, Handler, SlotKind};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase, Outcome};
use crate::dom::{Dom, ElementId};
use crate::widgets::item;
use crate::widgets::list::{LIST_CLASS, ListController};
use crate::widgets::stacked::{STACKED_CLASS, StackedController};

use super::item::{ItemContent, ItemRef};

/// Role class for tab containers.
pub const TAB_CLASS: &str = "w-tab";
/// Attribute marking the bar child.
pub const BAR_ATTR: &str = "w-bar";
/// Attribute marking the content child.
pub const CONTENT_ATTR: &str = "w-content";

/// Per-view attribute holding the bar label.
pub const TAB_TITLE_ATTR: &str = "tab-title";
/// Per-view attribute holding bar-item configuration.
pub const TAB_CONFIG_ATTR: &str = "tab-config";

/// Class of the per-tab close button.
pub const DELETE_BTN_CLASS: &str = "delete-btn";

const KIND: &str = "Tab";

const SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("add_tab", SlotKind::Notify),
    ("remove_tab", SlotKind::Notify),
    ("select_tab", SlotKind::Notify),
    ("swap_tab", SlotKind::Gate),
];

/// The tabs composite.
pub struct TabController {
    base: ControllerBase,
    callbacks: CallbackTable,
    bar: Arc<Mutex<ListController>>,
    bar_element: ElementId,
    content: Arc<Mutex<StackedController>>,
    content_element: ElementId,
}

impl TabController {
    /// Prepare a tab element's internal structure: ensure the `w-bar` and
    /// `w-content` children exist and collect any `w-view` children that
    /// were declared directly under the tab element (they become the
    /// initial tabs).
    ///
    /// Returns `(bar_element, content_element, initial_views)`. The caller
    /// binds a [`ListController`] on the bar and a [`StackedController`] on
    /// the content before constructing the [`TabController`].
    pub fn prepare(dom: &Dom, element: ElementId) -> Result<(ElementId, ElementId, Vec<ElementId>)> {
        dom.with_mut(|doc| {
            let mut bar = None;
            let mut content = None;
            let mut views = Vec::new();
            for child in doc.children(element)? {
                if doc.element(child)?.has_attr(BAR_ATTR) {
                    bar = Some(child);
                } else if doc.element(child)?.has_attr(CONTENT_ATTR) {
                    content = Some(child);
                } else if doc.element(child)?.has_attr(item::VIEW_ATTR) {
                    views.push(child);
                }
            }

            let bar = match bar {
                Some(bar) => bar,
                None => {
                    let bar = doc.create_element("div");
                    doc.set_attr(bar, BAR_ATTR, "")?;
                    doc.add_class(bar, LIST_CLASS)?;
                    doc.append_child(element, bar)?;
                    bar
                }
            };
            let content = match content {
                Some(content) => content,
                None => {
                    let content = doc.create_element("div");
                    doc.set_attr(content, CONTENT_ATTR, "")?;
                    doc.add_class(content, STACKED_CLASS)?;
                    doc.append_child(element, content)?;
                    content
                }
            };
            Ok((bar, content, views))
        })
    }

    /// Assemble the composite from its bound primitives.
    ///
    /// `initial_views` (typically from [`prepare`](Self::prepare)) are
    /// adopted as tabs; the bar is rendered and a default tab selected
    /// (the first pre-selected view, else the first enabled bar item).
    pub fn new(
        dom: Dom,
        registry: &CallbackRegistry,
        element: ElementId,
        bar: Arc<Mutex<ListController>>,
        content: Arc<Mutex<StackedController>>,
        initial_views: Vec<ElementId>,
    ) -> Result<Self> {
        let bar_element = bar.lock().element();
        let content_element = content.lock().element();

        let base = ControllerBase::adopt(dom, element, KIND)?;
        let mut tab = Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
            bar,
            bar_element,
            content,
            content_element,
        };

        // The bar never selects on its own: selection is driven through
        // the tab so the content stack stays synchronized.
        tab.bar
            .lock()
            .callbacks_mut()
            .set("select_item", Handler::gate(|_| false))?;

        let config = tab
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut tab.callbacks)?;

        tab.add_tabs(initial_views)?;
        Ok(tab)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// The bar list element.
    pub fn bar_element(&self) -> ElementId {
        self.bar_element
    }

    /// The content stack element.
    pub fn content_element(&self) -> ElementId {
        self.content_element
    }

    // =========================================================================
    // Bar projection
    // =========================================================================

    /// Rebuild the bar from the content stack's current views, then restore
    /// a valid selection.
    pub fn render_bar(&mut self) -> Result<()> {
        let views = self.content.lock().get_view_all()?;
        let dom = self.base.dom().clone();

        // Collect (title, config) per view, then build the bar items.
        let mut items = Vec::with_capacity(views.len());
        for &view in &views {
            let (title, config) = dom.with(|doc| -> Result<_> {
                let title = doc.attr(view, TAB_TITLE_ATTR)?.unwrap_or_default();
                let config = doc.attr(view, TAB_CONFIG_ATTR)?.unwrap_or_default();
                Ok((title, ConfigMap::parse(&config)))
            })?;
            let entry = dom.with_mut(|doc| -> Result<ElementId> {
                let entry = doc.create_element("div");
                doc.set_attr(entry, item::ITEM_ATTR, "")?;

                let icon = doc.create_element("img");
                doc.add_class(icon, "icon")?;
                doc.set_attr(icon, "draggable", "false")?;
                let text = doc.create_element("span");
                doc.add_class(text, "text")?;
                doc.set_text(text, title)?;
                let delete_btn = doc.create_element("i");
                doc.add_class(delete_btn, DELETE_BTN_CLASS)?;

                doc.append_child(entry, icon)?;
                doc.append_child(entry, text)?;
                doc.append_child(entry, delete_btn)?;

                if config.has("disabled") {
                    doc.set_attr(entry, item::DISABLED_ATTR, "")?;
                }
                if config.has("move") {
                    doc.set_attr(entry, "draggable", "true")?;
                }
                if config.has("fixed") {
                    doc.add_class(entry, item::FIXED_CLASS)?;
                }
                if config.has("delete") {
                    doc.add_class(delete_btn, "enabled")?;
                    if config.get("delete") == Some("auto-hide") {
                        doc.add_class(delete_btn, "hide")?;
                    }
                }
                if let Some(src) = config.get("icon")
                    && !src.is_empty()
                {
                    doc.add_class(icon, "enabled")?;
                    doc.set_attr(icon, "src", src)?;
                }
                Ok(entry)
            })?;
            items.push(ItemContent::Element(entry));
        }

        {
            let mut bar = self.bar.lock();
            bar.remove_item_all()?;
            bar.add_items(items, true)?;
        }

        // Restore selection: a pre-selected view wins, else the first
        // enabled bar item.
        let selected_view_index = dom.with(|doc| -> Result<Option<usize>> {
            for (index, &view) in views.iter().enumerate() {
                if doc.has_class(view, item::SELECT_CLASS)? {
                    return Ok(Some(index));
                }
            }
            Ok(None)
        })?;
        let target = match selected_view_index {
            Some(index) => Some(index),
            None => {
                let bar_items = self.bar.lock().get_item_all()?;
                dom.with(|doc| -> Result<Option<usize>> {
                    for (index, &entry) in bar_items.iter().enumerate() {
                        if !item::is_disabled(doc, entry) {
                            return Ok(Some(index));
                        }
                    }
                    Ok(None)
                })?
            }
        };
        if let Some(index) = target {
            self.select_tab(index)?;
        }
        Ok(())
    }

    // =========================================================================
    // Tab management
    // =========================================================================

    /// Add a tab (a `w-view` element; its `tab-title` attribute labels the
    /// bar item).
    pub fn add_tab(&mut self, view: ElementId, render: bool) -> Result<()> {
        self.content.lock().add_view(view, true)?;
        if render {
            self.render_bar()?;
        }
        let index = self.tab_size()?.saturating_sub(1);
        self.callbacks.notify(
            "add_tab",
            &self.base.args(CallbackDetail::View { view, index }),
        );
        Ok(())
    }

    /// Add several tabs, rendering the bar once at the end.
    pub fn add_tabs(&mut self, views: Vec<ElementId>) -> Result<()> {
        for (index, view) in views.into_iter().enumerate() {
            self.add_tab(view, false).map_err(|err| err.at_index(index))?;
        }
        self.render_bar()
    }

    /// Remove a tab; the bar re-renders from the remaining views and a
    /// valid tab is auto-selected.
    pub fn remove_tab(&mut self, entry: impl Into<ItemRef>) -> Result<()> {
        let entry = entry.into();
        let index = self.resolve_view_index(entry)?;
        self.content.lock().remove_view(entry, true)?;
        self.render_bar()?;
        self.callbacks.notify(
            "remove_tab",
            &self.base.args(CallbackDetail::Index { index }),
        );
        Ok(())
    }

    /// View at `index`.
    pub fn get_tab(&self, index: usize) -> Result<Option<ElementId>> {
        self.content.lock().get_view(index)
    }

    /// All views.
    pub fn get_tab_all(&self) -> Result<Vec<ElementId>> {
        self.content.lock().get_view_all()
    }

    /// The selected view, if any.
    pub fn get_select_tab(&self) -> Result<Option<ElementId>> {
        self.content.lock().get_select_view()
    }

    /// Number of tabs.
    pub fn tab_size(&self) -> Result<usize> {
        self.content.lock().view_size()
    }

    fn resolve_view_index(&self, entry: ItemRef) -> Result<usize> {
        let views = self.content.lock().get_view_all()?;
        match entry {
            ItemRef::Index(index) => {
                if index < views.len() {
                    Ok(index)
                } else {
                    Err(UiError::not_exist_view(index))
                }
            }
            ItemRef::Element(element) => views
                .iter()
                .position(|&v| v == element)
                .ok_or_else(|| UiError::parameter_mismatch(format!("{element:?}"))),
        }
    }

    /// Select a tab: the content view and its bar item together.
    pub fn select_tab(&mut self, entry: impl Into<ItemRef>) -> Result<()> {
        let index = self.resolve_view_index(entry.into())?;
        self.content.lock().select_view(index)?;

        let bar_items = self.bar.lock().get_item_all()?;
        let view = self.get_tab(index)?;
        self.base.dom().with_mut(|doc| -> Result<()> {
            for (i, &entry) in bar_items.iter().enumerate() {
                doc.set_class(entry, item::SELECT_CLASS, i == index)?;
            }
            Ok(())
        })?;

        if let Some(view) = view {
            self.callbacks.notify(
                "select_tab",
                &self.base.args(CallbackDetail::View { view, index }),
            );
        }
        Ok(())
    }

    // =========================================================================
    // Tab-title configuration
    // =========================================================================

    /// Replace a view's `tab-config` attribute wholesale.
    pub fn cover_tab_config(
        &mut self,
        entry: impl Into<ItemRef>,
        config: Option<&[&str]>,
    ) -> Result<()> {
        let index = self.resolve_view_index(entry.into())?;
        let view = self
            .get_tab(index)?
            .ok_or_else(|| UiError::not_exist_view(index))?;
        let value = config.map(|tokens| tokens.join(" ")).unwrap_or_default();
        self.base
            .dom()
            .with_mut(|doc| doc.set_attr(view, TAB_CONFIG_ATTR, &value))?;
        self.render_bar()
    }

    /// Merge entries into (or remove keys from) a view's `tab-config`.
    pub fn set_tab_config(
        &mut self,
        entry: impl Into<ItemRef>,
        config: &[(&str, &str)],
        add: bool,
    ) -> Result<()> {
        let index = self.resolve_view_index(entry.into())?;
        let view = self
            .get_tab(index)?
            .ok_or_else(|| UiError::not_exist_view(index))?;

        let mut map = self.base.dom().with(|doc| -> Result<ConfigMap> {
            Ok(ConfigMap::parse(
                &doc.attr(view, TAB_CONFIG_ATTR)?.unwrap_or_default(),
            ))
        })?;
        for &(key, value) in config {
            if add {
                map.set(key, value);
            } else {
                map.unset(key);
            }
        }
        let serialized = map.to_config_string();
        self.base
            .dom()
            .with_mut(|doc| doc.set_attr(view, TAB_CONFIG_ATTR, &serialized))?;
        self.render_bar()
    }

    /// Reindex bar and content together.
    ///
    /// A count mismatch between bar items and content views means the
    /// derived projection broke — that is a fatal consistency error.
    pub fn sort_tab(&mut self) -> Result<()> {
        let bar_count = self.bar.lock().item_size()?;
        let view_count = self.content.lock().view_size()?;
        if bar_count != view_count {
            return Err(UiError::custom(
                "Tab and view asymmetry",
                format!("Tab size: {bar_count}, View size: {view_count}"),
            ));
        }
        self.bar.lock().sort_item()?;
        self.content.lock().sort_view()
    }
}

impl Controller for TabController {
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
        let Outcome::ItemPressed {
            container,
            index,
            origin,
            item,
        } = outcome
        else {
            return Vec::new();
        };
        if *container != self.bar_element {
            return Vec::new();
        }

        let dom = self.base.dom().clone();
        let disabled = dom.with(|doc| item::is_disabled(doc, *item));
        if disabled {
            return Vec::new();
        }

        let (on_delete_btn, delete_enabled) = dom
            .with(|doc| -> Result<(bool, bool)> {
                Ok((
                    doc.has_class(*origin, DELETE_BTN_CLASS)?,
                    doc.has_class(*origin, "enabled")?,
                ))
            })
            .unwrap_or((false, false));

        if on_delete_btn {
            // A press on a disabled close button selects nothing.
            if delete_enabled {
                let _ = self.remove_tab(*index);
            }
        } else {
            let _ = self.select_tab(*index);
        }
        Vec::new()
    }
}

/// Create a detached tab view: a `w-view` pane with a bar title.
pub fn create_tab_view(
    dom: &Dom,
    title: impl Into<String>,
    text: impl Into<String>,
) -> Result<ElementId> {
    let view = dom.create_element("div");
    dom.with_mut(|doc| {
        doc.set_attr(view, item::VIEW_ATTR, "")?;
        doc.set_attr(view, TAB_TITLE_ATTR, &title.into())?;
        doc.set_text(view, text)
    })?;
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{EventKind, InputEvent};

    /// Wire a tab composite by hand, the way `Ui::bind_tab` does.
    fn fixture() -> (Dom, TabController) {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let element = dom.create_element("div");
        dom.with_mut(|doc| doc.add_class(element, TAB_CLASS)).unwrap();
        dom.append_child(dom.root(), element).unwrap();

        let (bar_el, content_el, views) = TabController::prepare(&dom, element).unwrap();
        let bar = Arc::new(Mutex::new(
            ListController::new(dom.clone(), &registry, Some(bar_el)).unwrap(),
        ));
        let content = Arc::new(Mutex::new(
            StackedController::new(dom.clone(), &registry, Some(content_el)).unwrap(),
        ));
        let tab =
            TabController::new(dom.clone(), &registry, element, bar, content, views).unwrap();
        (dom, tab)
    }

    fn with_two_tabs() -> (Dom, TabController) {
        let (dom, mut tab) = fixture();
        let one = create_tab_view(&dom, "One", "first pane").unwrap();
        let two = create_tab_view(&dom, "Two", "second pane").unwrap();
        tab.add_tabs(vec![one, two]).unwrap();
        (dom, tab)
    }

    #[test]
    fn default_selection_is_view_zero() {
        let (_, tab) = with_two_tabs();
        assert_eq!(tab.tab_size().unwrap(), 2);
        let selected = tab.get_select_tab().unwrap().unwrap();
        assert_eq!(selected, tab.get_tab(0).unwrap().unwrap());
    }

    #[test]
    fn bar_mirrors_view_titles() {
        let (dom, tab) = with_two_tabs();
        let bar_items = tab.bar.lock().get_item_all().unwrap();
        assert_eq!(bar_items.len(), 2);
        let label = dom.with(|doc| {
            let spans = doc.children(bar_items[1]).unwrap();
            spans
                .iter()
                .find_map(|&c| {
                    if doc.has_class(c, "text").unwrap() {
                        doc.text(c).unwrap()
                    } else {
                        None
                    }
                })
                .unwrap()
        });
        assert_eq!(label, "Two");
    }

    #[test]
    fn remove_tab_leaves_one_auto_selected() {
        // Scenario: two tabs "One"/"Two"; removing tab 0 leaves exactly one
        // tab, auto-selected.
        let (_, mut tab) = with_two_tabs();
        tab.remove_tab(0usize).unwrap();

        assert_eq!(tab.tab_size().unwrap(), 1);
        assert_eq!(tab.bar.lock().item_size().unwrap(), 1);
        let selected = tab.get_select_tab().unwrap().unwrap();
        assert_eq!(selected, tab.get_tab(0).unwrap().unwrap());
    }

    #[test]
    fn select_tab_synchronizes_bar_and_content() {
        let (dom, mut tab) = with_two_tabs();
        tab.select_tab(1usize).unwrap();

        assert_eq!(
            tab.get_select_tab().unwrap().unwrap(),
            tab.get_tab(1).unwrap().unwrap()
        );
        let bar_items = tab.bar.lock().get_item_all().unwrap();
        dom.with(|doc| {
            assert!(!doc.has_class(bar_items[0], item::SELECT_CLASS).unwrap());
            assert!(doc.has_class(bar_items[1], item::SELECT_CLASS).unwrap());
        });
    }

    #[test]
    fn bar_press_routes_through_outcome_to_tab_selection() {
        let (_, mut tab) = with_two_tabs();
        // Simulate what the Ui does: dispatch to the bar list, then hand
        // outcomes to the ancestor tab controller.
        let bar_items = tab.bar.lock().get_item_all().unwrap();
        let outcomes = tab
            .bar
            .lock()
            .handle_event(&InputEvent::new(bar_items[1], EventKind::PointerDown));
        for outcome in &outcomes {
            tab.on_child_outcome(outcome);
        }

        assert_eq!(
            tab.get_select_tab().unwrap().unwrap(),
            tab.get_tab(1).unwrap().unwrap()
        );
    }

    #[test]
    fn delete_button_removes_only_when_enabled() {
        let (dom, mut tab) = with_two_tabs();

        // Without "delete" in tab-config, pressing the button does nothing.
        let bar_items = tab.bar.lock().get_item_all().unwrap();
        let delete_btn = dom.with(|doc| {
            doc.children(bar_items[0])
                .unwrap()
                .into_iter()
                .find(|&c| doc.has_class(c, DELETE_BTN_CLASS).unwrap())
                .unwrap()
        });
        let outcomes = tab
            .bar
            .lock()
            .handle_event(&InputEvent::new(delete_btn, EventKind::PointerDown));
        for outcome in &outcomes {
            tab.on_child_outcome(outcome);
        }
        assert_eq!(tab.tab_size().unwrap(), 2);

        // Enable deletion on tab 0 and press again.
        tab.set_tab_config(0usize, &[("delete", "")], true).unwrap();
        let bar_items = tab.bar.lock().get_item_all().unwrap();
        let delete_btn = dom.with(|doc| {
            doc.children(bar_items[0])
                .unwrap()
                .into_iter()
                .find(|&c| doc.has_class(c, DELETE_BTN_CLASS).unwrap())
                .unwrap()
        });
        let outcomes = tab
            .bar
            .lock()
            .handle_event(&InputEvent::new(delete_btn, EventKind::PointerDown));
        for outcome in &outcomes {
            tab.on_child_outcome(outcome);
        }
        assert_eq!(tab.tab_size().unwrap(), 1);
    }

    #[test]
    fn disabled_tab_config_disables_the_bar_item() {
        let (dom, mut tab) = with_two_tabs();
        tab.set_tab_config(1usize, &[("disabled", "")], true).unwrap();

        let bar_items = tab.bar.lock().get_item_all().unwrap();
        dom.with(|doc| assert!(item::is_disabled(doc, bar_items[1])));
    }

    #[test]
    fn sort_tab_detects_projection_breakage() {
        let (_, mut tab) = with_two_tabs();
        assert!(tab.sort_tab().is_ok());

        // Break the projection behind the composite's back.
        tab.bar.lock().add_item("rogue", true).unwrap();
        let err = tab.sort_tab().unwrap_err();
        assert!(matches!(err, UiError::Custom { .. }));
        assert!(err.to_string().contains("asymmetry"));
    }

    #[test]
    fn preselected_view_wins_default_selection() {
        let (dom, mut tab) = fixture();
        let one = create_tab_view(&dom, "One", "first").unwrap();
        let two = create_tab_view(&dom, "Two", "second").unwrap();
        dom.with_mut(|doc| doc.add_class(two, item::SELECT_CLASS)).unwrap();
        tab.add_tabs(vec![one, two]).unwrap();

        assert_eq!(
            tab.get_select_tab().unwrap().unwrap(),
            tab.get_tab(1).unwrap().unwrap()
        );
    }
}
