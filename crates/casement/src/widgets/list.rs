//! The linear collection engine.
//!
//! [`ListController`] manages ordered `w-item` entries directly on its
//! bound element: selection (single or multiple), reorder with veto gates,
//! filtration, preselection and dense reindexing. Composite widgets (tabs,
//! select, paging) build on this engine rather than reimplementing item
//! handling.
//!
//! # Example
//!
//! ```
//! use casement::dom::Dom;
//! use casement::callback::CallbackRegistry;
//! use casement::widgets::ListController;
//!
//! let dom = Dom::new();
//! let registry = CallbackRegistry::new();
//! let mut list = ListController::new(dom.clone(), &registry, None).unwrap();
//! dom.append_child(dom.root(), list.element()).unwrap();
//!
//! list.add_items(vec!["a".into(), "b".into(), "c".into()], true).unwrap();
//! assert_eq!(list.item_size().unwrap(), 3);
//! ```

use casement_core::{Result, UiError};

use crate::callback::{CallbackDetail, CallbackTable, SlotKind, SwapOp};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase, Outcome};
use crate::dom::{Dom, ElementId, EventKind, InputEvent};
use crate::{callback::CallbackRegistry, widgets::item};

use super::item::{EntryRole, ItemContent, ItemRef};

/// Role class for list containers.
pub const LIST_CLASS: &str = "w-list";

/// Which native event commits a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMode {
    /// Select on pointer-down (the default).
    #[default]
    PointerDown,
    /// Select on completed click.
    Click,
}

impl TriggerMode {
    fn matches(self, kind: &EventKind) -> bool {
        matches!(
            (self, kind),
            (Self::PointerDown, EventKind::PointerDown) | (Self::Click, EventKind::Click)
        )
    }

    fn event_kind(self) -> EventKind {
        match self {
            Self::PointerDown => EventKind::PointerDown,
            Self::Click => EventKind::Click,
        }
    }
}

/// Layout direction used by the reverse/direction classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Column,
    Row,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            Self::Column => "column",
            Self::Row => "row",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "column" => Ok(Self::Column),
            "row" => Ok(Self::Row),
            other => Err(UiError::parameter_mismatch(other)),
        }
    }
}

const KIND: &str = "List";

const SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("add_item", SlotKind::Notify),
    ("remove_item", SlotKind::Notify),
    ("select_item", SlotKind::Gate),
    ("context_menu", SlotKind::Notify),
    ("swap_item", SlotKind::Gate),
];

/// The linear collection container.
pub struct ListController {
    base: ControllerBase,
    callbacks: CallbackTable,
    trigger: TriggerMode,
    multiple: bool,
    series_trigger: bool,
}

impl std::fmt::Debug for ListController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListController")
            .field("element", &self.base.element())
            .field("trigger", &self.trigger)
            .field("multiple", &self.multiple)
            .field("series_trigger", &self.series_trigger)
            .finish()
    }
}

impl ListController {
    /// Bind to `element`, or create a fresh `w-list` element when `None`.
    ///
    /// Parses and erases the element's `w-config` attribute, wiring any
    /// declared callbacks through `registry`.
    pub fn new(dom: Dom, registry: &CallbackRegistry, element: Option<ElementId>) -> Result<Self> {
        let element = match element {
            Some(element) => element,
            None => {
                let element = dom.create_element("div");
                dom.with_mut(|doc| doc.add_class(element, LIST_CLASS))?;
                element
            }
        };

        let base = ControllerBase::adopt(dom, element, KIND)?;
        let mut list = Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
            trigger: TriggerMode::default(),
            multiple: false,
            series_trigger: false,
        };
        list.init(registry)?;
        Ok(list)
    }

    fn init(&mut self, registry: &CallbackRegistry) -> Result<()> {
        let element = self.base.element();
        let config = self
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut self.callbacks)?;
        self.apply_config(&config)?;
        self.sort_item()?;
        Ok(())
    }

    fn apply_config(&mut self, config: &ConfigMap) -> Result<()> {
        if config.has("reverse") {
            self.set_reverse(true, SortOrder::Column)?;
        }
        if let Some(value) = config.get("sortDirection") {
            self.set_sort_direction(SortOrder::parse(value)?)?;
        }
        if config.has("multiple") {
            self.set_multiple(true);
        }
        if config.has("seriesTrigger") {
            self.set_series_trigger(true);
        }
        if let Some(value) = config.get("trigger") {
            self.trigger = match value {
                "pointerdown" => TriggerMode::PointerDown,
                "click" => TriggerMode::Click,
                other => return Err(UiError::parameter_mismatch(other)),
            };
        }
        Ok(())
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    // =========================================================================
    // Modes
    // =========================================================================

    /// Toggle the reverse-order class for the given direction.
    pub fn set_reverse(&mut self, on: bool, order: SortOrder) -> Result<()> {
        let class = format!("w-{}-reverse", order.as_str());
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| doc.set_class(element, &class, on))
    }

    /// Set the layout direction class (column or row), clearing the other.
    pub fn set_sort_direction(&mut self, order: SortOrder) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            doc.remove_class(element, "w-column-direction")?;
            doc.remove_class(element, "w-row-direction")?;
            doc.add_class(element, &format!("w-{}-direction", order.as_str()))
        })
    }

    /// Switch between exclusive selection and independent per-item toggling.
    pub fn set_multiple(&mut self, multiple: bool) {
        self.multiple = multiple;
    }

    /// Whether multiple-selection mode is active.
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    /// Whether re-selecting the already-selected item re-fires selection.
    pub fn set_series_trigger(&mut self, on: bool) {
        self.series_trigger = on;
    }

    /// Set which native event commits a selection. Programmatic
    /// [`select_item`](Self::select_item) synthesizes this same event so
    /// both paths share one code path.
    pub fn set_select_trigger_mode(&mut self, mode: TriggerMode) {
        self.trigger = mode;
    }

    // =========================================================================
    // Item management
    // =========================================================================

    /// Reassign dense indices (0..n-1) in document order.
    pub fn sort_item(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| item::sort(doc, element, item::ITEM_ATTR))
    }

    /// Number of items.
    pub fn item_size(&self) -> Result<usize> {
        Ok(self.get_item_all()?.len())
    }

    /// Item at `index`, if present.
    pub fn get_item(&self, index: usize) -> Result<Option<ElementId>> {
        Ok(self.get_item_all()?.get(index).copied())
    }

    /// All items in document order.
    pub fn get_item_all(&self) -> Result<Vec<ElementId>> {
        let element = self.base.element();
        self.base
            .dom()
            .with(|doc| item::entries(doc, element, item::ITEM_ATTR))
    }

    /// The first selected item, if any.
    pub fn get_select_item(&self) -> Result<Option<ElementId>> {
        let element = self.base.element();
        self.base.dom().with(|doc| {
            let entries = item::entries(doc, element, item::ITEM_ATTR)?;
            for entry in entries {
                if doc.has_class(entry, item::SELECT_CLASS)? {
                    return Ok(Some(entry));
                }
            }
            Ok(None)
        })
    }

    /// All selected items (meaningful in multiple mode).
    pub fn get_select_item_all(&self) -> Result<Vec<ElementId>> {
        let element = self.base.element();
        self.base.dom().with(|doc| {
            let mut out = Vec::new();
            for entry in item::entries(doc, element, item::ITEM_ATTR)? {
                if doc.has_class(entry, item::SELECT_CLASS)? {
                    out.push(entry);
                }
            }
            Ok(out)
        })
    }

    /// All disabled items.
    pub fn get_disabled_item(&self) -> Result<Vec<ElementId>> {
        let element = self.base.element();
        self.base.dom().with(|doc| {
            let mut out = Vec::new();
            for entry in item::entries(doc, element, item::ITEM_ATTR)? {
                if item::is_disabled(doc, entry) {
                    out.push(entry);
                }
            }
            Ok(out)
        })
    }

    /// Strip the selection marker from every item.
    pub fn clear_select_item(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| item::clear_selected(doc, element, item::ITEM_ATTR))
    }

    /// Append an item. Text content is wrapped into a fresh `w-item`
    /// element; a pre-built element must already carry `w-item`.
    pub fn add_item(&mut self, content: impl Into<ItemContent>, sort: bool) -> Result<ElementId> {
        let content = content.into();
        let element = self.base.element();
        let added = self.base.dom().with_mut(|doc| -> Result<ElementId> {
            let entry = match content {
                ItemContent::Text(text) => {
                    let entry = doc.create_element("div");
                    doc.set_attr(entry, item::ITEM_ATTR, "")?;
                    doc.set_text(entry, text)?;
                    entry
                }
                ItemContent::Element(entry) => {
                    if !doc.exists(entry) || !doc.element(entry)?.has_attr(item::ITEM_ATTR) {
                        return Err(UiError::parameter_mismatch(format!("{entry:?}")));
                    }
                    entry
                }
            };
            doc.append_child(element, entry)?;
            if sort {
                item::sort(doc, element, item::ITEM_ATTR)?;
            }
            Ok(entry)
        })?;

        let index = self.item_size()?.saturating_sub(1);
        self.callbacks.notify(
            "add_item",
            &self.base.args(CallbackDetail::Item { item: added, index }),
        );
        Ok(added)
    }

    /// Append a deep copy of an existing item element.
    pub fn add_item_cloned(&mut self, source: ElementId, sort: bool) -> Result<ElementId> {
        let copy = self.base.dom().with_mut(|doc| -> Result<ElementId> {
            if !doc.exists(source) || !doc.element(source)?.has_attr(item::ITEM_ATTR) {
                return Err(UiError::parameter_mismatch(format!("{source:?}")));
            }
            doc.clone_subtree(source)
        })?;
        self.add_item(ItemContent::Element(copy), sort)
    }

    /// Append several items.
    ///
    /// A failing entry aborts the batch at that point; the error is
    /// annotated with the failing index and earlier entries stay applied.
    pub fn add_items(&mut self, items: Vec<ItemContent>, sort: bool) -> Result<()> {
        for (index, content) in items.into_iter().enumerate() {
            self.add_item(content, false)
                .map_err(|err| err.at_index(index))?;
        }
        if sort {
            self.sort_item()?;
        }
        Ok(())
    }

    /// Remove an item by index or handle.
    pub fn remove_item(&mut self, entry: impl Into<ItemRef>, sort: bool) -> Result<()> {
        let element = self.base.element();
        let (removed, index) = self.base.dom().with_mut(|doc| -> Result<_> {
            let target = item::resolve(doc, element, item::ITEM_ATTR, EntryRole::Item, entry.into())?;
            let index = item::recorded_index(doc, target).unwrap_or(0);
            doc.remove(target)?;
            if sort {
                item::sort(doc, element, item::ITEM_ATTR)?;
            }
            Ok((target, index))
        })?;

        self.callbacks.notify(
            "remove_item",
            &self.base.args(CallbackDetail::Item {
                item: removed,
                index,
            }),
        );
        Ok(())
    }

    /// Remove every item.
    pub fn remove_item_all(&mut self) -> Result<()> {
        for entry in self.get_item_all()? {
            self.remove_item(entry, false)?;
        }
        Ok(())
    }

    /// Replace an item's content with text or a child element.
    pub fn set_item_content(
        &mut self,
        entry: impl Into<ItemRef>,
        content: impl Into<ItemContent>,
    ) -> Result<()> {
        let element = self.base.element();
        let content = content.into();
        self.base.dom().with_mut(|doc| {
            let target = item::resolve(doc, element, item::ITEM_ATTR, EntryRole::Item, entry.into())?;
            for child in doc.children(target)? {
                doc.remove(child)?;
            }
            match content {
                ItemContent::Text(text) => doc.set_text(target, text),
                ItemContent::Element(child) => {
                    doc.set_text(target, "")?;
                    doc.append_child(target, child)
                }
            }
        })
    }

    /// Set or clear the `disabled` attribute on an item.
    pub fn set_disabled_item(&mut self, entry: impl Into<ItemRef>, disabled: bool) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            let target = item::resolve(doc, element, item::ITEM_ATTR, EntryRole::Item, entry.into())?;
            if disabled {
                doc.set_attr(target, item::DISABLED_ATTR, "")
            } else {
                doc.remove_attr(target, item::DISABLED_ATTR).map(|_| ())
            }
        })
    }

    /// Set or clear the draggable flag on an item.
    pub fn set_item_draggable(&mut self, entry: impl Into<ItemRef>, draggable: bool) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            let target = item::resolve(doc, element, item::ITEM_ATTR, EntryRole::Item, entry.into())?;
            if draggable {
                doc.set_attr(target, "draggable", "true")
            } else {
                doc.remove_attr(target, "draggable").map(|_| ())
            }
        })
    }

    /// Set or clear the fixed (not reorderable) class on an item.
    pub fn set_item_fixed(&mut self, entry: impl Into<ItemRef>, fixed: bool) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            let target = item::resolve(doc, element, item::ITEM_ATTR, EntryRole::Item, entry.into())?;
            doc.set_class(target, item::FIXED_CLASS, fixed)
        })
    }

    // =========================================================================
    // Reordering (veto-gated)
    // =========================================================================

    fn gated_reorder(
        &mut self,
        op: SwapOp,
        entry: ItemRef,
        target: ItemRef,
    ) -> Result<bool> {
        let element = self.base.element();
        let (v1, v2) = self.base.dom().with(|doc| -> Result<_> {
            Ok((
                item::resolve(doc, element, item::ITEM_ATTR, EntryRole::Item, entry)?,
                item::resolve(doc, element, item::ITEM_ATTR, EntryRole::Item, target)?,
            ))
        })?;

        let verdict = self.callbacks.gate(
            "swap_item",
            &self.base.args(CallbackDetail::Swap {
                op,
                item: v1,
                target: v2,
            }),
        );
        if !verdict {
            return Ok(false);
        }

        self.base.dom().with_mut(|doc| -> Result<()> {
            match op {
                SwapOp::Swap | SwapOp::InsertBefore => doc.insert_before(v1, v2)?,
                SwapOp::Insert => doc.insert_after(v1, v2)?,
            }
            item::sort(doc, element, item::ITEM_ATTR)
        })?;
        Ok(true)
    }

    /// Move `entry` in front of `target`. Returns whether the gate allowed
    /// it; a veto leaves the order untouched.
    pub fn swap_item(
        &mut self,
        entry: impl Into<ItemRef>,
        target: impl Into<ItemRef>,
    ) -> Result<bool> {
        self.gated_reorder(SwapOp::Swap, entry.into(), target.into())
    }

    /// Move `entry` immediately after `target`, subject to the swap gate.
    pub fn insert_item(
        &mut self,
        entry: impl Into<ItemRef>,
        target: impl Into<ItemRef>,
    ) -> Result<bool> {
        self.gated_reorder(SwapOp::Insert, entry.into(), target.into())
    }

    /// Move `entry` immediately before `target`, subject to the swap gate.
    pub fn insert_before_item(
        &mut self,
        entry: impl Into<ItemRef>,
        target: impl Into<ItemRef>,
    ) -> Result<bool> {
        self.gated_reorder(SwapOp::InsertBefore, entry.into(), target.into())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select an item programmatically.
    ///
    /// Synthesizes the configured trigger event on the item so programmatic
    /// and pointer selection funnel through the same path (gating, series
    /// handling and outcome emission included).
    pub fn select_item(&mut self, entry: impl Into<ItemRef>) -> Result<Vec<Outcome>> {
        let element = self.base.element();
        let target = self.base.dom().with(|doc| {
            item::resolve(doc, element, item::ITEM_ATTR, EntryRole::Item, entry.into())
        })?;
        let event = InputEvent::new(target, self.trigger.event_kind());
        Ok(self.handle_event(&event))
    }

    fn press(&mut self, target: ElementId) -> Vec<Outcome> {
        let element = self.base.element();
        let dom = self.base.dom().clone();

        let Some(entry) = dom.with(|doc| item::find_entry(doc, element, item::ITEM_ATTR, target))
        else {
            return Vec::new();
        };
        if dom.with(|doc| item::is_disabled(doc, entry)) {
            return Vec::new();
        }

        let index = dom
            .with(|doc| item::entries(doc, element, item::ITEM_ATTR))
            .ok()
            .and_then(|entries| entries.iter().position(|&e| e == entry))
            .unwrap_or(0);

        let mut outcomes = vec![Outcome::ItemPressed {
            container: element,
            item: entry,
            index,
            origin: target,
        }];

        let already = dom
            .with(|doc| doc.has_class(entry, item::SELECT_CLASS))
            .unwrap_or(false);
        if already && !self.multiple && !self.series_trigger {
            return outcomes;
        }

        let allowed = self.callbacks.gate(
            "select_item",
            &self.base.args(CallbackDetail::Select {
                item: entry,
                origin: target,
            }),
        );
        if !allowed {
            return outcomes;
        }

        let applied = if self.multiple {
            // Independent toggling: membership in the selected set flips.
            let result = dom.with_mut(|doc| -> Result<bool> {
                if already {
                    doc.remove_class(entry, item::SELECT_CLASS)?;
                    Ok(false)
                } else {
                    item::select(doc, entry)
                }
            });
            result.unwrap_or(false)
        } else {
            let result = dom.with_mut(|doc| -> Result<bool> {
                item::clear_selected(doc, element, item::ITEM_ATTR)?;
                item::select(doc, entry)
            });
            result.unwrap_or(false)
        };

        if applied {
            outcomes.push(Outcome::ItemSelected {
                container: element,
                item: entry,
                index,
            });
        }
        outcomes
    }

    // =========================================================================
    // Preselection
    // =========================================================================

    /// Highlight an item as the selection candidate without committing.
    pub fn preselect_item(&mut self, entry: impl Into<ItemRef>) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            let target = item::resolve(doc, element, item::ITEM_ATTR, EntryRole::Item, entry.into())?;
            for other in item::entries(doc, element, item::ITEM_ATTR)? {
                doc.remove_class(other, item::PRESELECT_CLASS)?;
            }
            if !item::is_disabled(doc, target) {
                doc.add_class(target, item::PRESELECT_CLASS)?;
            }
            Ok(())
        })
    }

    /// The current preselection candidate, if any.
    pub fn get_preselect_item(&self) -> Result<Option<ElementId>> {
        let element = self.base.element();
        self.base.dom().with(|doc| {
            for entry in item::entries(doc, element, item::ITEM_ATTR)? {
                if doc.has_class(entry, item::PRESELECT_CLASS)? {
                    return Ok(Some(entry));
                }
            }
            Ok(None)
        })
    }

    /// Commit the preselection candidate as the real selection.
    pub fn definite_preselection(&mut self) -> Result<Vec<Outcome>> {
        let Some(candidate) = self.get_preselect_item()? else {
            return Ok(Vec::new());
        };
        self.remove_preselection()?;
        self.select_item(candidate)
    }

    /// Abandon the preselection candidate.
    pub fn remove_preselection(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            for entry in item::entries(doc, element, item::ITEM_ATTR)? {
                doc.remove_class(entry, item::PRESELECT_CLASS)?;
            }
            Ok(())
        })
    }

    // =========================================================================
    // Filtration
    // =========================================================================

    /// Hide items whose text the predicate rejects.
    ///
    /// The predicate sees each item's deep text content (its own text plus
    /// descendants, including any marked `w-filter-text`). Items are only
    /// hidden with the `filtered` class, never removed.
    pub fn filtration(&mut self, predicate: impl Fn(&str) -> bool) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            for entry in item::entries(doc, element, item::ITEM_ATTR)? {
                let text = doc.deep_text(entry)?;
                doc.set_class(entry, item::FILTERED_CLASS, !predicate(&text))?;
            }
            Ok(())
        })
    }

    /// Drop all filtration hiding.
    pub fn clear_filtration(&mut self) -> Result<()> {
        self.filtration(|_| true)
    }
}

impl Controller for ListController {
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
        match &event.kind {
            EventKind::PointerDown | EventKind::Click => {
                if self.trigger.matches(&event.kind) {
                    self.press(event.target)
                } else {
                    Vec::new()
                }
            }
            EventKind::ContextMenu => {
                let element = self.base.element();
                let dom = self.base.dom();
                let entry =
                    dom.with(|doc| item::find_entry(doc, element, item::ITEM_ATTR, event.target));
                if let Some(entry) = entry
                    && !dom.with(|doc| item::is_disabled(doc, entry))
                {
                    self.callbacks.notify(
                        "context_menu",
                        &self.base.args(CallbackDetail::Context {
                            item: entry,
                            origin: event.target,
                            event: event.clone(),
                        }),
                    );
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }
}
