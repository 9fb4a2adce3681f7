//! Stacked view container: full content panes, one visible at a time.

use casement_core::{Result, UiError};

use crate::callback::{CallbackDetail, CallbackRegistry, CallbackTable, SlotKind, SwapOp};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase, Outcome};
use crate::dom::{Dom, ElementId};
use crate::widgets::item;

use super::item::{EntryRole, ItemRef};

/// Role class for stacked containers.
pub const STACKED_CLASS: &str = "w-stacked";

const KIND: &str = "Stacked";

const SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("add_view", SlotKind::Notify),
    ("remove_view", SlotKind::Notify),
    ("select_view", SlotKind::Notify),
    ("swap_view", SlotKind::Gate),
];

/// The hierarchical sibling of [`ListController`](super::ListController):
/// manages `w-view` panes where at most one is selected at a time.
pub struct StackedController {
    base: ControllerBase,
    callbacks: CallbackTable,
}

impl StackedController {
    /// Bind to `element`, or create a fresh `w-stacked` element when `None`.
    pub fn new(dom: Dom, registry: &CallbackRegistry, element: Option<ElementId>) -> Result<Self> {
        let element = match element {
            Some(element) => element,
            None => {
                let element = dom.create_element("div");
                dom.with_mut(|doc| doc.add_class(element, STACKED_CLASS))?;
                element
            }
        };

        let base = ControllerBase::adopt(dom, element, KIND)?;
        let mut stacked = Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
        };

        let config = stacked
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut stacked.callbacks)?;
        stacked.sort_view()?;
        Ok(stacked)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// Reassign dense view indices in document order.
    pub fn sort_view(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| item::sort(doc, element, item::VIEW_ATTR))
    }

    /// Number of views.
    pub fn view_size(&self) -> Result<usize> {
        Ok(self.get_view_all()?.len())
    }

    /// View at `index`, if present.
    pub fn get_view(&self, index: usize) -> Result<Option<ElementId>> {
        Ok(self.get_view_all()?.get(index).copied())
    }

    /// All views in document order.
    pub fn get_view_all(&self) -> Result<Vec<ElementId>> {
        let element = self.base.element();
        self.base
            .dom()
            .with(|doc| item::entries(doc, element, item::VIEW_ATTR))
    }

    /// The selected view, if any.
    pub fn get_select_view(&self) -> Result<Option<ElementId>> {
        let element = self.base.element();
        self.base.dom().with(|doc| {
            for view in item::entries(doc, element, item::VIEW_ATTR)? {
                if doc.has_class(view, item::SELECT_CLASS)? {
                    return Ok(Some(view));
                }
            }
            Ok(None)
        })
    }

    /// Append a view. The element must carry the `w-view` attribute.
    pub fn add_view(&mut self, view: ElementId, sort: bool) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| -> Result<()> {
            if !doc.exists(view) || !doc.element(view)?.has_attr(item::VIEW_ATTR) {
                return Err(UiError::parameter_mismatch(format!("{view:?}")));
            }
            doc.append_child(element, view)?;
            if sort {
                item::sort(doc, element, item::VIEW_ATTR)?;
            }
            Ok(())
        })?;

        let index = self.view_size()?.saturating_sub(1);
        self.callbacks.notify(
            "add_view",
            &self.base.args(CallbackDetail::View { view, index }),
        );
        Ok(())
    }

    /// Append several views; failure is annotated with the batch index and
    /// earlier views stay applied.
    pub fn add_views(&mut self, views: Vec<ElementId>, sort: bool) -> Result<()> {
        for (index, view) in views.into_iter().enumerate() {
            self.add_view(view, false).map_err(|err| err.at_index(index))?;
        }
        if sort {
            self.sort_view()?;
        }
        Ok(())
    }

    /// Remove a view by index or handle.
    pub fn remove_view(&mut self, entry: impl Into<ItemRef>, sort: bool) -> Result<()> {
        let element = self.base.element();
        let (removed, index) = self.base.dom().with_mut(|doc| -> Result<_> {
            let view = item::resolve(doc, element, item::VIEW_ATTR, EntryRole::View, entry.into())?;
            let index = item::recorded_index(doc, view).unwrap_or(0);
            doc.remove(view)?;
            if sort {
                item::sort(doc, element, item::VIEW_ATTR)?;
            }
            Ok((view, index))
        })?;

        self.callbacks.notify(
            "remove_view",
            &self.base.args(CallbackDetail::View {
                view: removed,
                index,
            }),
        );
        Ok(())
    }

    /// Select a view exclusively; every other view is deselected.
    pub fn select_view(&mut self, entry: impl Into<ItemRef>) -> Result<Vec<Outcome>> {
        let element = self.base.element();
        let (view, index) = self.base.dom().with_mut(|doc| -> Result<_> {
            let view = item::resolve(doc, element, item::VIEW_ATTR, EntryRole::View, entry.into())?;
            item::clear_selected(doc, element, item::VIEW_ATTR)?;
            doc.add_class(view, item::SELECT_CLASS)?;
            let index = item::entries(doc, element, item::VIEW_ATTR)?
                .iter()
                .position(|&v| v == view)
                .unwrap_or(0);
            Ok((view, index))
        })?;

        self.callbacks.notify(
            "select_view",
            &self.base.args(CallbackDetail::View { view, index }),
        );
        Ok(vec![Outcome::ViewSelected {
            container: element,
            view,
            index,
        }])
    }

    fn gated_reorder(&mut self, op: SwapOp, entry: ItemRef, target: ItemRef) -> Result<bool> {
        let element = self.base.element();
        let (v1, v2) = self.base.dom().with(|doc| -> Result<_> {
            Ok((
                item::resolve(doc, element, item::VIEW_ATTR, EntryRole::View, entry)?,
                item::resolve(doc, element, item::VIEW_ATTR, EntryRole::View, target)?,
            ))
        })?;

        let verdict = self.callbacks.gate(
            "swap_view",
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
            item::sort(doc, element, item::VIEW_ATTR)
        })?;
        Ok(true)
    }

    /// Move `entry` in front of `target`, subject to the swap gate.
    pub fn swap_view(&mut self, entry: impl Into<ItemRef>, target: impl Into<ItemRef>) -> Result<bool> {
        self.gated_reorder(SwapOp::Swap, entry.into(), target.into())
    }

    /// Move `entry` after `target`, subject to the swap gate.
    pub fn insert_view(&mut self, entry: impl Into<ItemRef>, target: impl Into<ItemRef>) -> Result<bool> {
        self.gated_reorder(SwapOp::Insert, entry.into(), target.into())
    }

    /// Move `entry` before `target`, subject to the swap gate.
    pub fn insert_before_view(
        &mut self,
        entry: impl Into<ItemRef>,
        target: impl Into<ItemRef>,
    ) -> Result<bool> {
        self.gated_reorder(SwapOp::InsertBefore, entry.into(), target.into())
    }
}

impl Controller for StackedController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    fn callbacks_mut(&mut self) -> &mut CallbackTable {
        &mut self.callbacks
    }
}

/// Create a detached `w-view` pane with text content.
pub fn create_view(dom: &Dom, text: impl Into<String>) -> Result<ElementId> {
    let view = dom.create_element("div");
    dom.with_mut(|doc| {
        doc.set_attr(view, item::VIEW_ATTR, "")?;
        doc.set_text(view, text)
    })?;
    Ok(view)
}
