//! Sash: a divider redistributing size between its two adjacent panes.
//!
//! Geometry is attribute-level (`w-size` on the panes, `w-min-size` as the
//! lower bound); drags are programmatic displacements, clamped so neither
//! pane shrinks below its minimum.

use casement_core::{Result, UiError};

use crate::callback::{CallbackDetail, CallbackRegistry, CallbackTable, SlotKind};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase};
use crate::dom::{Dom, ElementId};

/// Role class for sashes.
pub const SASH_CLASS: &str = "w-sash";

/// Pane size attribute.
pub const SIZE_ATTR: &str = "w-size";
/// Pane minimum-size attribute.
pub const MIN_SIZE_ATTR: &str = "w-min-size";

const KIND: &str = "Sash";

const SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("moved", SlotKind::Notify),
];

/// Sash orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Panes side by side; the sash moves horizontally.
    #[default]
    Row,
    /// Panes stacked; the sash moves vertically.
    Column,
}

/// The sash controller.
pub struct SashController {
    base: ControllerBase,
    callbacks: CallbackTable,
    orientation: Orientation,
}

impl SashController {
    /// Bind to `element`, or create a fresh `w-sash` element when `None`.
    pub fn new(dom: Dom, registry: &CallbackRegistry, element: Option<ElementId>) -> Result<Self> {
        let element = match element {
            Some(element) => element,
            None => {
                let element = dom.create_element("div");
                dom.with_mut(|doc| doc.add_class(element, SASH_CLASS))?;
                element
            }
        };

        let base = ControllerBase::adopt(dom, element, KIND)?;
        let mut sash = Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
            orientation: Orientation::default(),
        };

        let config = sash
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut sash.callbacks)?;
        if config.get("direction") == Some("column") {
            sash.orientation = Orientation::Column;
        }
        Ok(sash)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// The sash orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The two adjacent panes (previous and next sibling).
    pub fn panes(&self) -> Result<(ElementId, ElementId)> {
        let element = self.base.element();
        self.base.dom().with(|doc| {
            let parent = doc
                .parent(element)?
                .ok_or_else(|| UiError::missing_vital_element("sash parent"))?;
            let siblings = doc.children(parent)?;
            let position = siblings
                .iter()
                .position(|&c| c == element)
                .ok_or_else(|| UiError::missing_vital_element("sash position"))?;
            if position == 0 || position + 1 >= siblings.len() {
                return Err(UiError::missing_vital_element("adjacent pane"));
            }
            Ok((siblings[position - 1], siblings[position + 1]))
        })
    }

    fn size(doc: &crate::dom::Document, pane: ElementId, attr: &str) -> i64 {
        doc.attr(pane, attr)
            .ok()
            .flatten()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Displace the sash by `delta` units: the previous pane grows by the
    /// applied displacement, the next pane shrinks by it. The displacement
    /// is clamped so neither pane passes its `w-min-size`. Returns the
    /// applied displacement.
    pub fn drag_to(&mut self, delta: i64) -> Result<i64> {
        let (prev, next) = self.panes()?;
        let applied = self.base.dom().with_mut(|doc| -> Result<i64> {
            let prev_size = Self::size(doc, prev, SIZE_ATTR);
            let next_size = Self::size(doc, next, SIZE_ATTR);
            let prev_min = Self::size(doc, prev, MIN_SIZE_ATTR);
            let next_min = Self::size(doc, next, MIN_SIZE_ATTR);

            let new_prev = (prev_size + delta)
                .max(prev_min)
                .min(prev_size + next_size - next_min);
            let applied = new_prev - prev_size;
            doc.set_attr(prev, SIZE_ATTR, &new_prev.to_string())?;
            doc.set_attr(next, SIZE_ATTR, &(next_size - applied).to_string())?;
            Ok(applied)
        })?;

        if applied != 0 {
            self.callbacks.notify(
                "moved",
                &self.base.args(CallbackDetail::Moved { offset: applied }),
            );
        }
        Ok(applied)
    }
}

impl Controller for SashController {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Dom, SashController, ElementId, ElementId) {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let holder = dom.create_element("div");
        let left = dom.create_element("div");
        let right = dom.create_element("div");
        let sash_el = dom.create_element("div");
        dom.append_child(dom.root(), holder).unwrap();
        dom.append_child(holder, left).unwrap();
        dom.append_child(holder, sash_el).unwrap();
        dom.append_child(holder, right).unwrap();
        dom.with_mut(|doc| {
            doc.set_attr(left, SIZE_ATTR, "200")?;
            doc.set_attr(right, SIZE_ATTR, "200")?;
            doc.set_attr(left, MIN_SIZE_ATTR, "50")?;
            doc.set_attr(right, MIN_SIZE_ATTR, "50")
        })
        .unwrap();

        let sash = SashController::new(dom.clone(), &registry, Some(sash_el)).unwrap();
        (dom, sash, left, right)
    }

    fn sizes(dom: &Dom, left: ElementId, right: ElementId) -> (i64, i64) {
        dom.with(|doc| {
            (
                doc.attr(left, SIZE_ATTR).unwrap().unwrap().parse().unwrap(),
                doc.attr(right, SIZE_ATTR).unwrap().unwrap().parse().unwrap(),
            )
        })
    }

    #[test]
    fn drag_transfers_size_between_panes() {
        let (dom, mut sash, left, right) = fixture();
        let applied = sash.drag_to(60).unwrap();
        assert_eq!(applied, 60);
        assert_eq!(sizes(&dom, left, right), (260, 140));
    }

    #[test]
    fn drag_clamps_at_minimums() {
        let (dom, mut sash, left, right) = fixture();
        let applied = sash.drag_to(500).unwrap();
        assert_eq!(applied, 150); // right pane stops at its 50 minimum
        assert_eq!(sizes(&dom, left, right), (350, 50));

        let applied = sash.drag_to(-1000).unwrap();
        assert_eq!(sizes(&dom, left, right), (50, 350));
        assert_eq!(applied, -300);
    }

    #[test]
    fn sash_without_neighbors_is_a_structural_error() {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let lonely = dom.create_element("div");
        dom.append_child(dom.root(), lonely).unwrap();
        let mut sash = SashController::new(dom, &registry, Some(lonely)).unwrap();
        assert!(matches!(
            sash.drag_to(10).unwrap_err(),
            UiError::MissingVitalElement { .. }
        ));
    }
}
