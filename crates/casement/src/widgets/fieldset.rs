//! Legend-bearing group container.

use casement_core::{Result, UiError};

use crate::callback::{CallbackRegistry, CallbackTable, SlotKind};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase};
use crate::dom::{Dom, ElementId};

/// Role class for fieldsets.
pub const FIELDSET_CLASS: &str = "w-fieldset";

/// Attribute the legend text is read from.
pub const LEGEND_ATTR: &str = "legend";

const KIND: &str = "Fieldset";

const SLOTS: &[(&str, SlotKind)] = &[("delete", SlotKind::Notify)];

/// A group box whose first child is a legend element.
///
/// The legend text comes from the bound element's `legend` attribute;
/// binding an element without one is a structural error.
pub struct FieldsetController {
    base: ControllerBase,
    callbacks: CallbackTable,
    legend: ElementId,
}

impl std::fmt::Debug for FieldsetController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldsetController")
            .field("element", &self.base.element())
            .field("legend", &self.legend)
            .finish()
    }
}

impl FieldsetController {
    /// Bind to `element`, or create a fresh `w-fieldset` when `None`
    /// (then `legend` must be provided through the attribute beforehand or
    /// the bind fails).
    pub fn new(dom: Dom, registry: &CallbackRegistry, element: Option<ElementId>) -> Result<Self> {
        let element = match element {
            Some(element) => element,
            None => {
                let element = dom.create_element("fieldset");
                dom.with_mut(|doc| doc.add_class(element, FIELDSET_CLASS))?;
                element
            }
        };

        let base = ControllerBase::adopt(dom, element, KIND)?;
        let legend = base.dom().with_mut(|doc| -> Result<ElementId> {
            // Reuse an existing legend child, else create one, and make
            // sure it sits first.
            let existing = doc
                .children(element)?
                .into_iter()
                .find(|&child| doc.element(child).is_ok_and(|e| e.tag() == "legend"));
            let legend = match existing {
                Some(legend) => legend,
                None => {
                    let legend = doc.create_element("legend");
                    doc.add_class(legend, "legend")?;
                    legend
                }
            };
            match doc.children(element)?.first().copied() {
                Some(first) if first != legend => doc.insert_before(legend, first)?,
                Some(_) => {}
                None => doc.append_child(element, legend)?,
            }

            let text = doc.attr(element, LEGEND_ATTR)?.unwrap_or_default();
            if text.is_empty() {
                return Err(UiError::missing_vital_element("legend text"));
            }
            doc.set_text(legend, text)?;
            Ok(legend)
        })?;

        let mut fieldset = Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
            legend,
        };
        let config = fieldset
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut fieldset.callbacks)?;
        Ok(fieldset)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// The legend element.
    pub fn legend_element(&self) -> ElementId {
        self.legend
    }

    /// Replace the legend text.
    pub fn set_legend_text(&mut self, text: impl Into<String>) -> Result<()> {
        let legend = self.legend;
        self.base
            .dom()
            .with_mut(|doc| doc.set_text(legend, text.into()))
    }
}

impl Controller for FieldsetController {
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

    #[test]
    fn missing_legend_text_is_a_structural_error() {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let element = dom.create_element("fieldset");
        dom.append_child(dom.root(), element).unwrap();

        let err = FieldsetController::new(dom, &registry, Some(element)).unwrap_err();
        assert!(matches!(err, UiError::MissingVitalElement { .. }));
        assert!(err.to_string().contains("legend text"));
    }

    #[test]
    fn legend_is_created_first_with_attribute_text() {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let element = dom.create_element("fieldset");
        let body = dom.create_text_element("div", "content");
        dom.append_child(dom.root(), element).unwrap();
        dom.append_child(element, body).unwrap();
        dom.with_mut(|doc| doc.set_attr(element, LEGEND_ATTR, "Settings")).unwrap();

        let fieldset = FieldsetController::new(dom.clone(), &registry, Some(element)).unwrap();
        dom.with(|doc| {
            let children = doc.children(element).unwrap();
            assert_eq!(children[0], fieldset.legend_element());
            assert_eq!(doc.text(children[0]).unwrap().unwrap(), "Settings");
        });
    }

    #[test]
    fn set_legend_text_replaces() {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let element = dom.create_element("fieldset");
        dom.append_child(dom.root(), element).unwrap();
        dom.with_mut(|doc| doc.set_attr(element, LEGEND_ATTR, "Old")).unwrap();

        let mut fieldset = FieldsetController::new(dom.clone(), &registry, Some(element)).unwrap();
        fieldset.set_legend_text("New").unwrap();
        dom.with(|doc| {
            assert_eq!(
                doc.text(fieldset.legend_element()).unwrap().unwrap(),
                "New"
            );
        });
    }
}
