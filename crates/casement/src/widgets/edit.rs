//! Editable field with debounced change notification.
//!
//! Raw `Input` events fire the `input` slot immediately; the `value_change`
//! slot is coalesced through a trailing-edge debouncer (an 80 ms window)
//! so only the last edit in a burst is reported. Clipboard events are
//! forwarded verbatim.

use std::time::Duration;

use casement_core::{Debouncer, Result, UiError};

use crate::callback::{CallbackDetail, CallbackRegistry, CallbackTable, SlotKind};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase, Outcome};
use crate::dom::{Dom, ElementId, EventKind, InputEvent};

/// Role class for edit fields.
pub const EDIT_CLASS: &str = "w-edit";

/// The value-change coalescing window.
pub const VALUE_CHANGE_DEBOUNCE: Duration = Duration::from_millis(80);

const VALUE_ATTR: &str = "value";
const READONLY_ATTR: &str = "readonly";
const MAXLENGTH_ATTR: &str = "maxlength";
const DISABLED_ATTR: &str = "disabled";

const KIND: &str = "Edit";

const SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("input", SlotKind::Notify),
    ("value_change", SlotKind::Notify),
    ("copy", SlotKind::Notify),
    ("paste", SlotKind::Notify),
    ("cut", SlotKind::Notify),
];

/// The editable-field controller.
pub struct EditController {
    base: ControllerBase,
    callbacks: CallbackTable,
    debounce: Debouncer<String>,
}

impl EditController {
    /// Bind to `element`, or create a fresh `w-edit` input when `None`.
    pub fn new(dom: Dom, registry: &CallbackRegistry, element: Option<ElementId>) -> Result<Self> {
        let element = match element {
            Some(element) => element,
            None => {
                let element = dom.create_element("input");
                dom.with_mut(|doc| doc.add_class(element, EDIT_CLASS))?;
                element
            }
        };

        let base = ControllerBase::adopt(dom, element, KIND)?;
        let mut edit = Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
            debounce: Debouncer::new(VALUE_CHANGE_DEBOUNCE),
        };

        let config = edit
            .base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;
        config.wire_callbacks(registry, &mut edit.callbacks)?;
        if config.has("readOnly") {
            edit.set_read_only(true)?;
        }
        if let Some(value) = config.get("maxLength") {
            let length = value
                .parse()
                .map_err(|_| UiError::parameter_mismatch(value))?;
            edit.set_max_length(Some(length))?;
        }
        Ok(edit)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// The current value.
    pub fn value(&self) -> Result<String> {
        let element = self.base.element();
        Ok(self
            .base
            .dom()
            .with(|doc| doc.attr(element, VALUE_ATTR))?
            .unwrap_or_default())
    }

    /// The value parsed as an integer.
    pub fn value_int(&self) -> Result<i64> {
        let value = self.value()?;
        value
            .trim()
            .parse()
            .map_err(|_| UiError::parameter_mismatch(value))
    }

    /// The value parsed as a float.
    pub fn value_float(&self) -> Result<f64> {
        let value = self.value()?;
        value
            .trim()
            .parse()
            .map_err(|_| UiError::parameter_mismatch(value))
    }

    /// Set the value directly (no events, no debounce).
    pub fn set_value(&mut self, value: &str) -> Result<()> {
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| doc.set_attr(element, VALUE_ATTR, value))
    }

    /// Set or clear the read-only attribute.
    pub fn set_read_only(&mut self, read_only: bool) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            if read_only {
                doc.set_attr(element, READONLY_ATTR, "")
            } else {
                doc.remove_attr(element, READONLY_ATTR).map(|_| ())
            }
        })
    }

    /// Set or clear the maximum input length (enforced on input).
    pub fn set_max_length(&mut self, length: Option<usize>) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| match length {
            Some(length) => doc.set_attr(element, MAXLENGTH_ATTR, &length.to_string()),
            None => doc.remove_attr(element, MAXLENGTH_ATTR).map(|_| ()),
        })
    }

    /// Set or clear the disabled attribute.
    pub fn set_disabled(&mut self, disabled: bool) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            if disabled {
                doc.set_attr(element, DISABLED_ATTR, "")
            } else {
                doc.remove_attr(element, DISABLED_ATTR).map(|_| ())
            }
        })
    }

    fn accept_input(&mut self, value: &str) -> Result<()> {
        let element = self.base.element();
        let dom = self.base.dom().clone();

        let blocked = dom.with(|doc| -> Result<bool> {
            Ok(doc.has_attr(element, DISABLED_ATTR)? || doc.has_attr(element, READONLY_ATTR)?)
        })?;
        if blocked {
            return Ok(());
        }

        let max_length: Option<usize> = dom
            .with(|doc| doc.attr(element, MAXLENGTH_ATTR))?
            .and_then(|v| v.parse().ok());
        let value: String = match max_length {
            Some(limit) => value.chars().take(limit).collect(),
            None => value.to_string(),
        };

        dom.with_mut(|doc| doc.set_attr(element, VALUE_ATTR, &value))?;
        self.callbacks.notify(
            "input",
            &self.base.args(CallbackDetail::Value {
                value: value.clone(),
            }),
        );
        self.debounce.trigger(value);
        Ok(())
    }
}

impl Controller for EditController {
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
            EventKind::Input(value) => {
                let _ = self.accept_input(value);
            }
            EventKind::Copy => {
                let args = self.base.args(CallbackDetail::None);
                self.callbacks.notify("copy", &args);
            }
            EventKind::Paste => {
                let args = self.base.args(CallbackDetail::None);
                self.callbacks.notify("paste", &args);
            }
            EventKind::Cut => {
                let args = self.base.args(CallbackDetail::None);
                self.callbacks.notify("cut", &args);
            }
            _ => {}
        }
        Vec::new()
    }

    fn pump(&mut self) -> Vec<Outcome> {
        let Some(value) = self.debounce.fire_due() else {
            return Vec::new();
        };
        self.callbacks.notify(
            "value_change",
            &self.base.args(CallbackDetail::Value {
                value: value.clone(),
            }),
        );
        vec![Outcome::ValueCommitted {
            element: self.base.element(),
            value,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::sleep;

    fn fixture() -> (Dom, EditController) {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let edit = EditController::new(dom.clone(), &registry, None).unwrap();
        dom.append_child(dom.root(), edit.element()).unwrap();
        (dom, edit)
    }

    fn input(edit: &mut EditController, value: &str) {
        let event = InputEvent::new(edit.element(), EventKind::Input(value.to_string()));
        edit.handle_event(&event);
    }

    #[test]
    fn input_updates_value_and_fires_input_slot() {
        let (_, mut edit) = fixture();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        edit.callbacks_mut()
            .set("input", crate::callback::Handler::notify(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        input(&mut edit, "hello");
        assert_eq!(edit.value().unwrap(), "hello");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn value_change_is_debounced_to_the_last_edit() {
        let (_, mut edit) = fixture();
        let committed: Arc<parking_lot::Mutex<Vec<String>>> = Arc::default();
        let sink = committed.clone();
        edit.callbacks_mut()
            .set("value_change", crate::callback::Handler::notify(move |args| {
                if let CallbackDetail::Value { value } = &args.detail {
                    sink.lock().push(value.clone());
                }
            }))
            .unwrap();

        input(&mut edit, "h");
        input(&mut edit, "he");
        input(&mut edit, "hel");
        assert!(edit.pump().is_empty());

        sleep(VALUE_CHANGE_DEBOUNCE + Duration::from_millis(40));
        let outcomes = edit.pump();
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            &outcomes[0],
            Outcome::ValueCommitted { value, .. } if value == "hel"
        ));
        assert_eq!(committed.lock().clone(), vec!["hel".to_string()]);
        // Nothing further pending.
        assert!(edit.pump().is_empty());
    }

    #[test]
    fn read_only_blocks_input() {
        let (_, mut edit) = fixture();
        edit.set_read_only(true).unwrap();
        input(&mut edit, "nope");
        assert_eq!(edit.value().unwrap(), "");
    }

    #[test]
    fn max_length_truncates() {
        let (_, mut edit) = fixture();
        edit.set_max_length(Some(3)).unwrap();
        input(&mut edit, "abcdef");
        assert_eq!(edit.value().unwrap(), "abc");
    }

    #[test]
    fn typed_accessors_parse_or_fail() {
        let (_, mut edit) = fixture();
        edit.set_value("42").unwrap();
        assert_eq!(edit.value_int().unwrap(), 42);
        assert_eq!(edit.value_float().unwrap(), 42.0);

        edit.set_value("not a number").unwrap();
        assert!(edit.value_int().is_err());
    }
}
