//! Transient message notice with severity and auto-dismiss.

use std::time::Duration;

use casement_core::{Result, TimerId};

use crate::callback::{CallbackDetail, CallbackTable, SlotKind};
use crate::controller::{Controller, ControllerBase, Outcome};
use crate::dom::{Dom, ElementId};

/// Class for message notices.
pub const MESSAGE_CLASS: &str = "w-message";

const KIND: &str = "Message";

const SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("close", SlotKind::Notify),
];

/// Message severity; becomes a class on the notice element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl Severity {
    /// The class carried by the notice element.
    pub fn class(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Options for [`MessageController::create`].
pub struct MessageOptions {
    pub text: String,
    pub severity: Severity,
    /// Auto-dismiss delay; `None` keeps the notice until closed.
    pub duration: Option<Duration>,
    pub event_id: Option<String>,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            severity: Severity::Info,
            duration: Some(Duration::from_millis(2500)),
            event_id: None,
        }
    }
}

/// The message controller. When its auto-dismiss timer (scheduled by the
/// `Ui`) fires, it closes and requests its own removal.
pub struct MessageController {
    base: ControllerBase,
    callbacks: CallbackTable,
    dismiss_timer: Option<TimerId>,
}

impl MessageController {
    /// Build the notice element and bind the controller.
    pub fn create(dom: Dom, options: MessageOptions) -> Result<Self> {
        let element = dom.with_mut(|doc| -> Result<ElementId> {
            let element = doc.create_element("div");
            doc.add_class(element, MESSAGE_CLASS)?;
            doc.add_class(element, options.severity.class())?;
            doc.set_text(element, options.text.clone())?;
            if let Some(event_id) = &options.event_id {
                doc.set_attr(element, super::dialog::EVENT_ID_ATTR, event_id)?;
            }
            doc.set_attr(element, "open", "")?;
            let root = doc.root();
            doc.append_child(root, element)?;
            Ok(element)
        })?;

        let base = ControllerBase::adopt(dom, element, KIND)?;
        Ok(Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
            dismiss_timer: None,
        })
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// Record the auto-dismiss timer the `Ui` scheduled for this notice.
    pub fn set_dismiss_timer(&mut self, id: TimerId) {
        self.dismiss_timer = Some(id);
    }

    /// Hide the notice and fire the `close` slot.
    pub fn close(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| doc.remove_attr(element, "open").map(|_| ()))?;
        self.callbacks
            .notify("close", &self.base.args(CallbackDetail::None));
        Ok(())
    }
}

impl Controller for MessageController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    fn callbacks_mut(&mut self) -> &mut CallbackTable {
        &mut self.callbacks
    }

    fn on_timer(&mut self, id: TimerId) -> Vec<Outcome> {
        if self.dismiss_timer != Some(id) {
            return Vec::new();
        }
        self.dismiss_timer = None;
        let _ = self.close();
        vec![Outcome::CloseRequested {
            element: self.base.element(),
        }]
    }
}
