//! Application bar: a title drag region plus window-control buttons.

use casement_core::Result;

use crate::callback::{CallbackDetail, CallbackRegistry, CallbackTable, SlotKind};
use crate::config::ConfigMap;
use crate::controller::{Controller, ControllerBase, Outcome};
use crate::dom::{Dom, ElementId, EventKind, InputEvent};
use crate::widgets::window_flags::WindowFlags;

/// Role class for app bars.
pub const APPBAR_CLASS: &str = "w-appbar";

const KIND: &str = "AppBar";

const SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("title_button", SlotKind::Notify),
];

/// The app-bar controller.
///
/// Pressing one of the window-flag buttons fires the `title_button` slot
/// with the action and emits an [`Outcome::TitleButton`]; what minimize or
/// close *means* is the host's business.
pub struct AppBarController {
    base: ControllerBase,
    callbacks: CallbackTable,
    title: ElementId,
    flags_group: ElementId,
}

impl AppBarController {
    /// Bind to `element`, or create a fresh `w-appbar` element when `None`.
    ///
    /// Configuration: `flags:min,restore,close` lists the *suppressed*
    /// buttons (mirroring [`WindowFlags`] hints); `title:<text>` sets the
    /// initial title.
    pub fn new(dom: Dom, registry: &CallbackRegistry, element: Option<ElementId>) -> Result<Self> {
        let element = match element {
            Some(element) => element,
            None => {
                let element = dom.create_element("header");
                dom.with_mut(|doc| doc.add_class(element, APPBAR_CLASS))?;
                element
            }
        };

        let base = ControllerBase::adopt(dom, element, KIND)?;
        let config = base
            .dom()
            .with_mut(|doc| ConfigMap::take_from(doc, element, crate::config::CONFIG_ATTR))?;

        let mut hints = 0u32;
        if let Some(list) = config.get("flags") {
            for name in list.split(',').filter(|n| !n.is_empty()) {
                hints |= match name {
                    "min" => WindowFlags::MIN_BUTTON_HINT,
                    "restore" => WindowFlags::RESTORE_BUTTON_HINT,
                    "close" => WindowFlags::CLOSE_BUTTON_HINT,
                    _ => 0,
                };
            }
        }

        let (title, flags_group) = base.dom().with_mut(|doc| -> Result<_> {
            let title = doc.create_element("h1");
            doc.add_class(title, "title")?;
            if let Some(text) = config.get("title") {
                doc.set_text(title, text)?;
            }
            doc.append_child(element, title)?;

            let group = WindowFlags::build(doc, hints)?;
            doc.append_child(element, group)?;
            Ok((title, group))
        })?;

        let mut appbar = Self {
            base,
            callbacks: CallbackTable::new(KIND, SLOTS),
            title,
            flags_group,
        };
        config.wire_callbacks(registry, &mut appbar.callbacks)?;
        Ok(appbar)
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// The title element (also the drag region).
    pub fn title_element(&self) -> ElementId {
        self.title
    }

    /// The window-flags group element.
    pub fn flags_element(&self) -> ElementId {
        self.flags_group
    }

    /// Set the bar title.
    pub fn set_title(&mut self, text: impl Into<String>) -> Result<()> {
        let title = self.title;
        self.base
            .dom()
            .with_mut(|doc| doc.set_text(title, text.into()))
    }
}

impl Controller for AppBarController {
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
        let action = self
            .base
            .dom()
            .with(|doc| WindowFlags::action_at(doc, self.flags_group, event.target));
        let Some(action) = action else {
            return Vec::new();
        };

        self.callbacks.notify(
            "title_button",
            &self.base.args(CallbackDetail::TitleButton { action }),
        );
        vec![Outcome::TitleButton {
            element: self.base.element(),
            action,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::TitleAction;

    #[test]
    fn button_press_fires_title_button() {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let mut bar = AppBarController::new(dom.clone(), &registry, None).unwrap();
        dom.append_child(dom.root(), bar.element()).unwrap();

        let close = dom.with(|doc| {
            doc.children(bar.flags_element())
                .unwrap()
                .into_iter()
                .find(|&c| doc.has_class(c, "close").unwrap())
                .unwrap()
        });
        let outcomes = bar.handle_event(&InputEvent::new(close, EventKind::Click));
        assert!(matches!(
            outcomes.as_slice(),
            [Outcome::TitleButton {
                action: TitleAction::Close,
                ..
            }]
        ));
    }

    #[test]
    fn config_suppresses_buttons_and_sets_title() {
        let dom = Dom::new();
        let registry = CallbackRegistry::new();
        let element = dom.create_element("header");
        dom.with_mut(|doc| {
            doc.add_class(element, APPBAR_CLASS)?;
            doc.set_attr(element, crate::config::CONFIG_ATTR, "flags:min,restore title:Files")
        })
        .unwrap();
        dom.append_child(dom.root(), element).unwrap();

        let bar = AppBarController::new(dom.clone(), &registry, Some(element)).unwrap();
        dom.with(|doc| {
            assert_eq!(doc.children(bar.flags_element()).unwrap().len(), 1);
            assert_eq!(doc.text(bar.title_element()).unwrap().unwrap(), "Files");
        });
    }
}
