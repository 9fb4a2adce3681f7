//! Window shells: dialog, drawer and floating panel.
//!
//! Shells are constructed programmatically (they have no role class for
//! auto-discovery). Each carries an interaction identity in its
//! `w-event-id` attribute: opening a shell whose event id already exists in
//! the document deletes the pre-existing instance first, so one call site
//! can never stack duplicate shells (last writer wins).
//!
//! Geometry is attribute-level: `width`/`height`/`left`/`top` plus min/max
//! bounds, with a nine-position placement grid computed against the root
//! element's recorded viewport size.

use casement_core::{Result, UiError};

use crate::callback::{CallbackDetail, CallbackTable, SlotKind, TitleAction};
use crate::controller::{Controller, ControllerBase, DismissWatchers, ModalStack, Outcome};
use crate::dom::{Document, Dom, ElementId, EventKind, InputEvent};
use crate::widgets::item;
use crate::widgets::window_flags::WindowFlags;

/// Class for dialogs.
pub const DIALOG_CLASS: &str = "w-dialog";
/// Class for drawers.
pub const DRAWER_CLASS: &str = "w-drawer";
/// Class for floating panels.
pub const FLOATING_CLASS: &str = "w-floating";

/// The interaction-identity attribute.
pub const EVENT_ID_ATTR: &str = "w-event-id";

/// Upper bound used when no explicit maximum is configured.
pub const MAX_WIDTH: i64 = 300_000;
/// Upper bound used when no explicit maximum is configured.
pub const MAX_HEIGHT: i64 = 300_000;

const DIALOG_KIND: &str = "Dialog";
const DRAWER_KIND: &str = "Drawer";
const FLOATING_KIND: &str = "Floating";

const DIALOG_SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("close", SlotKind::Notify),
    ("title_button", SlotKind::Notify),
];

const SHELL_SLOTS: &[(&str, SlotKind)] = &[
    ("delete", SlotKind::Notify),
    ("close", SlotKind::Notify),
];

/// The nine-position placement grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Place {
    TopLeft,
    CenterLeft,
    BottomLeft,
    TopCenter,
    #[default]
    Center,
    BottomCenter,
    TopRight,
    CenterRight,
    BottomRight,
}

impl Place {
    fn position(self, viewport: (i64, i64), own: (i64, i64)) -> (i64, i64) {
        let (vw, vh) = viewport;
        let (w, h) = own;
        let x = match self {
            Self::TopLeft | Self::CenterLeft | Self::BottomLeft => 0,
            Self::TopCenter | Self::Center | Self::BottomCenter => vw / 2 - w / 2,
            Self::TopRight | Self::CenterRight | Self::BottomRight => vw - w,
        };
        let y = match self {
            Self::TopLeft | Self::TopCenter | Self::TopRight => 0,
            Self::CenterLeft | Self::Center | Self::CenterRight => vh / 2 - h / 2,
            Self::BottomLeft | Self::BottomCenter | Self::BottomRight => vh - h,
        };
        (x, y)
    }
}

/// Drawer slide-in edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Content accepted by [`set_content`](DialogController::set_content).
#[derive(Clone, Debug)]
pub enum ContentSpec {
    /// Plain text, wrapped into a `w-view` pane.
    Text(String),
    /// A pre-built `w-view` element.
    View(ElementId),
}

impl From<&str> for ContentSpec {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ContentSpec {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<ElementId> for ContentSpec {
    fn from(view: ElementId) -> Self {
        Self::View(view)
    }
}

fn int_attr(doc: &Document, id: ElementId, name: &str) -> i64 {
    doc.attr(id, name)
        .ok()
        .flatten()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn apply_content(doc: &mut Document, holder: ElementId, content: ContentSpec) -> Result<()> {
    for child in doc.children(holder)? {
        doc.remove(child)?;
    }
    match content {
        ContentSpec::Text(text) => {
            let view = doc.create_element("div");
            doc.set_attr(view, item::VIEW_ATTR, "")?;
            doc.add_class(view, "content")?;
            doc.set_text(view, text)?;
            doc.append_child(holder, view)
        }
        ContentSpec::View(view) => {
            if !doc.exists(view) || !doc.element(view)?.has_attr(item::VIEW_ATTR) {
                return Err(UiError::parameter_mismatch(format!("{view:?}")));
            }
            doc.add_class(view, "content")?;
            doc.append_child(holder, view)
        }
    }
}

fn set_size_bounds(
    doc: &mut Document,
    element: ElementId,
    size: (i64, i64),
    min: (i64, i64),
    max: (i64, i64),
) -> Result<()> {
    doc.set_attr(element, "width", &size.0.to_string())?;
    doc.set_attr(element, "height", &size.1.to_string())?;
    doc.set_attr(element, "min-width", &min.0.to_string())?;
    doc.set_attr(element, "min-height", &min.1.to_string())?;
    doc.set_attr(element, "max-width", &max.0.to_string())?;
    doc.set_attr(element, "max-height", &max.1.to_string())
}

/// Delete any element already carrying `event_id`, so the new shell is the
/// only holder of that interaction identity. Returns the displaced element
/// if one existed (the caller routes it through `Ui::delete`).
pub fn displace_event_id(doc: &Document, event_id: &str) -> Option<ElementId> {
    doc.find_by_attr(doc.root(), EVENT_ID_ATTR)
        .ok()?
        .into_iter()
        .find(|&el| doc.attr(el, EVENT_ID_ATTR).ok().flatten().as_deref() == Some(event_id))
}

/// Options for [`DialogController::create`].
pub struct DialogOptions {
    pub title: String,
    pub icon: Option<String>,
    pub content: ContentSpec,
    pub size: (i64, i64),
    pub min_size: (i64, i64),
    pub max_size: (i64, i64),
    /// [`WindowFlags`] hints; set bits suppress buttons.
    pub flags: u32,
    pub draggable: bool,
    pub event_id: Option<String>,
}

impl Default for DialogOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            icon: None,
            content: ContentSpec::Text(String::new()),
            size: (300, 200),
            min_size: (300, 200),
            max_size: (MAX_WIDTH, MAX_HEIGHT),
            flags: WindowFlags::MIN_BUTTON_HINT | WindowFlags::RESTORE_BUTTON_HINT,
            draggable: true,
            event_id: None,
        }
    }
}

/// A titled, draggable dialog shell.
pub struct DialogController {
    base: ControllerBase,
    callbacks: CallbackTable,
    title_text: ElementId,
    flags_group: ElementId,
    content: ElementId,
    modals: ModalStack,
}

impl DialogController {
    /// Build the shell element tree and bind the controller. The element is
    /// appended under the document root, hidden until shown.
    pub fn create(dom: Dom, modals: ModalStack, options: DialogOptions) -> Result<Self> {
        let (element, title_text, flags_group, content) =
            dom.with_mut(|doc| -> Result<_> {
                let element = doc.create_element("dialog");
                doc.add_class(element, DIALOG_CLASS)?;

                let title = doc.create_element("div");
                doc.add_class(title, "title")?;
                let icon = doc.create_element("img");
                doc.add_class(icon, "icon")?;
                doc.set_attr(icon, "draggable", "false")?;
                if let Some(src) = &options.icon {
                    doc.set_attr(icon, "src", src)?;
                }
                let title_text = doc.create_element("h1");
                doc.add_class(title_text, "text")?;
                doc.set_text(title_text, options.title.clone())?;
                let flags_group = WindowFlags::build(doc, options.flags)?;
                doc.append_child(title, icon)?;
                doc.append_child(title, title_text)?;
                doc.append_child(title, flags_group)?;

                let content = doc.create_element("div");
                doc.add_class(content, "content")?;
                let bottom = doc.create_element("div");
                doc.add_class(bottom, "bottom")?;

                doc.append_child(element, title)?;
                doc.append_child(element, content)?;
                doc.append_child(element, bottom)?;

                set_size_bounds(doc, element, options.size, options.min_size, options.max_size)?;
                if options.draggable {
                    doc.set_attr(element, "draggable", "true")?;
                }
                if let Some(event_id) = &options.event_id {
                    doc.set_attr(element, EVENT_ID_ATTR, event_id)?;
                }
                apply_content(doc, content, options.content.clone())?;

                let root = doc.root();
                doc.append_child(root, element)?;
                Ok((element, title_text, flags_group, content))
            })?;

        let base = ControllerBase::adopt(dom, element, DIALOG_KIND)?;
        Ok(Self {
            base,
            callbacks: CallbackTable::new(DIALOG_KIND, DIALOG_SLOTS),
            title_text,
            flags_group,
            content,
            modals,
        })
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// Show non-modally at a grid position.
    pub fn show(&mut self, place: Place) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            doc.set_attr(element, "open", "")?;
            let root = doc.root();
            let viewport = (int_attr(doc, root, "width"), int_attr(doc, root, "height"));
            let own = (int_attr(doc, element, "width"), int_attr(doc, element, "height"));
            let (x, y) = place.position(viewport, own);
            doc.set_attr(element, "left", &x.to_string())?;
            doc.set_attr(element, "top", &y.to_string())
        })
    }

    /// Show modally: input outside the shell is swallowed until close.
    pub fn show_modal(&mut self, place: Place) -> Result<()> {
        self.show(place)?;
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| doc.set_attr(element, "modal", ""))?;
        self.modals.push(element);
        Ok(())
    }

    /// Hide the shell and fire the `close` slot. The element stays in the
    /// document; `Ui::delete` removes it.
    pub fn close(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            doc.remove_attr(element, "open")?;
            doc.remove_attr(element, "modal")
        })?;
        self.modals.remove(element);
        self.callbacks
            .notify("close", &self.base.args(CallbackDetail::None));
        Ok(())
    }

    /// Replace the dialog content.
    pub fn set_content(&mut self, content: impl Into<ContentSpec>) -> Result<()> {
        let holder = self.content;
        let content = content.into();
        self.base
            .dom()
            .with_mut(|doc| apply_content(doc, holder, content))
    }

    /// Replace the title text.
    pub fn set_title(&mut self, text: impl Into<String>) -> Result<()> {
        let title = self.title_text;
        self.base
            .dom()
            .with_mut(|doc| doc.set_text(title, text.into()))
    }

    /// Move the shell.
    pub fn set_position(&mut self, x: i64, y: i64) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            doc.set_attr(element, "left", &x.to_string())?;
            doc.set_attr(element, "top", &y.to_string())
        })
    }
}

impl Controller for DialogController {
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
        let mut outcomes = vec![Outcome::TitleButton {
            element: self.base.element(),
            action,
        }];
        if action == TitleAction::Close {
            let _ = self.close();
            outcomes.push(Outcome::CloseRequested {
                element: self.base.element(),
            });
        }
        outcomes
    }

    fn on_delete(&mut self) {
        self.modals.remove(self.base.element());
        let args = self.base.args(CallbackDetail::None);
        self.callbacks.notify("delete", &args);
    }
}

/// Options for [`DrawerController::create`].
pub struct DrawerOptions {
    pub content: ContentSpec,
    pub direction: Direction,
    pub event_id: Option<String>,
}

impl Default for DrawerOptions {
    fn default() -> Self {
        Self {
            content: ContentSpec::Text(String::new()),
            direction: Direction::default(),
            event_id: None,
        }
    }
}

/// An edge-anchored modal drawer. Any interaction outside it closes it.
pub struct DrawerController {
    base: ControllerBase,
    callbacks: CallbackTable,
    modals: ModalStack,
    watchers: DismissWatchers,
    watch_token: Option<u64>,
}

impl DrawerController {
    /// Build the shell and bind the controller.
    pub fn create(
        dom: Dom,
        modals: ModalStack,
        watchers: DismissWatchers,
        options: DrawerOptions,
    ) -> Result<Self> {
        let element = dom.with_mut(|doc| -> Result<ElementId> {
            let element = doc.create_element("dialog");
            doc.add_class(element, DRAWER_CLASS)?;
            doc.set_attr(element, "direction", options.direction.as_str())?;
            if let Some(event_id) = &options.event_id {
                doc.set_attr(element, EVENT_ID_ATTR, event_id)?;
            }
            apply_content(doc, element, options.content.clone())?;
            let root = doc.root();
            doc.append_child(root, element)?;
            Ok(element)
        })?;

        let base = ControllerBase::adopt(dom, element, DRAWER_KIND)?;
        Ok(Self {
            base,
            callbacks: CallbackTable::new(DRAWER_KIND, SHELL_SLOTS),
            modals,
            watchers,
            watch_token: None,
        })
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// The slide-in edge.
    pub fn direction(&self) -> Result<Direction> {
        let element = self.base.element();
        let value = self
            .base
            .dom()
            .with(|doc| doc.attr(element, "direction"))?
            .unwrap_or_default();
        match value.as_str() {
            "top" => Ok(Direction::Top),
            "bottom" => Ok(Direction::Bottom),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(UiError::parameter_mismatch(other)),
        }
    }

    /// Show the drawer modally with outside-dismiss armed.
    pub fn show(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            doc.set_attr(element, "open", "")?;
            doc.set_attr(element, "modal", "")
        })?;
        self.modals.push(element);
        if self.watch_token.is_none() {
            self.watch_token = Some(self.watchers.install(element, element));
        }
        Ok(())
    }

    /// Hide the drawer.
    pub fn close(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            doc.remove_attr(element, "open")?;
            doc.remove_attr(element, "modal")
        })?;
        self.modals.remove(element);
        if let Some(token) = self.watch_token.take() {
            self.watchers.remove(token);
        }
        self.callbacks
            .notify("close", &self.base.args(CallbackDetail::None));
        Ok(())
    }
}

impl Controller for DrawerController {
    fn base(&self) -> &ControllerBase {
        &self.base
    }

    fn callbacks(&self) -> &CallbackTable {
        &self.callbacks
    }

    fn callbacks_mut(&mut self) -> &mut CallbackTable {
        &mut self.callbacks
    }

    fn on_dismiss(&mut self) {
        let _ = self.close();
    }

    fn on_delete(&mut self) {
        self.modals.remove(self.base.element());
        if let Some(token) = self.watch_token.take() {
            self.watchers.remove(token);
        }
        let args = self.base.args(CallbackDetail::None);
        self.callbacks.notify("delete", &args);
    }
}

/// Options for [`FloatingController::create`].
pub struct FloatingOptions {
    pub content: ContentSpec,
    pub position: (i64, i64),
    pub size: (i64, i64),
    pub min_size: (i64, i64),
    pub max_size: (i64, i64),
    pub draggable: bool,
    pub event_id: Option<String>,
}

impl Default for FloatingOptions {
    fn default() -> Self {
        Self {
            content: ContentSpec::Text(String::new()),
            position: (0, 0),
            size: (100, 100),
            min_size: (100, 100),
            max_size: (MAX_WIDTH, MAX_HEIGHT),
            draggable: true,
            event_id: None,
        }
    }
}

/// A free-floating, non-modal panel.
pub struct FloatingController {
    base: ControllerBase,
    callbacks: CallbackTable,
}

impl FloatingController {
    /// Build the shell and bind the controller.
    pub fn create(dom: Dom, options: FloatingOptions) -> Result<Self> {
        let element = dom.with_mut(|doc| -> Result<ElementId> {
            let element = doc.create_element("dialog");
            doc.add_class(element, FLOATING_CLASS)?;
            set_size_bounds(doc, element, options.size, options.min_size, options.max_size)?;
            doc.set_attr(element, "left", &options.position.0.to_string())?;
            doc.set_attr(element, "top", &options.position.1.to_string())?;
            if options.draggable {
                doc.set_attr(element, "draggable", "true")?;
            }
            if let Some(event_id) = &options.event_id {
                doc.set_attr(element, EVENT_ID_ATTR, event_id)?;
            }
            apply_content(doc, element, options.content.clone())?;
            let root = doc.root();
            doc.append_child(root, element)?;
            Ok(element)
        })?;

        let base = ControllerBase::adopt(dom, element, FLOATING_KIND)?;
        Ok(Self {
            base,
            callbacks: CallbackTable::new(FLOATING_KIND, SHELL_SLOTS),
        })
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.base.element()
    }

    /// Show the panel.
    pub fn show(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| doc.set_attr(element, "open", ""))
    }

    /// Hide the panel.
    pub fn close(&mut self) -> Result<()> {
        let element = self.base.element();
        self.base
            .dom()
            .with_mut(|doc| doc.remove_attr(element, "open").map(|_| ()))?;
        self.callbacks
            .notify("close", &self.base.args(CallbackDetail::None));
        Ok(())
    }

    /// Move the panel.
    pub fn set_position(&mut self, x: i64, y: i64) -> Result<()> {
        let element = self.base.element();
        self.base.dom().with_mut(|doc| {
            doc.set_attr(element, "left", &x.to_string())?;
            doc.set_attr(element, "top", &y.to_string())
        })
    }
}

impl Controller for FloatingController {
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
