//! Input events injected into the toolkit.
//!
//! There is no platform event source here: the host (or a test) builds an
//! [`InputEvent`] and hands it to `Ui::dispatch`, which routes it to the
//! controller owning the nearest bound ancestor of the target element.

use super::ElementId;

/// Keyboard keys the toolkit reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    ArrowUp,
    ArrowDown,
    Home,
    End,
}

/// The kind of an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Primary pointer pressed on the target.
    PointerDown,
    /// Completed primary click on the target.
    Click,
    /// Secondary (context) click on the target.
    ContextMenu,
    /// Key pressed while the target has focus.
    Key(Key),
    /// Text input; carries the field's new value.
    Input(String),
    /// Clipboard copy on the target.
    Copy,
    /// Clipboard paste on the target.
    Paste,
    /// Clipboard cut on the target.
    Cut,
}

/// An input event aimed at a specific element.
#[derive(Debug, Clone)]
pub struct InputEvent {
    /// The innermost element the event occurred on.
    pub target: ElementId,
    /// What happened.
    pub kind: EventKind,
}

impl InputEvent {
    /// Construct an event.
    pub fn new(target: ElementId, kind: EventKind) -> Self {
        Self { target, kind }
    }
}
