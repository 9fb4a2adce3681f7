//! Window-control button hints and the flag-button group builder.

use casement_core::Result;

use crate::callback::TitleAction;
use crate::dom::{Document, ElementId};

/// Class of the flag-button group element.
pub const WINDOW_FLAGS_CLASS: &str = "w-window-flags";

/// Class shared by every flag button.
pub const BTN_CLASS: &str = "btn";

/// Window-control hints.
///
/// A *set* hint suppresses its button: `MIN_BUTTON_HINT |
/// RESTORE_BUTTON_HINT` produces a group with only a close button (the
/// dialog default).
pub struct WindowFlags;

impl WindowFlags {
    /// Suppress the minimize button.
    pub const MIN_BUTTON_HINT: u32 = 0x1;
    /// Suppress the restore button.
    pub const RESTORE_BUTTON_HINT: u32 = 0x2;
    /// Suppress the close button.
    pub const CLOSE_BUTTON_HINT: u32 = 0x4;

    /// Build the flag-button group element (detached).
    pub fn build(doc: &mut Document, flags: u32) -> Result<ElementId> {
        let group = doc.create_element("div");
        doc.add_class(group, WINDOW_FLAGS_CLASS)?;

        let buttons: &[(u32, TitleAction, &str)] = &[
            (Self::MIN_BUTTON_HINT, TitleAction::Min, "\u{e15b}"),
            (Self::RESTORE_BUTTON_HINT, TitleAction::Restore, "\u{e3c1}"),
            (Self::CLOSE_BUTTON_HINT, TitleAction::Close, "\u{e14c}"),
        ];
        for &(hint, action, glyph) in buttons {
            if flags & hint != 0 {
                continue;
            }
            let button = doc.create_element("i");
            doc.add_class(button, BTN_CLASS)?;
            doc.add_class(button, action.class())?;
            doc.set_text(button, glyph)?;
            doc.append_child(group, button)?;
        }
        Ok(group)
    }

    /// Identify which flag button (if any) encloses `target`, searching up
    /// to `group`.
    pub fn action_at(doc: &Document, group: ElementId, target: ElementId) -> Option<TitleAction> {
        let button = doc
            .nearest_ancestor(target, |e| e.has_class(BTN_CLASS))
            .ok()??;
        if !doc.contains(group, button).unwrap_or(false) {
            return None;
        }
        for action in [TitleAction::Min, TitleAction::Restore, TitleAction::Close] {
            if doc.has_class(button, action.class()).unwrap_or(false) {
                return Some(action);
            }
        }
        None
    }
}
