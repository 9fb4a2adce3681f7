//! The element substrate: arena, handles, mutation stream, input events.

mod document;
mod element;
mod event;

pub use document::{Document, Dom, Mutation};
pub use element::{Element, ElementId};
pub use event::{EventKind, InputEvent, Key};
