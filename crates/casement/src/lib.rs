//! Casement: a headless widget toolkit.
//!
//! Casement is a layer of reusable UI components — lists, trees, tabs,
//! selects, paging strips, dialogs, drawers, menus, sashes, editable
//! fields — built over an element arena, plus a declarative-attribute
//! initialization engine. There is no renderer here: elements are records
//! addressed by stable [`ElementId`](dom::ElementId) handles, input is
//! injected through [`Ui::dispatch`], and a real display is a projection of
//! the arena. Everything is testable without a live document.
//!
//! # The pieces
//!
//! - [`dom`] — the element arena, its structural mutation stream, and the
//!   input-event types
//! - [`config`] — the `w-config` attribute mini-language
//! - [`callback`] — per-widget callback tables, veto gates, and the named
//!   handler registry used by declarative wiring
//! - [`controller`] — the controlled-element lifecycle (marker-based
//!   idempotent binding, cascade deletion, semantic outcomes)
//! - [`widgets`] — the widget set
//! - [`scope`] — role-class auto-discovery over subtrees
//! - [`Ui`] — the runtime tying them together
//!
//! Theming lives in the companion crate, re-exported as [`style`].
//!
//! # Example
//!
//! ```
//! use casement::{Scope, Ui};
//! use casement::dom::{EventKind, InputEvent};
//!
//! let ui = Ui::new();
//! let dom = ui.dom().clone();
//!
//! // Declarative side: markup-ish construction plus a scope render pass.
//! let element = dom.create_element("div");
//! dom.with_mut(|doc| {
//!     doc.add_class(element, "w-list")?;
//!     doc.set_attr(element, "w-config", "multiple")
//! }).unwrap();
//! dom.append_child(dom.root(), element).unwrap();
//! Scope::render(&ui, dom.root()).unwrap();
//!
//! // Imperative side: the bound controller.
//! let list = ui.bind_list(Some(element)).unwrap();
//! list.lock().add_items(vec!["a".into(), "b".into()], true).unwrap();
//!
//! // Input side: events funnel through the runtime.
//! let first = list.lock().get_item(0).unwrap().unwrap();
//! ui.dispatch(InputEvent::new(first, EventKind::PointerDown)).unwrap();
//! assert!(list.lock().get_select_item().unwrap().is_some());
//! ```

pub mod callback;
pub mod config;
pub mod controller;
pub mod dom;
pub mod scope;
pub mod ui;
pub mod widgets;

pub use casement_style as style;

pub use callback::{CallbackArgs, CallbackDetail, CallbackRegistry, Handler};
pub use casement_core::{Result, UiError};
pub use controller::{Controller, Outcome};
pub use scope::Scope;
pub use ui::{Ui, WidgetRef};
