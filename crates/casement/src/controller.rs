//! The controlled-element lifecycle.
//!
//! A controller is an object bound 1:1 to a document element. The bound
//! element carries a marker attribute equal to the controller's type name;
//! binding an element that already carries a matching marker hands back the
//! existing controller instead of constructing a second one, which is what
//! makes repeated discovery passes over the same subtree safe.
//!
//! Controllers translate raw input events into [`Outcome`]s — semantic
//! events the `Ui` routes to ancestor controllers. Composites observe their
//! nested primitives through this channel rather than by reaching into
//! them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use casement_core::{Result, TimerId};
use parking_lot::Mutex;

use crate::callback::{CallbackArgs, CallbackDetail, CallbackTable, TitleAction};
use crate::dom::{Document, Dom, ElementId, InputEvent};

/// The marker attribute recording "already bound" plus the type name.
pub const INIT_MARKER: &str = "w-init";

/// Common state for all controllers: the document handle, the bound
/// element, and the type name used as the binding marker.
pub struct ControllerBase {
    dom: Dom,
    element: ElementId,
    kind: &'static str,
}

impl ControllerBase {
    /// Adopt an element: store the handle and stamp the marker attribute.
    pub fn adopt(dom: Dom, element: ElementId, kind: &'static str) -> Result<Self> {
        dom.with_mut(|doc| doc.set_attr(element, INIT_MARKER, kind))?;
        tracing::debug!(target: "casement::controller", ?element, kind, "bound controller");
        Ok(Self { dom, element, kind })
    }

    /// The document handle.
    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// The bound element.
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// The controller type name.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Build callback args for this controller.
    pub fn args(&self, detail: CallbackDetail) -> CallbackArgs {
        CallbackArgs::with(self.kind, self.element, detail)
    }
}

/// A semantic event produced by a controller, routed by the `Ui` to the
/// controllers bound on ancestor elements.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// A non-disabled item was pressed (before any selection gating).
    ItemPressed {
        container: ElementId,
        item: ElementId,
        index: usize,
        origin: ElementId,
    },
    /// An item became selected.
    ItemSelected {
        container: ElementId,
        item: ElementId,
        index: usize,
    },
    /// A view became selected.
    ViewSelected {
        container: ElementId,
        view: ElementId,
        index: usize,
    },
    /// A debounced field value was committed.
    ValueCommitted {
        element: ElementId,
        value: String,
    },
    /// The current page changed.
    PageChanged {
        element: ElementId,
        page: usize,
    },
    /// A window-control button was pressed.
    TitleButton {
        element: ElementId,
        action: TitleAction,
    },
    /// A shell asked to be removed from the document.
    CloseRequested {
        element: ElementId,
    },
}

/// The behavior contract every controller implements.
///
/// Callbacks registered on a controller may freely use the document and
/// *other* controllers, but must not re-enter the controller they were
/// registered on: slots run synchronously and the controller is locked for
/// the duration of the call that fired them.
pub trait Controller: Send {
    /// Common state.
    fn base(&self) -> &ControllerBase;

    /// The callback table.
    fn callbacks(&self) -> &CallbackTable;

    /// The callback table, mutably.
    fn callbacks_mut(&mut self) -> &mut CallbackTable;

    /// Translate a raw input event into semantic outcomes, applying any
    /// widget-local state changes on the way.
    fn handle_event(&mut self, _event: &InputEvent) -> Vec<Outcome> {
        Vec::new()
    }

    /// React to a semantic outcome from a controller bound on a descendant
    /// element.
    fn on_child_outcome(&mut self, _outcome: &Outcome) -> Vec<Outcome> {
        Vec::new()
    }

    /// React to an expired timer the `Ui` scheduled for this controller.
    fn on_timer(&mut self, _id: TimerId) -> Vec<Outcome> {
        Vec::new()
    }

    /// Drain any pending debounced work.
    fn pump(&mut self) -> Vec<Outcome> {
        Vec::new()
    }

    /// The popup this controller opened was dismissed from outside
    /// (outside pointer-down or Escape).
    fn on_dismiss(&mut self) {}

    /// The controller is being deleted; fires the `delete` slot.
    fn on_delete(&mut self) {
        let args = self.base().args(CallbackDetail::None);
        self.callbacks().notify("delete", &args);
    }
}

/// One live auto-dismiss registration: a popup subtree and the controller
/// element to notify when interaction lands outside it.
#[derive(Clone, Copy, Debug)]
pub struct Watcher {
    /// Removal token handed back by [`DismissWatchers::install`].
    pub token: u64,
    /// Root of the popup subtree; interaction inside it is not a dismissal.
    pub root: ElementId,
    /// The controller element whose `on_dismiss` runs on dismissal.
    pub owner: ElementId,
}

/// The document-level auto-dismiss listener set.
///
/// Popups (select, drop list, context menu, drawer) install a watcher when
/// they show and remove it by token when they close. The `Ui` sweeps the
/// set on every pointer-down and on Escape, so a watcher cannot leak no
/// matter which path dismissed the popup.
#[derive(Clone, Default)]
pub struct DismissWatchers {
    inner: Arc<Mutex<Vec<Watcher>>>,
    next: Arc<AtomicU64>,
}

impl DismissWatchers {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a watcher; returns the removal token.
    pub fn install(&self, root: ElementId, owner: ElementId) -> u64 {
        let token = self.next.fetch_add(1, Ordering::SeqCst);
        self.inner.lock().push(Watcher { token, root, owner });
        token
    }

    /// Remove a watcher by token. Removing an already-removed token is a
    /// harmless no-op (the dismissal paths race benignly with `close`).
    pub fn remove(&self, token: u64) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.len();
        inner.retain(|w| w.token != token);
        inner.len() != before
    }

    /// Number of live watchers.
    pub fn count(&self) -> usize {
        self.inner.lock().len()
    }

    /// Remove and return every watcher whose subtree does not contain
    /// `target`. A stale root counts as outside.
    pub fn take_outside(&self, doc: &Document, target: ElementId) -> Vec<Watcher> {
        let mut inner = self.inner.lock();
        let mut outside = Vec::new();
        let mut kept = Vec::new();
        for watcher in inner.drain(..) {
            if doc.contains(watcher.root, target).unwrap_or(false) {
                kept.push(watcher);
            } else {
                outside.push(watcher);
            }
        }
        *inner = kept;
        outside
    }

    /// Remove and return the most recently installed watcher (Escape
    /// dismisses the topmost popup).
    pub fn take_top(&self) -> Option<Watcher> {
        self.inner.lock().pop()
    }

    /// Remove every watcher owned by `owner` (controller teardown).
    pub fn remove_owner(&self, owner: ElementId) {
        self.inner.lock().retain(|w| w.owner != owner);
    }
}

/// The modal shell stack. While non-empty, input outside the topmost modal
/// subtree is swallowed by the `Ui`.
#[derive(Clone, Default)]
pub struct ModalStack {
    inner: Arc<Mutex<Vec<ElementId>>>,
}

impl ModalStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a modal shell.
    pub fn push(&self, element: ElementId) {
        self.inner.lock().push(element);
    }

    /// Remove a shell wherever it sits in the stack.
    pub fn remove(&self, element: ElementId) {
        self.inner.lock().retain(|&e| e != element);
    }

    /// The topmost modal shell, if any.
    pub fn top(&self) -> Option<ElementId> {
        self.inner.lock().last().copied()
    }

    /// Whether any modal shell is active.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
