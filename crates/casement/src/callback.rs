//! Callback tables, veto gates and the named-handler registry.
//!
//! Every controller carries a [`CallbackTable`]: a closed set of named
//! slots, each either a *notify* slot (fire-and-forget observation) or a
//! *gate* (a predicate consulted before a mutation — the veto mechanism).
//! Slots default to a no-op or a permissive gate; the pristine defaults are
//! retained so a table can be restored after monitoring.
//!
//! The [`CallbackRegistry`] maps declarative names (used by the `callbacks`
//! configuration entry) to handlers. It replaces lookup of identifiers in an
//! ambient global namespace: hosts register their handlers explicitly and
//! markup refers to them by name.

use std::collections::HashMap;
use std::sync::Arc;

use casement_core::{Result, UiError};
use parking_lot::RwLock;

use crate::dom::{ElementId, InputEvent};

/// A notify slot: observes, returns nothing.
pub type NotifyFn = Arc<dyn Fn(&CallbackArgs) + Send + Sync>;

/// A gate slot: a predicate whose verdict authorizes a mutation.
pub type GateFn = Arc<dyn Fn(&CallbackArgs) -> bool + Send + Sync>;

/// A handler bound to a slot.
#[derive(Clone)]
pub enum Handler {
    /// Observation only.
    Notify(NotifyFn),
    /// Mutation veto gate.
    Gate(GateFn),
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notify(_) => f.write_str("Handler::Notify(..)"),
            Self::Gate(_) => f.write_str("Handler::Gate(..)"),
        }
    }
}

impl Handler {
    /// Wrap a notify closure.
    pub fn notify(f: impl Fn(&CallbackArgs) + Send + Sync + 'static) -> Self {
        Self::Notify(Arc::new(f))
    }

    /// Wrap a gate closure.
    pub fn gate(f: impl Fn(&CallbackArgs) -> bool + Send + Sync + 'static) -> Self {
        Self::Gate(Arc::new(f))
    }

    fn kind(&self) -> SlotKind {
        match self {
            Self::Notify(_) => SlotKind::Notify,
            Self::Gate(_) => SlotKind::Gate,
        }
    }
}

/// The kind of a slot in a widget's callback contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Fire-and-forget notification.
    Notify,
    /// Boolean veto gate; defaults to permissive.
    Gate,
}

/// Which structural operation a swap gate is deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOp {
    /// Exchange positions.
    Swap,
    /// Insert after the target.
    Insert,
    /// Insert before the target.
    InsertBefore,
}

/// A window-control action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleAction {
    Min,
    Restore,
    Close,
}

impl TitleAction {
    /// The class name carried by the corresponding flag button.
    pub fn class(self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Restore => "restore",
            Self::Close => "close",
        }
    }
}

/// Payload delivered to a callback slot.
#[derive(Clone, Debug)]
pub struct CallbackArgs {
    /// The controller type name.
    pub widget: &'static str,
    /// The controller's bound element.
    pub element: ElementId,
    /// Slot-specific detail.
    pub detail: CallbackDetail,
}

impl CallbackArgs {
    /// Arguments with no detail.
    pub fn bare(widget: &'static str, element: ElementId) -> Self {
        Self {
            widget,
            element,
            detail: CallbackDetail::None,
        }
    }

    /// Arguments with a detail payload.
    pub fn with(widget: &'static str, element: ElementId, detail: CallbackDetail) -> Self {
        Self {
            widget,
            element,
            detail,
        }
    }
}

/// Slot-specific callback payloads.
#[derive(Clone, Debug, Default)]
pub enum CallbackDetail {
    /// No payload.
    #[default]
    None,
    /// An item and its ordinal.
    Item {
        item: ElementId,
        index: usize,
    },
    /// A selection probe: the item and the innermost event target.
    Select {
        item: ElementId,
        origin: ElementId,
    },
    /// A context-menu request on an item.
    Context {
        item: ElementId,
        origin: ElementId,
        event: InputEvent,
    },
    /// A structural reorder proposal.
    Swap {
        op: SwapOp,
        item: ElementId,
        target: ElementId,
    },
    /// A view and its ordinal.
    View {
        view: ElementId,
        index: usize,
    },
    /// A bare ordinal (the entry itself is already gone).
    Index {
        index: usize,
    },
    /// A committed or in-flight field value.
    Value {
        value: String,
    },
    /// A page number.
    Page {
        page: usize,
    },
    /// A window-control action.
    TitleButton {
        action: TitleAction,
    },
    /// A tree node id.
    Node {
        id: usize,
    },
    /// A fold-state change on a tree node.
    Fold {
        id: usize,
        expanded: bool,
    },
    /// A sash displacement.
    Moved {
        offset: i64,
    },
}

/// A closed, per-widget-type table of named callback slots.
pub struct CallbackTable {
    widget: &'static str,
    slots: HashMap<&'static str, Handler>,
    defaults: HashMap<&'static str, Handler>,
}

impl CallbackTable {
    /// Build a table from the widget's slot contract. Every notify slot
    /// defaults to a no-op, every gate to a permissive predicate.
    pub fn new(widget: &'static str, spec: &[(&'static str, SlotKind)]) -> Self {
        let mut slots = HashMap::with_capacity(spec.len());
        for &(name, kind) in spec {
            let default = match kind {
                SlotKind::Notify => Handler::notify(|_| {}),
                SlotKind::Gate => Handler::gate(|_| true),
            };
            slots.insert(name, default);
        }
        Self {
            widget,
            defaults: slots.clone(),
            slots,
        }
    }

    /// The widget type name this table belongs to.
    pub fn widget(&self) -> &'static str {
        self.widget
    }

    /// Replace a named slot.
    ///
    /// Fails with [`UiError::UnknownCallback`] for names outside the
    /// contract and [`UiError::ParameterMismatch`] when a notify handler is
    /// offered for a gate slot or vice versa.
    pub fn set(&mut self, name: &str, handler: Handler) -> Result<()> {
        let Some((&key, current)) = self.slots.get_key_value(name) else {
            return Err(UiError::UnknownCallback {
                widget: self.widget,
                name: name.to_string(),
            });
        };
        if current.kind() != handler.kind() {
            return Err(UiError::parameter_mismatch(format!(
                "slot '{name}' expects a {:?} handler",
                current.kind()
            )));
        }
        self.slots.insert(key, handler);
        Ok(())
    }

    /// Restore every slot to its default.
    pub fn reset(&mut self) {
        self.slots = self.defaults.clone();
    }

    /// Restore one slot to its default.
    pub fn reset_slot(&mut self, name: &str) -> Result<()> {
        match self.defaults.get_key_value(name) {
            Some((&key, default)) => {
                let default = default.clone();
                self.slots.insert(key, default);
                Ok(())
            }
            None => Err(UiError::UnknownCallback {
                widget: self.widget,
                name: name.to_string(),
            }),
        }
    }

    /// Whether the named slot exists in the contract.
    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Invoke a notify slot. Gate slots and unknown names are ignored —
    /// internal call sites name slots statically.
    pub fn notify(&self, name: &str, args: &CallbackArgs) {
        if let Some(Handler::Notify(f)) = self.slots.get(name) {
            f(args);
        }
    }

    /// Consult a gate slot. Unknown or notify slots answer permissively.
    pub fn gate(&self, name: &str, args: &CallbackArgs) -> bool {
        match self.slots.get(name) {
            Some(Handler::Gate(f)) => f(args),
            _ => true,
        }
    }
}

/// The explicit name → handler mapping used by declarative configuration.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    inner: Arc<RwLock<HashMap<String, Handler>>>,
}

impl CallbackRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a notify handler under `name`.
    pub fn register_notify(
        &self,
        name: impl Into<String>,
        f: impl Fn(&CallbackArgs) + Send + Sync + 'static,
    ) {
        self.inner.write().insert(name.into(), Handler::notify(f));
    }

    /// Register a gate handler under `name`.
    pub fn register_gate(
        &self,
        name: impl Into<String>,
        f: impl Fn(&CallbackArgs) -> bool + Send + Sync + 'static,
    ) {
        self.inner.write().insert(name.into(), Handler::gate(f));
    }

    /// Remove a handler. Returns `true` if it existed.
    pub fn unregister(&self, name: &str) -> bool {
        self.inner.write().remove(name).is_some()
    }

    /// Resolve a name to its handler.
    ///
    /// Fails with [`UiError::VariableDoesNotExist`] — callback
    /// misconfiguration is surfaced loudly by design.
    pub fn resolve(&self, name: &str) -> Result<Handler> {
        self.inner
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| UiError::VariableDoesNotExist {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn table() -> CallbackTable {
        CallbackTable::new(
            "List",
            &[
                ("delete", SlotKind::Notify),
                ("add_item", SlotKind::Notify),
                ("select_item", SlotKind::Gate),
            ],
        )
    }

    #[test]
    fn unknown_slot_is_rejected() {
        let mut table = table();
        let err = table.set("bogus", Handler::notify(|_| {})).unwrap_err();
        match err {
            UiError::UnknownCallback { widget, name } => {
                assert_eq!(widget, "List");
                assert_eq!(name, "bogus");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn slot_kind_mismatch_is_rejected() {
        let mut table = table();
        assert!(table.set("select_item", Handler::notify(|_| {})).is_err());
        assert!(table.set("add_item", Handler::gate(|_| true)).is_err());
    }

    #[test]
    fn gates_default_permissive_and_can_veto() {
        let mut table = table();
        let args = CallbackArgs::bare("List", Dom::new().root());
        assert!(table.gate("select_item", &args));

        table.set("select_item", Handler::gate(|_| false)).unwrap();
        assert!(!table.gate("select_item", &args));
    }

    #[test]
    fn reset_restores_defaults_without_touching_other_slots() {
        let mut table = table();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        table
            .set("add_item", Handler::notify(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        table.set("select_item", Handler::gate(|_| false)).unwrap();

        table.reset_slot("select_item").unwrap();
        let args = CallbackArgs::bare("List", Dom::new().root());
        assert!(table.gate("select_item", &args));
        table.notify("add_item", &args);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        table.reset();
        table.notify("add_item", &args);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registry_resolution_is_strict() {
        let registry = CallbackRegistry::new();
        assert!(matches!(
            registry.resolve("nothing").unwrap_err(),
            UiError::VariableDoesNotExist { .. }
        ));

        registry.register_notify("something", |_| {});
        assert!(registry.resolve("something").is_ok());
        assert!(registry.unregister("something"));
        assert!(registry.resolve("something").is_err());
    }
}
