//! Signal/slot system for Casement.
//!
//! A type-safe observer mechanism: a [`Signal`] is emitted when state
//! changes, and connected slots (closures) are invoked in response. The
//! toolkit's execution model is strictly single-threaded and cooperative,
//! so every connection is invoked directly on the emitting call stack; there
//! is no queued or cross-thread delivery.
//!
//! # Example
//!
//! ```
//! use casement_core::Signal;
//!
//! let changed = Signal::<String>::new();
//! let id = changed.connect(|text| {
//!     println!("changed to: {text}");
//! });
//! changed.emit("hello".to_string());
//! changed.disconnect(id);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via
    /// [`Signal::disconnect`].
    pub struct ConnectionId;
}

/// Internal storage for a single connection.
struct Connection<Args> {
    slot: Arc<dyn Fn(&Args) + Send + Sync>,
}

/// A type-safe signal with any number of connected slots.
///
/// # Type Parameter
///
/// - `Args`: the argument type passed to connected slots. Use `()` for
///   signals with no payload, or a tuple for several values.
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    /// Whether emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a [`ConnectionId`] that can be used to disconnect later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Connection {
            slot: Arc::new(slot),
        })
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Block or unblock signal emission.
    ///
    /// While blocked, `emit()` does nothing. Useful during initialization or
    /// batch updates to prevent cascading notifications.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check whether emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking every connected slot with `args`.
    ///
    /// Slots are invoked outside the connection lock, so a slot may connect
    /// or disconnect during emission; changes take effect on the next emit.
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "casement_core::signal", "signal blocked, skipping emit");
            return;
        }

        let slots: Vec<Arc<dyn Fn(&Args) + Send + Sync>> = self
            .connections
            .lock()
            .iter()
            .map(|(_, conn)| conn.slot.clone())
            .collect();
        tracing::trace!(
            target: "casement_core::signal",
            connection_count = slots.len(),
            "emitting signal"
        );

        for slot in slots {
            slot(&args);
        }
    }
}

static_assertions::assert_impl_all!(Signal<u32>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn emit_invokes_connected_slots() {
        let signal = Signal::<u32>::new();
        let hits = Arc::new(AtomicU32::new(0));

        let h = hits.clone();
        signal.connect(move |n| {
            h.fetch_add(*n, Ordering::SeqCst);
        });

        signal.emit(2);
        signal.emit(3);
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn disconnect_removes_slot() {
        let signal = Signal::<()>::new();
        let hits = Arc::new(AtomicU32::new(0));

        let h = hits.clone();
        let id = signal.connect(move |()| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(());
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blocked_signal_does_not_fire() {
        let signal = Signal::<()>::new();
        let hits = Arc::new(AtomicU32::new(0));

        let h = hits.clone();
        signal.connect(move |()| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        signal.set_blocked(true);
        signal.emit(());
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        signal.set_blocked(false);
        signal.emit(());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn slot_may_disconnect_itself_during_emit() {
        let signal = Arc::new(Signal::<()>::new());
        let hits = Arc::new(AtomicU32::new(0));

        let s = signal.clone();
        let h = hits.clone();
        let id = Arc::new(Mutex::new(None::<ConnectionId>));
        let id2 = id.clone();
        let conn = signal.connect(move |()| {
            h.fetch_add(1, Ordering::SeqCst);
            if let Some(own) = *id2.lock() {
                s.disconnect(own);
            }
        });
        *id.lock() = Some(conn);

        signal.emit(());
        signal.emit(());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
