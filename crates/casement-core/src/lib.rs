//! Core systems for Casement.
//!
//! This crate provides the foundational components of the Casement widget
//! toolkit:
//!
//! - **Error taxonomy**: the [`UiError`] type every toolkit operation
//!   reports through
//! - **Signal/Slot System**: type-safe observer notification, used for the
//!   document mutation stream and available to applications
//! - **Timers**: one-shot and repeating timers plus a trailing-edge
//!   [`Debouncer`] for coalesced change notification
//!
//! The execution model is strictly single-threaded and cooperative: all
//! work happens on the caller's stack in response to injected events or
//! timer pumps. Nothing here spawns threads.
//!
//! # Signal Example
//!
//! ```
//! use casement_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn = value_changed.connect(|value| {
//!     println!("value changed to {value}");
//! });
//! value_changed.emit(42);
//! value_changed.disconnect(conn);
//! ```

mod error;
pub mod logging;
pub mod signal;
mod timer;

pub use error::{Result, UiError};
pub use signal::{ConnectionId, Signal};
pub use timer::{Debouncer, TimerId, TimerKind, TimerManager};
