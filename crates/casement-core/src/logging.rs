//! Logging facilities for Casement.
//!
//! The toolkit is instrumented with the `tracing` crate. No subscriber is
//! installed by the library; applications that want log output install one
//! themselves:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!     // ...
//! }
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core systems target.
    pub const CORE: &str = "casement_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "casement_core::signal";
    /// Timer system target.
    pub const TIMER: &str = "casement_core::timer";
    /// Document/element arena target.
    pub const DOM: &str = "casement::dom";
    /// Controller lifecycle target.
    pub const CONTROLLER: &str = "casement::controller";
    /// Scope/auto-discovery target.
    pub const SCOPE: &str = "casement::scope";
    /// Styling target.
    pub const STYLE: &str = "casement_style";
}
