//! Allow-listed theming system for Casement.
//!
//! A theme is a nested mapping from selector to property declarations,
//! validated against a closed allow-list of recognized property names before
//! being serialized to CSS text. Fragments are named and individually
//! replaceable through [`StyleSheets`]; injecting the rendered text into a
//! live document is the host's responsibility.
//!
//! # Example
//!
//! ```
//! use casement_style::{Rule, StyleSheets, Theme, default_theme};
//!
//! let sheets = StyleSheets::new();
//! sheets.set("casement-theme", default_theme()).unwrap();
//!
//! // Override one widget's look in a separate fragment.
//! let accent = Theme::new().rule(
//!     ".w-list",
//!     Rule::new().nest("[w-item].select", Rule::new().declare("bgColor", "#3399ff30")),
//! );
//! sheets.set("app-accent", accent).unwrap();
//!
//! let css = sheets.render();
//! assert!(css.contains("background-color: #3399ff30"));
//! ```

mod error;
pub mod property;
mod sheets;
mod theme;

pub use error::{Error, Result};
pub use sheets::StyleSheets;
pub use theme::{Rule, Theme, default_theme};
