//! Error types for Casement.
//!
//! Every fallible toolkit operation reports one of the variants below.
//! Validation errors are raised synchronously at the call site and are not
//! caught inside the toolkit; batch operations annotate the failing index
//! with [`UiError::Batch`] before rethrowing and do not roll back mutations
//! already applied.

use std::fmt;

/// The main error type for Casement operations.
#[derive(Debug)]
pub enum UiError {
    /// An argument failed a runtime type or shape check.
    ParameterMismatch {
        /// Description of the offending argument.
        what: String,
    },
    /// An index or handle resolved to no item within the caller's container.
    NotExistItem {
        /// Description of the missing item.
        what: String,
    },
    /// An index or handle resolved to no view within the caller's container.
    NotExistView {
        /// Description of the missing view.
        what: String,
    },
    /// A structurally required sub-part is absent.
    MissingVitalElement {
        /// Name of the missing part.
        what: String,
    },
    /// A named callback lookup failed in the registry.
    VariableDoesNotExist {
        /// The name that could not be resolved.
        name: String,
    },
    /// `set_callback` was called with a name outside the widget's slot set.
    ///
    /// Callback names are a fixed, closed contract per widget type.
    UnknownCallback {
        /// The widget type name.
        widget: &'static str,
        /// The rejected slot name.
        name: String,
    },
    /// A domain-specific invariant was violated.
    Custom {
        /// Short description of the violated invariant.
        context: String,
        /// Supporting detail.
        message: String,
    },
    /// A batch operation failed at the given element index.
    ///
    /// Entries before `index` have already been applied and stay applied.
    Batch {
        /// Zero-based index of the failing batch entry.
        index: usize,
        /// The underlying error.
        source: Box<UiError>,
    },
}

impl UiError {
    /// Create a [`UiError::ParameterMismatch`] from anything printable.
    pub fn parameter_mismatch(what: impl fmt::Display) -> Self {
        Self::ParameterMismatch {
            what: what.to_string(),
        }
    }

    /// Create a [`UiError::NotExistItem`] from anything printable.
    pub fn not_exist_item(what: impl fmt::Display) -> Self {
        Self::NotExistItem {
            what: what.to_string(),
        }
    }

    /// Create a [`UiError::NotExistView`] from anything printable.
    pub fn not_exist_view(what: impl fmt::Display) -> Self {
        Self::NotExistView {
            what: what.to_string(),
        }
    }

    /// Create a [`UiError::MissingVitalElement`].
    pub fn missing_vital_element(what: impl Into<String>) -> Self {
        Self::MissingVitalElement { what: what.into() }
    }

    /// Create a [`UiError::Custom`].
    pub fn custom(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Custom {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Wrap an error with the index of the failing batch entry.
    pub fn at_index(self, index: usize) -> Self {
        Self::Batch {
            index,
            source: Box::new(self),
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParameterMismatch { what } => {
                write!(f, "UI error: <{what}> parameter mismatch")
            }
            Self::NotExistItem { what } => write!(f, "UI error: <{what}> not exist item"),
            Self::NotExistView { what } => write!(f, "UI error: <{what}> not exist view"),
            Self::MissingVitalElement { what } => {
                write!(f, "UI error: <{what}> missing vital element")
            }
            Self::VariableDoesNotExist { name } => {
                write!(f, "UI error: <{name}> variable does not exist")
            }
            Self::UnknownCallback { widget, name } => {
                write!(f, "UI error: {widget} has no callback slot named '{name}'")
            }
            Self::Custom { context, message } => write!(f, "UI error: <{context}> {message}"),
            Self::Batch { index, source } => write!(f, "{source} #error index: {index}"),
        }
    }
}

impl std::error::Error for UiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Batch { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// A specialized Result type for Casement operations.
pub type Result<T> = std::result::Result<T, UiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_error_carries_index_and_source() {
        let err = UiError::parameter_mismatch("true").at_index(2);
        assert!(matches!(err, UiError::Batch { index: 2, .. }));
        let text = err.to_string();
        assert!(text.contains("parameter mismatch"));
        assert!(text.contains("#error index: 2"));
    }

    #[test]
    fn display_names_the_offender() {
        let err = UiError::VariableDoesNotExist {
            name: "onSelect".into(),
        };
        assert_eq!(err.to_string(), "UI error: <onSelect> variable does not exist");
    }
}
