//! Error types for the styling system.

/// Result type alias for style operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the styling system.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A theme declared properties outside the allow-list.
    ///
    /// Carries every offending key so a misconfigured theme can be fixed in
    /// one pass.
    #[error("theme property illegal: {}", properties.join(", "))]
    IllegalProperty {
        /// The rejected property keys.
        properties: Vec<String>,
    },

    /// A JSON theme document did not have the expected shape.
    #[error("invalid theme document: {message}")]
    InvalidDocument {
        /// What was wrong with the document.
        message: String,
    },
}

impl Error {
    /// Create an [`Error::IllegalProperty`] from the offending keys.
    pub fn illegal_property(properties: Vec<String>) -> Self {
        Self::IllegalProperty { properties }
    }

    /// Create an [`Error::InvalidDocument`].
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }
}
