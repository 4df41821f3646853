//! Error types for parsing in spotlens-types.

use thiserror::Error;

/// Errors that can occur when parsing spotlens domain values from text.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// A string did not name any variant of the target enum.
    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant {
        /// Name of the enum being parsed (e.g. "difficulty").
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

impl ParseError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }
}

/// Result type alias using spotlens-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
