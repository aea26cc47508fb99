//! Error types for identifier parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The identifier string is empty.
    #[error("ID cannot be empty")]
    Empty,

    /// The identifier contains whitespace.
    #[error("ID contains whitespace: '{0}'")]
    Whitespace(String),

    /// A fingerprint contains a non-hex character.
    #[error("invalid fingerprint '{value}': unexpected character '{found}'")]
    InvalidHex { value: String, found: char },

    /// A fingerprint is longer than a sha256 digest.
    #[error("invalid fingerprint: {len} characters exceeds {max}")]
    TooLong { len: usize, max: usize },
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }
}
