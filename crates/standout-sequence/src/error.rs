//! Error types for the sequence crate.

use thiserror::Error;

/// Errors raised by sequence construction and consumption.
///
/// Argument checks fail when the operator is called; consumption errors
/// fail when the sequence is consumed. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// An argument was rejected before any work was deferred.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// Positional access past the end of the sequence.
    #[error("index {index} is out of range")]
    IndexOutOfRange { index: usize },

    /// The operation needs at least one element.
    #[error("sequence contains no elements")]
    EmptySequence,

    /// The operation needs exactly one element but found more.
    #[error("sequence contains more than one element")]
    MultipleElements,

    /// The operation is not available on this kind of sequence.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
}

impl SequenceError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type for sequence operations.
pub type Result<T> = std::result::Result<T, SequenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            SequenceError::invalid_argument("size", "must be positive").to_string(),
            "invalid argument 'size': must be positive"
        );
        assert_eq!(
            SequenceError::IndexOutOfRange { index: 7 }.to_string(),
            "index 7 is out of range"
        );
        assert_eq!(
            SequenceError::UnsupportedOperation("element_at on an ordered sequence").to_string(),
            "unsupported operation: element_at on an ordered sequence"
        );
    }
}
