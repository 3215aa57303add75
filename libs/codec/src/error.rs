//! Codec and queue errors

use thiserror::Error;

/// Errors decoding ledger bytes and brokered frames
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProtocolError {
    /// Buffer is shorter than the fixed-size structure it should hold
    #[error("Message too small: need {need} bytes, got {got} (context: {context})")]
    MessageTooSmall {
        need: usize,
        got: usize,
        context: String,
    },

    /// Frame tag is neither GET nor SET
    #[error("Unknown frame tag {tag}: expected 1 (GET) or 2 (SET)")]
    UnknownTag { tag: i32 },

    /// Room status outside 0..=3
    #[error("Invalid room status {value} at room {index}")]
    InvalidStatus { index: usize, value: i32 },

    /// Gender outside {0, 1}
    #[error("Invalid gender {value} ({context})")]
    InvalidGender { value: i32, context: String },

    /// Rent duration that does not fit an unsigned second count
    #[error("Invalid rent duration {value}")]
    InvalidDuration { value: i32 },

    /// Acknowledgment does not match what was sent
    #[error("Acknowledgment mismatch: {0}")]
    AckMismatch(String),
}

impl ProtocolError {
    pub fn message_too_small(need: usize, got: usize, context: impl Into<String>) -> Self {
        Self::MessageTooSmall {
            need,
            got,
            context: context.into(),
        }
    }

    pub fn invalid_gender(value: i32, context: impl Into<String>) -> Self {
        Self::InvalidGender {
            value,
            context: context.into(),
        }
    }
}

/// Result type for codec operations
pub type ProtocolResult<T> = std::result::Result<T, ProtocolError>;

/// Errors reading the client queue
///
/// Any of these ends the queue: the record that failed and everything after
/// it are never dispatched.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("IO error reading client queue: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed value '{token}' on line {line}: expected an integer")]
    Malformed { line: usize, token: String },

    #[error("Incomplete record at end of queue: {found} of 3 values")]
    Incomplete { found: usize },

    #[error("Invalid gender {value} on line {line}: expected 0 (male) or 1 (female)")]
    InvalidGender { line: usize, value: i32 },

    #[error("Negative rent duration {value} on line {line}")]
    NegativeDuration { line: usize, value: i32 },
}
