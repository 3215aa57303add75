//! Transport Error Types
//!
//! Failures of the shared IPC primitives: semaphores, the mapped ledger
//! region and the brokered FIFO channels.

use hotel_codec::ProtocolError;
use thiserror::Error;

/// Main transport error type
#[derive(Error, Debug)]
pub enum TransportError {
    /// A shared resource could not be created or attached
    #[error("Setup error: {message}")]
    Setup {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An OS-level read, write or semaphore call failed
    #[error("IO error: {message}: {source}")]
    Io {
        message: String,
        source: std::io::Error,
    },

    /// Bytes on a channel or in the mapping did not decode
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The peer end of a channel is gone
    #[error("Channel closed: {message}")]
    Closed { message: String },

    /// A blocking wait was abandoned because shutdown was requested
    #[error("Cancelled while {operation}")]
    Cancelled { operation: String },
}

impl TransportError {
    /// Create a setup error
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
            source: None,
        }
    }

    /// Create a setup error with source
    pub fn setup_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Setup {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create an IO error from `errno`
    pub fn last_os_error(message: impl Into<String>) -> Self {
        Self::io(message, std::io::Error::last_os_error())
    }

    /// Create a closed-channel error
    pub fn closed(message: impl Into<String>) -> Self {
        Self::Closed {
            message: message.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// True when the error only reports a shutdown request
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;
