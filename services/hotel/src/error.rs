//! Service-level errors

use hotel_codec::QueueError;
use hotel_transport::TransportError;
use hotel_types::{ClientId, LedgerError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HotelError {
    /// Shared resources could not be created, attached or used
    #[error(transparent)]
    Transport(TransportError),

    /// The ledger disagreed with the agent's own booking
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Client queue unavailable: {0}")]
    Queue(#[from] QueueError),

    #[error("Failed to launch agent for client {client_id}: {source}")]
    Launch {
        client_id: ClientId,
        source: std::io::Error,
    },

    #[error("Missing agent parameter --{0}")]
    MissingParameter(&'static str),

    /// SIGTERM/SIGINT arrived before the work finished
    #[error("Terminated by signal")]
    Terminated,
}

impl From<TransportError> for HotelError {
    fn from(e: TransportError) -> Self {
        if e.is_cancelled() {
            Self::Terminated
        } else {
            Self::Transport(e)
        }
    }
}

impl HotelError {
    /// Process exit code; every failure, termination included, exits 1
    pub fn exit_code(&self) -> u8 {
        1
    }

    pub fn is_termination(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

pub type Result<T> = std::result::Result<T, HotelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_transport_wait_is_termination() {
        let err = HotelError::from(TransportError::cancelled("acquiring the gate"));
        assert!(err.is_termination());
        assert_eq!(err.exit_code(), 1);

        let err = HotelError::from(TransportError::setup("no ledger"));
        assert!(matches!(err, HotelError::Transport(_)));
        assert_eq!(err.exit_code(), 1);
    }
}
