//! Ledger error types

use crate::room::{RoomKind, RoomStatus};
use thiserror::Error;

/// Errors raised when a ledger operation or invariant check fails
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// Room index outside the pool
    #[error("{kind} room index {index} out of range (pool has {len} rooms)")]
    RoomOutOfRange {
        kind: RoomKind,
        index: usize,
        len: usize,
    },

    /// Status and recorded occupants disagree
    #[error("{kind} room {index} is inconsistent: status {status:?}, {reason}")]
    InconsistentRoom {
        kind: RoomKind,
        index: usize,
        status: RoomStatus,
        reason: String,
    },
}

impl LedgerError {
    pub fn inconsistent(
        kind: RoomKind,
        index: usize,
        status: RoomStatus,
        reason: impl Into<String>,
    ) -> Self {
        Self::InconsistentRoom {
            kind,
            index,
            status,
            reason: reason.into(),
        }
    }
}
