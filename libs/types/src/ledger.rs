//! The room ledger and the booking algorithm
//!
//! The ledger is the unit every transport copies between processes. Callers
//! mutate it only while holding the gate; the methods here are plain value
//! transformations with no synchronization of their own.

use crate::errors::LedgerError;
use crate::pool::{DoubleRooms, Occupant, SingleRooms};
use crate::request::{BookingOutcome, ClientRequest};
use crate::room::RoomStatus;

/// Occupancy of every room in the hotel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoomLedger {
    pub singles: SingleRooms,
    pub doubles: DoubleRooms,
}

impl RoomLedger {
    /// Ledger with every room free
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a room for `request`.
    ///
    /// Single rooms are always tried first, lowest index first. Only when
    /// none is free are double rooms scanned, where the first room that is
    /// either free or half occupied by the same gender wins.
    pub fn claim(&mut self, request: &ClientRequest) -> BookingOutcome {
        let occupant = Occupant::from(request);

        if let Some(index) = self.singles.claim(occupant) {
            return BookingOutcome::Single(index);
        }

        match self.doubles.claim(occupant) {
            Some(index) => BookingOutcome::Double(index),
            None => BookingOutcome::None,
        }
    }

    /// Undo a claim made by `request`. Returns the room's new status, or
    /// `None` when the outcome held no room.
    pub fn release(
        &mut self,
        request: &ClientRequest,
        outcome: BookingOutcome,
    ) -> Result<Option<RoomStatus>, LedgerError> {
        let occupant = Occupant::from(request);
        match outcome {
            BookingOutcome::None => Ok(None),
            BookingOutcome::Single(index) => self.singles.release(index, occupant).map(Some),
            BookingOutcome::Double(index) => self.doubles.release(index, occupant).map(Some),
        }
    }

    /// Verify every room's status against its recorded occupants.
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        self.singles.check_invariants()?;
        self.doubles.check_invariants()
    }

    pub fn free_rooms(&self) -> usize {
        self.singles.free_count() + self.doubles.free_count()
    }

    /// True when no request of either gender could be admitted.
    pub fn is_fully_booked(&self) -> bool {
        self.singles.free_count() == 0 && self.doubles.statuses().all(|s| s == RoomStatus::Full)
    }
}
