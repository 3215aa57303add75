//! Client requests and booking outcomes

use crate::room::{Gender, RoomKind};
use std::fmt;
use std::time::Duration;

/// Client identifier as read from the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientId(pub i32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One client record handed to a booking agent
///
/// Immutable once read from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientRequest {
    pub id: ClientId,
    pub gender: Gender,
    /// Rental duration in rent units (seconds unless configured otherwise)
    pub rent_duration: u32,
}

impl ClientRequest {
    pub fn new(id: ClientId, gender: Gender, rent_duration: u32) -> Self {
        Self {
            id,
            gender,
            rent_duration,
        }
    }

    /// Wall-clock hold time for this request given the length of one rent unit
    pub fn hold_time(&self, rent_unit: Duration) -> Duration {
        rent_unit.saturating_mul(self.rent_duration)
    }
}

/// Result of one agent's room search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BookingOutcome {
    /// No room could be claimed ("out of service")
    None,
    Single(usize),
    Double(usize),
}

impl BookingOutcome {
    pub fn is_booked(&self) -> bool {
        !matches!(self, BookingOutcome::None)
    }

    pub fn room(&self) -> Option<(RoomKind, usize)> {
        match *self {
            BookingOutcome::None => None,
            BookingOutcome::Single(index) => Some((RoomKind::Single, index)),
            BookingOutcome::Double(index) => Some((RoomKind::Double, index)),
        }
    }
}

impl fmt::Display for BookingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.room() {
            None => f.write_str("none"),
            Some((kind, index)) => write!(f, "{},{}", kind, index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(BookingOutcome::None.to_string(), "none");
        assert_eq!(BookingOutcome::Single(3).to_string(), "single,3");
        assert_eq!(BookingOutcome::Double(0).to_string(), "double,0");
    }

    #[test]
    fn test_hold_time_scales_with_unit() {
        let request = ClientRequest::new(ClientId(7), Gender::Female, 5);
        assert_eq!(
            request.hold_time(Duration::from_secs(1)),
            Duration::from_secs(5)
        );
        assert_eq!(
            request.hold_time(Duration::from_millis(10)),
            Duration::from_millis(50)
        );
    }
}
