//! # Hotel Types
//!
//! Shared data model for the hotel allocation system: room statuses, client
//! requests, occupancy policies and the room ledger that every process
//! reads and mutates under the gate.
//!
//! ## Design
//!
//! - **Whole-ledger snapshots**: a [`RoomLedger`] is a plain value. Transports
//!   copy it in and out as one unit, so no index is ever half-updated.
//! - **One pool, two policies**: single and double rooms are the same
//!   [`RoomPool`] parameterized by an [`OccupancyPolicy`] ([`Exclusive`] or
//!   [`SharedByCategory`]).
//! - **Explicit occupants**: every room records who is in it, so releasing a
//!   shared room knows exactly which occupant stays.
//!
//! ## Quick Start
//! ```rust
//! use hotel_types::{BookingOutcome, ClientId, ClientRequest, Gender, RoomLedger, RoomStatus};
//!
//! let mut ledger = RoomLedger::new();
//! let request = ClientRequest::new(ClientId(1), Gender::Male, 5);
//!
//! let outcome = ledger.claim(&request);
//! assert_eq!(outcome, BookingOutcome::Single(0));
//! assert_eq!(ledger.singles.status(0), Some(RoomStatus::Full));
//!
//! ledger.release(&request, outcome).unwrap();
//! assert_eq!(ledger.singles.status(0), Some(RoomStatus::Free));
//! ```

pub mod errors;
pub mod ledger;
pub mod pool;
pub mod request;
pub mod room;

pub use errors::LedgerError;
pub use ledger::RoomLedger;
pub use pool::{
    DoubleRooms, Exclusive, Occupant, OccupancyPolicy, Room, RoomPool, SharedByCategory,
    SingleRooms, MAX_OCCUPANTS,
};
pub use request::{BookingOutcome, ClientId, ClientRequest};
pub use room::{Gender, RoomKind, RoomStatus};

/// Number of single rooms in the hotel
pub const SINGLE_ROOMS_COUNT: usize = 10;

/// Number of double rooms in the hotel
pub const DOUBLE_ROOMS_COUNT: usize = 15;

/// Total number of rooms tracked by the ledger
pub const TOTAL_ROOMS_COUNT: usize = SINGLE_ROOMS_COUNT + DOUBLE_ROOMS_COUNT;
