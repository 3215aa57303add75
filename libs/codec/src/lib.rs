//! # Hotel Codec
//!
//! Byte-level rules shared by every process in the hotel system:
//!
//! - **Ledger layout**: the fixed-size encoding of a [`RoomLedger`] used both
//!   inside the shared mapping and as the payload of brokered frames
//! - **Brokered frames**: `{tag: i32, ledger}` with `GET = 1` and `SET = 2`
//! - **Handoff record**: the three-integer client record the supervisor
//!   places in the shared mapping for the next agent
//! - **Client queue**: the whitespace-separated text source of client records
//!
//! ## Ledger Layout
//!
//! ```text
//! ┌────────────────────────┬──────────────────────────┬──────────────────────────────────────┐
//! │ single statuses (10×i32)│ double statuses (15×i32) │ occupant slots (25 rooms × 2 × 2×i32)│
//! └────────────────────────┴──────────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! Statuses come first in declaration order (`Free=0`, `OccupiedByMale=1`,
//! `OccupiedByFemale=2`, `Full=3`). Each occupant slot is `(client_id, gender)`
//! with `(-1, -1)` marking a vacant slot. Every integer is little-endian.
//!
//! A brokered frame is therefore 504 bytes. The first 104 bytes (tag and
//! statuses) match the status-only frame, but a peer that speaks only that
//! shorter frame cannot exchange ledgers with this codec: its reads stop
//! short of [`FRAME_SIZE`] and its SETs fail to decode.
//!
//! [`RoomLedger`]: hotel_types::RoomLedger

pub mod error;
pub mod layout;
pub mod queue;
pub mod wire;

pub use error::{ProtocolError, ProtocolResult, QueueError};
pub use layout::{decode_ledger, encode_ledger, LEDGER_WIRE_SIZE, VACANT_SLOT};
pub use queue::ClientQueue;
pub use wire::{
    decode_request, encode_request, FrameTag, LedgerFrame, FRAME_SIZE, REQUEST_WIRE_SIZE,
};
