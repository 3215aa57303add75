//! Fixed-size byte layout of the room ledger

use crate::error::{ProtocolError, ProtocolResult};
use bytes::{Buf, BufMut};
use hotel_types::{
    ClientId, DoubleRooms, Gender, Occupant, Room, RoomLedger, RoomStatus, SingleRooms,
    MAX_OCCUPANTS, SINGLE_ROOMS_COUNT, TOTAL_ROOMS_COUNT,
};

/// Marker written to both fields of an empty occupant slot
pub const VACANT_SLOT: i32 = -1;

const STATUS_BLOCK_SIZE: usize = TOTAL_ROOMS_COUNT * 4;
const SLOT_SIZE: usize = 8;
const OCCUPANT_BLOCK_SIZE: usize = TOTAL_ROOMS_COUNT * MAX_OCCUPANTS * SLOT_SIZE;

/// Encoded size of one ledger in bytes
pub const LEDGER_WIRE_SIZE: usize = STATUS_BLOCK_SIZE + OCCUPANT_BLOCK_SIZE;

/// Write `ledger` as exactly [`LEDGER_WIRE_SIZE`] bytes.
pub fn encode_ledger<B: BufMut>(ledger: &RoomLedger, buf: &mut B) {
    for status in ledger.singles.statuses().chain(ledger.doubles.statuses()) {
        buf.put_i32_le(status.into());
    }

    let rooms = ledger.singles.rooms().iter().chain(ledger.doubles.rooms().iter());
    for room in rooms {
        for slot in room.slots() {
            match slot {
                Some(occupant) => {
                    buf.put_i32_le(occupant.client_id.0);
                    buf.put_i32_le(occupant.gender.into());
                }
                None => {
                    buf.put_i32_le(VACANT_SLOT);
                    buf.put_i32_le(VACANT_SLOT);
                }
            }
        }
    }
}

/// Read one ledger, consuming [`LEDGER_WIRE_SIZE`] bytes.
///
/// Only the encoding is validated here; whether statuses agree with their
/// occupants is [`RoomLedger::check_invariants`]' business.
pub fn decode_ledger<B: Buf>(buf: &mut B) -> ProtocolResult<RoomLedger> {
    if buf.remaining() < LEDGER_WIRE_SIZE {
        return Err(ProtocolError::message_too_small(
            LEDGER_WIRE_SIZE,
            buf.remaining(),
            "room ledger",
        ));
    }

    let mut statuses = [RoomStatus::Free; TOTAL_ROOMS_COUNT];
    for (index, status) in statuses.iter_mut().enumerate() {
        let value = buf.get_i32_le();
        *status = RoomStatus::try_from(value)
            .map_err(|_| ProtocolError::InvalidStatus { index, value })?;
    }

    let mut slots: [[Option<Occupant>; MAX_OCCUPANTS]; TOTAL_ROOMS_COUNT] =
        [[None; MAX_OCCUPANTS]; TOTAL_ROOMS_COUNT];
    for (index, room_slots) in slots.iter_mut().enumerate() {
        for slot in room_slots.iter_mut() {
            let client_id = buf.get_i32_le();
            let gender = buf.get_i32_le();
            if gender == VACANT_SLOT {
                continue;
            }
            let gender = Gender::try_from(gender).map_err(|_| {
                ProtocolError::invalid_gender(gender, format!("occupant slot of room {index}"))
            })?;
            *slot = Some(Occupant {
                client_id: ClientId(client_id),
                gender,
            });
        }
    }

    let singles = SingleRooms::from_rooms(std::array::from_fn(|i| {
        Room::new(statuses[i], slots[i])
    }));
    let doubles = DoubleRooms::from_rooms(std::array::from_fn(|i| {
        let index = SINGLE_ROOMS_COUNT + i;
        Room::new(statuses[index], slots[index])
    }));

    Ok(RoomLedger { singles, doubles })
}
