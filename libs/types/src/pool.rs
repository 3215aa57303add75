//! Room pools and occupancy policies
//!
//! Single and double rooms share one search/claim/release implementation,
//! [`RoomPool`], and differ only in their [`OccupancyPolicy`]:
//!
//! - [`Exclusive`]: one occupant, gender irrelevant (`Free` ⇄ `Full`)
//! - [`SharedByCategory`]: up to two occupants of the same gender
//!   (`Free` → `OccupiedBy<g>` → `Full` and back down)
//!
//! Every room also records its occupants in explicit slots. Statuses drive
//! admission; slots drive release, so a shared room always knows which
//! occupant remains when the other one leaves.

use crate::errors::LedgerError;
use crate::request::{ClientId, ClientRequest};
use crate::room::{Gender, RoomKind, RoomStatus};
use crate::{DOUBLE_ROOMS_COUNT, SINGLE_ROOMS_COUNT};
use std::fmt;
use std::marker::PhantomData;

/// Occupant slots carried by every room (single rooms use the first only)
pub const MAX_OCCUPANTS: usize = 2;

/// Pool of single rooms
pub type SingleRooms = RoomPool<Exclusive, SINGLE_ROOMS_COUNT>;

/// Pool of double rooms
pub type DoubleRooms = RoomPool<SharedByCategory, DOUBLE_ROOMS_COUNT>;

/// A client currently staying in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Occupant {
    pub client_id: ClientId,
    pub gender: Gender,
}

impl From<&ClientRequest> for Occupant {
    fn from(request: &ClientRequest) -> Self {
        Self {
            client_id: request.id,
            gender: request.gender,
        }
    }
}

/// One room: its status plus the occupants it currently holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Room {
    status: RoomStatus,
    slots: [Option<Occupant>; MAX_OCCUPANTS],
}

impl Room {
    pub const VACANT: Room = Room {
        status: RoomStatus::Free,
        slots: [None; MAX_OCCUPANTS],
    };

    /// Build a room from decoded parts. Consistency is checked separately
    /// by [`RoomPool::check_invariants`].
    pub fn new(status: RoomStatus, slots: [Option<Occupant>; MAX_OCCUPANTS]) -> Self {
        Self { status, slots }
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn slots(&self) -> &[Option<Occupant>; MAX_OCCUPANTS] {
        &self.slots
    }

    pub fn occupants(&self) -> impl Iterator<Item = &Occupant> {
        self.slots.iter().flatten()
    }

    pub fn holds(&self, client_id: ClientId) -> bool {
        self.occupants().any(|o| o.client_id == client_id)
    }

    fn seat(&mut self, occupant: Occupant, capacity: usize) {
        if let Some(slot) = self.slots[..capacity].iter_mut().find(|s| s.is_none()) {
            *slot = Some(occupant);
        }
    }

    fn unseat(&mut self, client_id: ClientId) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|s| matches!(s, Some(o) if o.client_id == client_id))
        {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }
}

/// Admission and release rules for one kind of room
pub trait OccupancyPolicy:
    fmt::Debug + Clone + Copy + Default + PartialEq + Eq + Send + Sync + 'static
{
    const KIND: RoomKind;
    const CAPACITY: usize;

    /// Status the room takes after admitting a client of `gender`, or
    /// `None` if the client cannot be admitted.
    fn admit(status: RoomStatus, gender: Gender) -> Option<RoomStatus>;

    /// Status derived from the occupants still recorded in the room.
    /// Only called when at least one occupant remains.
    fn settle(room: &Room) -> RoomStatus;

    /// Status-only release transition, used when the slots cannot tell who
    /// stays behind.
    fn vacate(status: RoomStatus, gender: Gender) -> RoomStatus;

    /// Check that the room's status agrees with its recorded occupants.
    fn check(room: &Room) -> Result<(), String>;
}

/// One occupant per room
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exclusive;

impl OccupancyPolicy for Exclusive {
    const KIND: RoomKind = RoomKind::Single;
    const CAPACITY: usize = 1;

    fn admit(status: RoomStatus, _gender: Gender) -> Option<RoomStatus> {
        status.is_free().then_some(RoomStatus::Full)
    }

    fn settle(_room: &Room) -> RoomStatus {
        RoomStatus::Full
    }

    fn vacate(_status: RoomStatus, _gender: Gender) -> RoomStatus {
        RoomStatus::Free
    }

    fn check(room: &Room) -> Result<(), String> {
        let count = room.occupants().count();
        match room.status {
            RoomStatus::OccupiedByMale | RoomStatus::OccupiedByFemale => {
                Err("single rooms are never half occupied".to_string())
            }
            RoomStatus::Free if count > 0 => Err(format!("free room records {count} occupants")),
            _ if count > Self::CAPACITY => Err(format!("{count} occupants in a single room")),
            _ => Ok(()),
        }
    }
}

/// Up to two occupants of the same gender category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SharedByCategory;

impl OccupancyPolicy for SharedByCategory {
    const KIND: RoomKind = RoomKind::Double;
    const CAPACITY: usize = 2;

    fn admit(status: RoomStatus, gender: Gender) -> Option<RoomStatus> {
        match status {
            RoomStatus::Free => Some(RoomStatus::occupied_by(gender)),
            s if s.category() == Some(gender) => Some(RoomStatus::Full),
            _ => None,
        }
    }

    fn settle(room: &Room) -> RoomStatus {
        let mut occupants = room.occupants();
        match (occupants.next(), occupants.next()) {
            (Some(_), Some(_)) => RoomStatus::Full,
            (Some(only), None) => RoomStatus::occupied_by(only.gender),
            _ => RoomStatus::Free,
        }
    }

    fn vacate(status: RoomStatus, gender: Gender) -> RoomStatus {
        match status {
            RoomStatus::Full => RoomStatus::occupied_by(gender),
            _ => RoomStatus::Free,
        }
    }

    fn check(room: &Room) -> Result<(), String> {
        let count = room.occupants().count();
        let mut genders = room.occupants().map(|o| o.gender);
        let first = genders.next();
        if genders.any(|g| Some(g) != first) {
            return Err("occupants of different genders share the room".to_string());
        }

        match room.status {
            RoomStatus::Free if count > 0 => Err(format!("free room records {count} occupants")),
            RoomStatus::OccupiedByMale | RoomStatus::OccupiedByFemale => {
                if count > 1 {
                    Err(format!("half occupied room records {count} occupants"))
                } else if first.is_some() && first != room.status.category() {
                    Err("occupant gender differs from the room category".to_string())
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

/// Fixed-size, index-addressed pool of rooms sharing one policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomPool<P: OccupancyPolicy, const N: usize> {
    rooms: [Room; N],
    _policy: PhantomData<P>,
}

impl<P: OccupancyPolicy, const N: usize> Default for RoomPool<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OccupancyPolicy, const N: usize> RoomPool<P, N> {
    /// Pool with every room free
    pub fn new() -> Self {
        Self::from_rooms([Room::VACANT; N])
    }

    pub fn from_rooms(rooms: [Room; N]) -> Self {
        Self {
            rooms,
            _policy: PhantomData,
        }
    }

    pub fn rooms(&self) -> &[Room; N] {
        &self.rooms
    }

    pub fn get(&self, index: usize) -> Option<&Room> {
        self.rooms.get(index)
    }

    pub fn status(&self, index: usize) -> Option<RoomStatus> {
        self.rooms.get(index).map(Room::status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = RoomStatus> + '_ {
        self.rooms.iter().map(Room::status)
    }

    pub fn free_count(&self) -> usize {
        self.statuses().filter(|s| s.is_free()).count()
    }

    /// First-fit claim: the lowest-index room that admits the occupant.
    pub fn claim(&mut self, occupant: Occupant) -> Option<usize> {
        for (index, room) in self.rooms.iter_mut().enumerate() {
            if let Some(next) = P::admit(room.status, occupant.gender) {
                room.seat(occupant, P::CAPACITY);
                room.status = next;
                return Some(index);
            }
        }
        None
    }

    /// Remove `occupant` from the room at `index` and return its new status.
    pub fn release(&mut self, index: usize, occupant: Occupant) -> Result<RoomStatus, LedgerError> {
        let room = self
            .rooms
            .get_mut(index)
            .ok_or(LedgerError::RoomOutOfRange {
                kind: P::KIND,
                index,
                len: N,
            })?;

        let previous = room.status;
        room.unseat(occupant.client_id);
        room.status = if room.occupants().next().is_some() {
            P::settle(room)
        } else {
            P::vacate(previous, occupant.gender)
        };

        Ok(room.status)
    }

    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        for (index, room) in self.rooms.iter().enumerate() {
            P::check(room)
                .map_err(|reason| LedgerError::inconsistent(P::KIND, index, room.status, reason))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest(id: i32, gender: Gender) -> Occupant {
        Occupant {
            client_id: ClientId(id),
            gender,
        }
    }

    #[test]
    fn test_exclusive_pool_first_fit() {
        let mut pool: RoomPool<Exclusive, 3> = RoomPool::new();
        assert_eq!(pool.claim(guest(1, Gender::Male)), Some(0));
        assert_eq!(pool.claim(guest(2, Gender::Female)), Some(1));
        assert_eq!(pool.claim(guest(3, Gender::Male)), Some(2));
        assert_eq!(pool.claim(guest(4, Gender::Male)), None);

        assert_eq!(pool.release(1, guest(2, Gender::Female)), Ok(RoomStatus::Free));
        assert_eq!(pool.claim(guest(5, Gender::Female)), Some(1));
        assert!(pool.get(1).unwrap().holds(ClientId(5)));
    }

    #[test]
    fn test_shared_pool_matches_category_in_index_order() {
        let mut pool: RoomPool<SharedByCategory, 2> = RoomPool::new();
        assert_eq!(pool.claim(guest(1, Gender::Female)), Some(0));
        assert_eq!(pool.status(0), Some(RoomStatus::OccupiedByFemale));

        // a male cannot join room 0, so he opens room 1
        assert_eq!(pool.claim(guest(2, Gender::Male)), Some(1));
        assert_eq!(pool.status(1), Some(RoomStatus::OccupiedByMale));

        assert_eq!(pool.claim(guest(3, Gender::Female)), Some(0));
        assert_eq!(pool.status(0), Some(RoomStatus::Full));

        // room 0 is full and room 1 is male: no place for another female
        assert_eq!(pool.claim(guest(4, Gender::Female)), None);
        pool.check_invariants().unwrap();
    }

    #[test]
    fn test_shared_release_keeps_the_remaining_occupant() {
        let mut pool: RoomPool<SharedByCategory, 1> = RoomPool::new();
        pool.claim(guest(1, Gender::Male));
        pool.claim(guest(2, Gender::Male));

        assert_eq!(
            pool.release(0, guest(1, Gender::Male)),
            Ok(RoomStatus::OccupiedByMale)
        );
        let room = pool.get(0).unwrap();
        assert!(room.holds(ClientId(2)));
        assert!(!room.holds(ClientId(1)));

        assert_eq!(pool.release(0, guest(2, Gender::Male)), Ok(RoomStatus::Free));
        assert_eq!(pool.get(0).unwrap().occupants().count(), 0);
    }

    #[test]
    fn test_release_without_recorded_slots_uses_status_transition() {
        let rooms = [Room::new(RoomStatus::Full, [None, None])];
        let mut pool: RoomPool<SharedByCategory, 1> = RoomPool::from_rooms(rooms);

        assert_eq!(
            pool.release(0, guest(9, Gender::Female)),
            Ok(RoomStatus::OccupiedByFemale)
        );
        assert_eq!(pool.release(0, guest(8, Gender::Female)), Ok(RoomStatus::Free));
    }

    #[test]
    fn test_release_out_of_range() {
        let mut pool: RoomPool<Exclusive, 2> = RoomPool::new();
        let err = pool.release(5, guest(1, Gender::Male)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::RoomOutOfRange {
                kind: RoomKind::Single,
                index: 5,
                len: 2
            }
        );
    }

    #[test]
    fn test_invariant_check_rejects_mixed_genders() {
        let rooms = [Room::new(
            RoomStatus::Full,
            [Some(guest(1, Gender::Male)), Some(guest(2, Gender::Female))],
        )];
        let pool: RoomPool<SharedByCategory, 1> = RoomPool::from_rooms(rooms);
        assert!(matches!(
            pool.check_invariants(),
            Err(LedgerError::InconsistentRoom { index: 0, .. })
        ));
    }

    #[test]
    fn test_invariant_check_rejects_half_occupied_single() {
        let rooms = [Room::new(RoomStatus::OccupiedByMale, [None, None])];
        let pool: RoomPool<Exclusive, 1> = RoomPool::from_rooms(rooms);
        assert!(pool.check_invariants().is_err());
    }
}
