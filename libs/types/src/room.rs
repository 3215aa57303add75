//! Room status and client gender

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

/// Client gender as carried by queue records and the wire format
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gender {
    Male = 0,
    Female = 1,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

/// Occupancy status of a single room
///
/// Encoded on the wire as an `i32` in declaration order. Single rooms only
/// ever use `Free` and `Full`; double rooms move through the whole set.
#[repr(i32)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoomStatus {
    #[default]
    Free = 0,
    OccupiedByMale = 1,
    OccupiedByFemale = 2,
    Full = 3,
}

impl RoomStatus {
    /// Status of a double room holding exactly one occupant of `gender`
    pub fn occupied_by(gender: Gender) -> Self {
        match gender {
            Gender::Male => RoomStatus::OccupiedByMale,
            Gender::Female => RoomStatus::OccupiedByFemale,
        }
    }

    /// Gender category recorded by a half-occupied room
    pub fn category(self) -> Option<Gender> {
        match self {
            RoomStatus::OccupiedByMale => Some(Gender::Male),
            RoomStatus::OccupiedByFemale => Some(Gender::Female),
            RoomStatus::Free | RoomStatus::Full => None,
        }
    }

    pub fn is_free(self) -> bool {
        self == RoomStatus::Free
    }
}

/// Which pool a room belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoomKind {
    Single,
    Double,
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomKind::Single => f.write_str("single"),
            RoomKind::Double => f.write_str("double"),
        }
    }
}
