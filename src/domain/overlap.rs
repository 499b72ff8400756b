use serde::Serialize;

use super::reservation::{Reservation, StayInterval};
use crate::error::{HotelError, Result};

/// Outcome of a double-booking check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapCheck {
    pub room_id: String,
    pub conflict: bool,
    pub conflicting_reservation_id: Option<String>,
}

impl std::fmt::Display for OverlapCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.conflicting_reservation_id {
            Some(id) => write!(
                f,
                "Room {} is NOT available: conflicts with reservation {id}",
                self.room_id
            ),
            None => write!(f, "Room {} is available for these dates", self.room_id),
        }
    }
}

/// First reservation on `room_id` that holds the room during `proposed`.
///
/// Only blocking statuses count; checked-out and cancelled stays never
/// conflict.
pub fn find_conflict<'a, I>(
    existing: I,
    room_id: &str,
    proposed: &StayInterval,
) -> Option<&'a Reservation>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    existing.into_iter().find(|r| {
        r.room_id == room_id && r.blocks_room() && r.stay.overlaps(proposed)
    })
}

pub fn check_overlap<'a, I>(existing: I, room_id: &str, proposed: &StayInterval) -> OverlapCheck
where
    I: IntoIterator<Item = &'a Reservation>,
{
    let conflicting = find_conflict(existing, room_id, proposed);
    OverlapCheck {
        room_id: room_id.to_string(),
        conflict: conflicting.is_some(),
        conflicting_reservation_id: conflicting.map(|r| r.id.clone()),
    }
}

/// `Err(Conflict)` when the proposed stay would double-book the room.
pub fn ensure_no_conflict<'a, I>(
    existing: I,
    room_id: &str,
    proposed: &StayInterval,
) -> Result<()>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    match find_conflict(existing, room_id, proposed) {
        Some(conflicting) => Err(HotelError::Conflict {
            room_id: room_id.to_string(),
            reservation_id: conflicting.id.clone(),
        }),
        None => Ok(()),
    }
}
