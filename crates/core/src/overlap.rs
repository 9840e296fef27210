//! # Overlap Planning
//!
//! Interval arithmetic and the pure half of the OverlapResolver. The database
//! layer locks the candidate rows, hands them to the planners below and writes
//! back exactly the transitions they return, all inside one transaction.
//!
//! Intervals are half-open, `[start, end)`: a slot ending at 08:25 and one
//! starting at 08:25 do not overlap.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    models::time_slot::{SessionType, SlotStatus, TimeSlot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Interval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> BookingResult<Self> {
        if end <= start {
            return Err(BookingError::Validation(format!(
                "Interval end {} must be after start {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Interval covered by a session of the given type starting at `start`.
    /// Sessions never cross midnight.
    pub fn for_session(start: NaiveTime, session_type: SessionType) -> BookingResult<Self> {
        let (end, wrapped) = start.overflowing_add_signed(session_type.duration());
        if wrapped != 0 {
            return Err(BookingError::Validation(format!(
                "A {} session starting at {} would end after midnight",
                session_type, start
            )));
        }
        Self::new(start, end)
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A status change the store must apply to one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTransition {
    pub slot_id: Uuid,
    pub status: SlotStatus,
    pub reservation_id: Option<Uuid>,
}

/// A confirmed reservation on the same coach/date, reduced to what the
/// planners need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveReservation {
    pub id: Uuid,
    pub interval: Interval,
}

/// Which slots a release may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseScope {
    pub now: NaiveDateTime,
    /// Admin corrections also free slots that already started.
    pub include_past: bool,
}

impl ReleaseScope {
    fn covers(&self, slot: &TimeSlot) -> bool {
        self.include_past || !slot.is_past(self.now)
    }
}

/// Every available slot intersecting `interval`, whatever its session type,
/// becomes booked by `reservation_id`.
pub fn plan_booking(
    slots: &[TimeSlot],
    interval: Interval,
    reservation_id: Uuid,
) -> Vec<SlotTransition> {
    slots
        .iter()
        .filter(|slot| slot.status.is_bookable() && slot.interval().overlaps(&interval))
        .map(|slot| SlotTransition {
            slot_id: slot.id,
            status: SlotStatus::Booked,
            reservation_id: Some(reservation_id),
        })
        .collect()
}

/// Frees the slots held through `released`.
///
/// A slot is considered held by the released reservation when it intersects
/// the released interval and its link is either `released`, missing (legacy
/// `overlapping` rows) or points at a reservation that is no longer active.
/// Such a slot goes back to `available` unless it still intersects another
/// active reservation, in which case it is re-linked to that one.
pub fn plan_release(
    slots: &[TimeSlot],
    interval: Interval,
    released: Uuid,
    others: &[ActiveReservation],
    scope: ReleaseScope,
) -> Vec<SlotTransition> {
    slots
        .iter()
        .filter(|slot| slot.status.is_blocking() && slot.interval().overlaps(&interval))
        .filter(|slot| match slot.reservation_id {
            Some(id) if id == released => true,
            Some(id) => !others.iter().any(|r| r.id == id),
            None => true,
        })
        .filter(|slot| scope.covers(slot))
        .map(|slot| match blocking_reservation(slot.interval(), others) {
            Some(holder) => SlotTransition {
                slot_id: slot.id,
                status: SlotStatus::Booked,
                reservation_id: Some(holder),
            },
            None => SlotTransition {
                slot_id: slot.id,
                status: SlotStatus::Available,
                reservation_id: None,
            },
        })
        .collect()
}

/// First active reservation intersecting `interval`, if any. Used to link a
/// freshly inserted slot or to re-link a released one.
pub fn blocking_reservation(interval: Interval, active: &[ActiveReservation]) -> Option<Uuid> {
    active
        .iter()
        .find(|r| r.interval.overlaps(&interval))
        .map(|r| r.id)
}

/// Display status of a booked slot: `overlapping` when the holding
/// reservation was made on a different slot.
pub fn display_status(slot: &TimeSlot, holder: Option<(NaiveTime, SessionType)>) -> SlotStatus {
    match (slot.status, holder) {
        (SlotStatus::Booked, Some((time, session_type)))
            if time != slot.start_time || session_type != slot.session_type =>
        {
            SlotStatus::Overlapping
        }
        (status, _) => status,
    }
}
