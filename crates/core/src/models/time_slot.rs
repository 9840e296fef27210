use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{BookingError, BookingResult},
    overlap::Interval,
};

/// Kind of coaching session a slot can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// Regular paid session, 55 minutes.
    Normal,
    /// Free assessment session, 25 minutes.
    Bilan,
}

impl SessionType {
    pub const ALL: [SessionType; 2] = [SessionType::Normal, SessionType::Bilan];

    pub fn duration_minutes(&self) -> i32 {
        match self {
            SessionType::Normal => 55,
            SessionType::Bilan => 25,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes()))
    }

    pub fn is_free(&self) -> bool {
        matches!(self, SessionType::Bilan)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Normal => "normal",
            SessionType::Bilan => "bilan",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(SessionType::Normal),
            "bilan" => Ok(SessionType::Bilan),
            other => Err(BookingError::Validation(format!(
                "Invalid session type '{}', expected 'normal' or 'bilan'",
                other
            ))),
        }
    }
}

/// Persisted status of a slot.
///
/// `Overlapping` only exists for display and for rows written by older
/// versions; the engine treats it exactly like `Booked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Booked,
    Overlapping,
    Unavailable,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Booked => "booked",
            SlotStatus::Overlapping => "overlapping",
            SlotStatus::Unavailable => "unavailable",
        }
    }

    pub fn is_bookable(&self) -> bool {
        matches!(self, SlotStatus::Available)
    }

    /// Held by a reservation, directly or through an overlapping one.
    pub fn is_blocking(&self) -> bool {
        matches!(self, SlotStatus::Booked | SlotStatus::Overlapping)
    }

    pub fn is_deletable(&self) -> bool {
        matches!(self, SlotStatus::Available)
    }

    pub fn can_transition_to(&self, next: SlotStatus) -> bool {
        use SlotStatus::*;
        match (self, next) {
            (Available, Booked) | (Available, Unavailable) => true,
            (Unavailable, Available) => true,
            // release, or relink to another reservation
            (Booked | Overlapping, Available) | (Booked | Overlapping, Booked) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(SlotStatus::Available),
            "booked" => Ok(SlotStatus::Booked),
            "overlapping" => Ok(SlotStatus::Overlapping),
            "unavailable" => Ok(SlotStatus::Unavailable),
            other => Err(BookingError::Validation(format!(
                "Unknown slot status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub coach_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub session_type: SessionType,
    pub duration_minutes: i32,
    pub status: SlotStatus,
    pub is_free: bool,
    pub reservation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TimeSlot {
    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start_time)
    }

    pub fn is_past(&self, now: NaiveDateTime) -> bool {
        self.starts_at() < now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSlotsRequest {
    pub start_date: NaiveDate,
    /// Defaults to `start_date`.
    pub end_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub session_types: Vec<SessionType>,
    pub repeat_weeks: Option<u32>,
    /// Empty means every day of the range.
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSlotsResponse {
    pub created: Vec<TimeSlot>,
    /// Candidates skipped because an identical slot was already stored.
    pub existing: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSlotsQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    #[serde(flatten)]
    pub slot: TimeSlot,
    pub display_status: SlotStatus,
    pub is_past: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteSlotsRequest {
    pub slot_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkDeleteReport {
    pub deleted: Vec<Uuid>,
    /// Slots that exist but are booked or disabled.
    pub not_deletable: Vec<Uuid>,
    pub missing: Vec<Uuid>,
    /// Slots left in place after a storage failure during per-row fallback.
    pub failed: Vec<Uuid>,
    /// True when the single-transaction delete timed out and rows were
    /// processed one by one.
    pub degraded: bool,
}
