//! # Slot Generation
//!
//! Candidate slots are laid out on a fixed 30-minute cadence per session type.
//! A candidate is emitted only when the whole session fits in the window, so
//! normal slots starting on the hour and on the half hour coexist, and bilan
//! slots follow the same cadence independently.
//!
//! Generation is pure and deterministic; inserting the result is idempotent
//! in the store, so re-running over a populated range creates nothing new.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{BookingError, BookingResult},
    models::time_slot::{GenerateSlotsRequest, SessionType},
};

pub const CADENCE_MINUTES: u32 = 30;

/// Upper bound on the number of distinct dates one request may cover.
pub const MAX_DATES_PER_REQUEST: usize = 366;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub session_type: SessionType,
}

impl CandidateSlot {
    pub fn duration_minutes(&self) -> i32 {
        self.session_type.duration_minutes()
    }

    pub fn is_free(&self) -> bool {
        self.session_type.is_free()
    }
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_of(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// Candidate slots for one date and window.
///
/// Rejects an empty or inverted window and a window that starts in the past.
/// A window shorter than every requested duration yields an empty list.
pub fn generate(
    date: NaiveDate,
    window_start: NaiveTime,
    window_end: NaiveTime,
    session_types: &[SessionType],
    now: NaiveDateTime,
) -> BookingResult<Vec<CandidateSlot>> {
    if window_end <= window_start {
        return Err(BookingError::Validation(format!(
            "Window end {} must be after window start {}",
            window_end, window_start
        )));
    }
    if session_types.is_empty() {
        return Err(BookingError::Validation(
            "At least one session type is required".to_string(),
        ));
    }
    if date.and_time(window_start) < now {
        return Err(BookingError::Validation(format!(
            "Cannot generate slots in the past ({} {})",
            date, window_start
        )));
    }

    let start = minutes_of(window_start);
    let end = minutes_of(window_end);

    let mut seen = Vec::with_capacity(session_types.len());
    let mut slots = Vec::new();
    for session_type in session_types {
        if seen.contains(session_type) {
            continue;
        }
        seen.push(*session_type);

        let duration = session_type.duration_minutes() as u32;
        let mut cursor = start;
        while cursor + duration <= end {
            if let (Some(start_time), Some(end_time)) = (time_of(cursor), time_of(cursor + duration)) {
                slots.push(CandidateSlot {
                    date,
                    start_time,
                    end_time,
                    session_type: *session_type,
                });
            }
            cursor += CADENCE_MINUTES;
        }
    }

    Ok(slots)
}

/// Dates covered by a generation request: the inclusive date range filtered
/// by weekday, then repeated weekly `repeat_weeks` more times.
pub fn expand_dates(request: &GenerateSlotsRequest) -> BookingResult<Vec<NaiveDate>> {
    let end_date = request.end_date.unwrap_or(request.start_date);
    if end_date < request.start_date {
        return Err(BookingError::Validation(format!(
            "End date {} is before start date {}",
            end_date, request.start_date
        )));
    }

    let span = (end_date - request.start_date).num_days() as usize + 1;
    let repeats = request.repeat_weeks.unwrap_or(0) as usize;
    if span.saturating_mul(repeats + 1) > MAX_DATES_PER_REQUEST * 7 {
        return Err(BookingError::Validation(
            "Requested date range is too large".to_string(),
        ));
    }

    let base: Vec<NaiveDate> = request
        .start_date
        .iter_days()
        .take(span)
        .filter(|d| request.days_of_week.is_empty() || request.days_of_week.contains(&d.weekday()))
        .collect();

    let mut dates = BTreeSet::new();
    for week in 0..=repeats {
        let offset = Duration::weeks(week as i64);
        for date in &base {
            let shifted = date.checked_add_signed(offset).ok_or_else(|| {
                BookingError::Validation("Requested date range is out of bounds".to_string())
            })?;
            dates.insert(shifted);
        }
    }

    if dates.len() > MAX_DATES_PER_REQUEST {
        return Err(BookingError::Validation(format!(
            "A single request may cover at most {} dates",
            MAX_DATES_PER_REQUEST
        )));
    }

    Ok(dates.into_iter().collect())
}

/// Candidate slots for every date of a generation request, ordered by date.
pub fn generate_range(
    request: &GenerateSlotsRequest,
    now: NaiveDateTime,
) -> BookingResult<Vec<CandidateSlot>> {
    let dates = expand_dates(request)?;
    let mut slots = Vec::new();
    for date in dates {
        slots.extend(generate(
            date,
            request.start_time,
            request.end_time,
            &request.session_types,
            now,
        )?);
    }
    Ok(slots)
}
