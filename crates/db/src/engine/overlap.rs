//! OverlapResolver: the storage half of overlap handling. Rows are locked
//! here, the decisions come from `coachslot_core::overlap`.

use chrono::NaiveDate;
use coachslot_core::{
    errors::BookingResult,
    models::time_slot::TimeSlot,
    overlap::{plan_booking, plan_release, ActiveReservation, Interval, ReleaseScope},
};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    repositories::{reservation, time_slot},
    transaction::storage_error,
};

async fn lock_overlapping(
    conn: &mut PgConnection,
    coach_id: i64,
    date: NaiveDate,
    interval: Interval,
) -> BookingResult<Vec<TimeSlot>> {
    time_slot::find_overlapping_for_update(conn, coach_id, date, interval)
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(TimeSlot::try_from)
        .collect()
}

/// Serializes slot generation against bookings for the coach/date. Held
/// until the transaction ends.
pub async fn lock_schedule(
    conn: &mut PgConnection,
    coach_id: i64,
    date: NaiveDate,
    exclusive: bool,
) -> BookingResult<()> {
    time_slot::lock_schedule(conn, coach_id, date, exclusive)
        .await
        .map_err(storage_error)
}

/// Confirmed reservations of the coach/date with their session intervals.
pub async fn active_reservations(
    conn: &mut PgConnection,
    coach_id: i64,
    date: NaiveDate,
    exclude: Option<Uuid>,
) -> BookingResult<Vec<ActiveReservation>> {
    let rows = reservation::get_active_reservations_for_day(conn, coach_id, date, exclude)
        .await
        .map_err(storage_error)?;

    rows.into_iter()
        .map(|row| -> BookingResult<ActiveReservation> {
            let interval = Interval::for_session(row.time, row.session_type.parse()?)?;
            Ok(ActiveReservation {
                id: row.id,
                interval,
            })
        })
        .collect()
}

/// Books every available slot of the coach/date intersecting `interval`
/// for `reservation_id`. Returns the number of slots changed.
pub async fn mark_overlapping(
    conn: &mut PgConnection,
    coach_id: i64,
    date: NaiveDate,
    interval: Interval,
    reservation_id: Uuid,
) -> BookingResult<u64> {
    let slots = lock_overlapping(conn, coach_id, date, interval).await?;
    let plan = plan_booking(&slots, interval, reservation_id);

    let affected = time_slot::apply_transitions(conn, &plan)
        .await
        .map_err(storage_error)?;

    tracing::debug!(
        coach_id, %date, %reservation_id, affected,
        "Marked overlapping slots as booked"
    );
    Ok(affected)
}

/// Releases the slots held through `released`. Slots still intersecting
/// another confirmed reservation are re-linked to it instead of freed.
pub async fn free_overlapping(
    conn: &mut PgConnection,
    coach_id: i64,
    date: NaiveDate,
    interval: Interval,
    released: Uuid,
    scope: ReleaseScope,
) -> BookingResult<u64> {
    let slots = lock_overlapping(conn, coach_id, date, interval).await?;
    let others = active_reservations(conn, coach_id, date, Some(released)).await?;
    let plan = plan_release(&slots, interval, released, &others, scope);

    let affected = time_slot::apply_transitions(conn, &plan)
        .await
        .map_err(storage_error)?;

    tracing::debug!(
        coach_id, %date, reservation_id = %released, affected,
        include_past = scope.include_past,
        "Released overlapping slots"
    );
    Ok(affected)
}
