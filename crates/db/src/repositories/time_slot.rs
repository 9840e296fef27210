use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveTime};
use coachslot_core::{
    generator::CandidateSlot,
    models::time_slot::{SessionType, SlotStatus},
    overlap::{Interval, SlotTransition},
};
use eyre::Result;
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use crate::models::{DbSlotListing, DbTimeSlot};

/// Inserts a slot unless one with the same coach, date, start time and
/// session type already exists. Returns `None` for a duplicate.
pub async fn insert_if_absent<'e, E: PgExecutor<'e>>(
    executor: E,
    coach_id: i64,
    candidate: &CandidateSlot,
    reservation_id: Option<Uuid>,
) -> Result<Option<DbTimeSlot>> {
    let status = if reservation_id.is_some() {
        SlotStatus::Booked
    } else {
        SlotStatus::Available
    };

    let time_slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        INSERT INTO time_slots
            (id, coach_id, date, start_time, end_time, session_type, duration_minutes,
             status, is_free, reservation_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (coach_id, date, start_time, session_type) DO NOTHING
        RETURNING id, coach_id, date, start_time, end_time, session_type, duration_minutes,
                  status, is_free, reservation_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(coach_id)
    .bind(candidate.date)
    .bind(candidate.start_time)
    .bind(candidate.end_time)
    .bind(candidate.session_type.as_str())
    .bind(candidate.duration_minutes())
    .bind(status.as_str())
    .bind(candidate.is_free())
    .bind(reservation_id)
    .fetch_optional(executor)
    .await?;

    Ok(time_slot)
}

/// Takes the transaction-scoped advisory lock guarding the schedule of one
/// coach and day. Bookings and cancellations hold it shared, so they only
/// exclude slot generation, which holds it exclusively.
pub async fn lock_schedule<'e, E: PgExecutor<'e>>(
    executor: E,
    coach_id: i64,
    date: NaiveDate,
    exclusive: bool,
) -> Result<()> {
    let query = if exclusive {
        "SELECT pg_advisory_xact_lock($1, $2)"
    } else {
        "SELECT pg_advisory_xact_lock_shared($1, $2)"
    };

    // Two int4 keys; coaches whose ids collide modulo i32::MAX merely share a lock.
    sqlx::query(query)
        .bind((coach_id % i64::from(i32::MAX)) as i32)
        .bind(date.num_days_from_ce())
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn get_time_slot_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> Result<Option<DbTimeSlot>> {
    let time_slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        SELECT id, coach_id, date, start_time, end_time, session_type, duration_minutes,
               status, is_free, reservation_id, created_at
        FROM time_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(time_slot)
}

/// Looks up a slot by its natural key. With `lock` the row stays locked until
/// the surrounding transaction ends.
pub async fn find_by_key<'e, E: PgExecutor<'e>>(
    executor: E,
    coach_id: i64,
    date: NaiveDate,
    start_time: NaiveTime,
    session_type: SessionType,
    lock: bool,
) -> Result<Option<DbTimeSlot>> {
    let query = format!(
        r#"
        SELECT id, coach_id, date, start_time, end_time, session_type, duration_minutes,
               status, is_free, reservation_id, created_at
        FROM time_slots
        WHERE coach_id = $1 AND date = $2 AND start_time = $3 AND session_type = $4
        {}
        "#,
        if lock { "FOR UPDATE" } else { "" }
    );

    let time_slot = sqlx::query_as::<_, DbTimeSlot>(&query)
        .bind(coach_id)
        .bind(date)
        .bind(start_time)
        .bind(session_type.as_str())
        .fetch_optional(executor)
        .await?;

    Ok(time_slot)
}

/// Locks and returns every slot of the coach/date intersecting `interval`,
/// whatever its session type. Rows are locked in start-time order so that
/// concurrent scans over the same day acquire locks in the same sequence.
pub async fn find_overlapping_for_update(
    conn: &mut PgConnection,
    coach_id: i64,
    date: NaiveDate,
    interval: Interval,
) -> Result<Vec<DbTimeSlot>> {
    let time_slots = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        SELECT id, coach_id, date, start_time, end_time, session_type, duration_minutes,
               status, is_free, reservation_id, created_at
        FROM time_slots
        WHERE coach_id = $1 AND date = $2 AND start_time < $4 AND end_time > $3
        ORDER BY start_time ASC, session_type ASC
        FOR UPDATE
        "#,
    )
    .bind(coach_id)
    .bind(date)
    .bind(interval.start)
    .bind(interval.end)
    .fetch_all(conn)
    .await?;

    Ok(time_slots)
}

pub async fn list_slots_for_day<'e, E: PgExecutor<'e>>(
    executor: E,
    coach_id: i64,
    date: NaiveDate,
) -> Result<Vec<DbSlotListing>> {
    let listings = sqlx::query_as::<_, DbSlotListing>(
        r#"
        SELECT s.id, s.coach_id, s.date, s.start_time, s.end_time, s.session_type,
               s.duration_minutes, s.status, s.is_free, s.reservation_id, s.created_at,
               r.time AS holder_time, r.session_type AS holder_session_type
        FROM time_slots s
        LEFT JOIN reservations r ON r.id = s.reservation_id
        WHERE s.coach_id = $1 AND s.date = $2
        ORDER BY s.start_time ASC, s.session_type ASC
        "#,
    )
    .bind(coach_id)
    .bind(date)
    .fetch_all(executor)
    .await?;

    Ok(listings)
}

/// Writes planned transitions, one statement per distinct target state.
pub async fn apply_transitions(
    conn: &mut PgConnection,
    transitions: &[SlotTransition],
) -> Result<u64> {
    let mut groups: HashMap<(SlotStatus, Option<Uuid>), Vec<Uuid>> = HashMap::new();
    for transition in transitions {
        groups
            .entry((transition.status, transition.reservation_id))
            .or_default()
            .push(transition.slot_id);
    }

    let mut affected = 0;
    for ((status, reservation_id), ids) in groups {
        let result = sqlx::query(
            r#"
            UPDATE time_slots
            SET status = $2, reservation_id = $3
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ids)
        .bind(status.as_str())
        .bind(reservation_id)
        .execute(&mut *conn)
        .await?;
        affected += result.rows_affected();
    }

    Ok(affected)
}

/// Compare-and-set on a single slot's status. Returns the updated row, or
/// `None` when the slot is missing or not in `from`.
pub async fn set_status_if<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    from: SlotStatus,
    to: SlotStatus,
) -> Result<Option<DbTimeSlot>> {
    let time_slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        UPDATE time_slots
        SET status = $3
        WHERE id = $1 AND status = $2
        RETURNING id, coach_id, date, start_time, end_time, session_type, duration_minutes,
                  status, is_free, reservation_id, created_at
        "#,
    )
    .bind(id)
    .bind(from.as_str())
    .bind(to.as_str())
    .fetch_optional(executor)
    .await?;

    Ok(time_slot)
}

/// Deletes the given slots that are still available. Returns the ids that
/// were removed.
pub async fn delete_available<'e, E: PgExecutor<'e>>(executor: E, ids: &[Uuid]) -> Result<Vec<Uuid>> {
    let deleted = sqlx::query_scalar::<_, Uuid>(
        r#"
        DELETE FROM time_slots
        WHERE id = ANY($1) AND status = 'available'
        RETURNING id
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    Ok(deleted)
}

pub async fn existing_ids<'e, E: PgExecutor<'e>>(executor: E, ids: &[Uuid]) -> Result<Vec<Uuid>> {
    let existing = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id FROM time_slots WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    Ok(existing)
}
