use chrono::{DateTime, NaiveDate, Utc};
use coachslot_core::models::reservation::{ActorRole, Booker, ValidatedBooking};
use eyre::Result;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::DbReservation;

pub async fn create_reservation<'e, E: PgExecutor<'e>>(
    executor: E,
    booking: &ValidatedBooking,
) -> Result<DbReservation> {
    let id = Uuid::new_v4();
    let now = Utc::now();
    let (guest_name, guest_email, guest_phone) = match &booking.booker {
        Booker::Member(_) => (None, None, None),
        Booker::Guest(guest) => (
            Some(guest.name.as_str()),
            Some(guest.email.as_str()),
            guest.phone.as_deref(),
        ),
    };

    tracing::debug!(
        "Creating reservation: id={}, coach_id={}, date={}, time={}, session_type={}",
        id, booking.coach_id, booking.date, booking.time, booking.session_type
    );

    let reservation = sqlx::query_as::<_, DbReservation>(
        r#"
        INSERT INTO reservations
            (id, coach_id, user_id, guest_name, guest_email, guest_phone, date, time,
             session_type, reservation_type, status, is_free, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'confirmed', $11, $12)
        RETURNING id, coach_id, user_id, guest_name, guest_email, guest_phone, date, time,
                  session_type, reservation_type, status, is_free, created_at,
                  cancelled_at, cancelled_by
        "#,
    )
    .bind(id)
    .bind(booking.coach_id)
    .bind(booking.booker.user_id())
    .bind(guest_name)
    .bind(guest_email)
    .bind(guest_phone)
    .bind(booking.date)
    .bind(booking.time)
    .bind(booking.session_type.as_str())
    .bind(booking.reservation_type.as_str())
    .bind(booking.session_type.is_free())
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(reservation)
}

pub async fn get_reservation_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    lock: bool,
) -> Result<Option<DbReservation>> {
    let query = format!(
        r#"
        SELECT id, coach_id, user_id, guest_name, guest_email, guest_phone, date, time,
               session_type, reservation_type, status, is_free, created_at,
               cancelled_at, cancelled_by
        FROM reservations
        WHERE id = $1
        {}
        "#,
        if lock { "FOR UPDATE" } else { "" }
    );

    let reservation = sqlx::query_as::<_, DbReservation>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(reservation)
}

/// Confirmed reservations of a coach on one date, optionally leaving one out.
pub async fn get_active_reservations_for_day<'e, E: PgExecutor<'e>>(
    executor: E,
    coach_id: i64,
    date: NaiveDate,
    exclude: Option<Uuid>,
) -> Result<Vec<DbReservation>> {
    let reservations = sqlx::query_as::<_, DbReservation>(
        r#"
        SELECT id, coach_id, user_id, guest_name, guest_email, guest_phone, date, time,
               session_type, reservation_type, status, is_free, created_at,
               cancelled_at, cancelled_by
        FROM reservations
        WHERE coach_id = $1 AND date = $2 AND status = 'confirmed'
          AND ($3::uuid IS NULL OR id <> $3)
        ORDER BY time ASC
        "#,
    )
    .bind(coach_id)
    .bind(date)
    .bind(exclude)
    .fetch_all(executor)
    .await?;

    Ok(reservations)
}

/// Moves a confirmed reservation to cancelled. Returns `None` if it was not
/// confirmed anymore.
pub async fn cancel_reservation<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    cancelled_at: DateTime<Utc>,
    cancelled_by: ActorRole,
) -> Result<Option<DbReservation>> {
    let reservation = sqlx::query_as::<_, DbReservation>(
        r#"
        UPDATE reservations
        SET status = 'cancelled', cancelled_at = $2, cancelled_by = $3
        WHERE id = $1 AND status = 'confirmed'
        RETURNING id, coach_id, user_id, guest_name, guest_email, guest_phone, date, time,
                  session_type, reservation_type, status, is_free, created_at,
                  cancelled_at, cancelled_by
        "#,
    )
    .bind(id)
    .bind(cancelled_at)
    .bind(cancelled_by.as_str())
    .fetch_optional(executor)
    .await?;

    Ok(reservation)
}
