use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create users table; point balances live on the user row
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            email VARCHAR(255) NOT NULL UNIQUE,
            display_name VARCHAR(255) NOT NULL,
            solo_points INTEGER NOT NULL DEFAULT 0,
            team_points INTEGER NOT NULL DEFAULT 0,
            points INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT solo_points_non_negative CHECK (solo_points >= 0),
            CONSTRAINT team_points_non_negative CHECK (team_points >= 0),
            CONSTRAINT points_total CHECK (points = solo_points + team_points)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create reservations table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            coach_id BIGINT NOT NULL,
            user_id BIGINT NULL REFERENCES users(id),
            guest_name VARCHAR(255) NULL,
            guest_email VARCHAR(255) NULL,
            guest_phone VARCHAR(64) NULL,
            date DATE NOT NULL,
            time TIME NOT NULL,
            session_type VARCHAR(16) NOT NULL,
            reservation_type VARCHAR(16) NOT NULL DEFAULT 'individual',
            status VARCHAR(16) NOT NULL DEFAULT 'confirmed',
            is_free BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            cancelled_at TIMESTAMP WITH TIME ZONE NULL,
            cancelled_by VARCHAR(16) NULL,
            CONSTRAINT valid_session_type CHECK (session_type IN ('normal', 'bilan')),
            CONSTRAINT valid_reservation_type CHECK (reservation_type IN ('individual', 'group')),
            CONSTRAINT valid_status CHECK (status IN ('confirmed', 'cancelled')),
            CONSTRAINT valid_cancelled_by CHECK (cancelled_by IS NULL OR cancelled_by IN ('client', 'admin', 'system')),
            CONSTRAINT booker_present CHECK (user_id IS NOT NULL OR guest_email IS NOT NULL)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create time_slots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS time_slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            coach_id BIGINT NOT NULL,
            date DATE NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            session_type VARCHAR(16) NOT NULL,
            duration_minutes INTEGER NOT NULL,
            status VARCHAR(16) NOT NULL DEFAULT 'available',
            is_free BOOLEAN NOT NULL DEFAULT FALSE,
            reservation_id UUID NULL REFERENCES reservations(id) ON DELETE SET NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT uq_time_slots_key UNIQUE (coach_id, date, start_time, session_type),
            CONSTRAINT valid_time_range CHECK (end_time > start_time),
            CONSTRAINT valid_slot_session_type CHECK (session_type IN ('normal', 'bilan')),
            CONSTRAINT valid_slot_status CHECK (status IN ('available', 'booked', 'overlapping', 'unavailable')),
            CONSTRAINT reservation_only_when_booked CHECK (reservation_id IS NULL OR status = 'booked')
        );
        "#,
    )
    .execute(pool)
    .await?;

    migrate_legacy_booking_flag(pool).await?;

    // Create indexes
    for statement in [
        "CREATE UNIQUE INDEX IF NOT EXISTS uq_reservations_confirmed \
         ON reservations(coach_id, date, time, session_type) WHERE status = 'confirmed'",
        "CREATE INDEX IF NOT EXISTS idx_reservations_coach_date ON reservations(coach_id, date)",
        "CREATE INDEX IF NOT EXISTS idx_reservations_user_id ON reservations(user_id)",
        "CREATE INDEX IF NOT EXISTS idx_time_slots_coach_date ON time_slots(coach_id, date, start_time)",
        "CREATE INDEX IF NOT EXISTS idx_time_slots_reservation_id ON time_slots(reservation_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}

/// Older databases tracked bookings with an `is_booked` flag next to
/// `status`. Fold it into `status` once and drop the column.
async fn migrate_legacy_booking_flag(pool: &Pool<Postgres>) -> Result<()> {
    let column_exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM information_schema.columns
            WHERE table_name = 'time_slots' AND column_name = 'is_booked'
        );
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !column_exists {
        return Ok(());
    }

    info!("Migrating legacy is_booked flag into time_slots.status");
    let mut tx = pool.begin().await?;

    // A flagged row without a reservation link is blocked by a neighbouring
    // booking, which the old code displayed as overlapping.
    sqlx::query(
        r#"
        UPDATE time_slots
        SET status = CASE WHEN reservation_id IS NULL THEN 'overlapping' ELSE 'booked' END
        WHERE is_booked AND status = 'available'
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("ALTER TABLE time_slots DROP COLUMN is_booked")
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
