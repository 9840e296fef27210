//! Bounded transactions and storage error classification.
//!
//! Every engine operation runs in a transaction opened by [`begin_bounded`].
//! The lock wait limit is set with `set_config(..., true)`, which scopes it to
//! the transaction: commit, rollback and drop (implicit rollback) all restore
//! the connection's previous setting before it goes back to the pool.

use std::time::Duration;

use coachslot_core::errors::BookingError;
use sqlx::{PgPool, Postgres, Transaction};

pub type Tx = Transaction<'static, Postgres>;

const LOCK_NOT_AVAILABLE: &str = "55P03";
const DEADLOCK_DETECTED: &str = "40P01";
const SERIALIZATION_FAILURE: &str = "40001";
const UNIQUE_VIOLATION: &str = "23505";

pub async fn begin_bounded(pool: &PgPool, lock_timeout: Duration) -> Result<Tx, BookingError> {
    let mut tx = pool.begin().await.map_err(sqlx_error)?;

    sqlx::query("SELECT set_config('lock_timeout', $1, true)")
        .bind(format!("{}ms", lock_timeout.as_millis()))
        .execute(&mut *tx)
        .await
        .map_err(sqlx_error)?;

    Ok(tx)
}

pub async fn commit(tx: Tx) -> Result<(), BookingError> {
    tx.commit().await.map_err(sqlx_error)
}

/// Maps a repository error onto the booking taxonomy. Lock timeouts,
/// deadlocks, serialization failures and connection problems are transient;
/// anything else is reported as a database error.
pub fn storage_error(report: eyre::Report) -> BookingError {
    let transient = match report.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)) => true,
        Some(sqlx::Error::Database(db_err)) => matches!(
            db_err.code().as_deref(),
            Some(LOCK_NOT_AVAILABLE | DEADLOCK_DETECTED | SERIALIZATION_FAILURE)
        ),
        _ => false,
    };

    if transient {
        tracing::warn!(error = %report, "Transient storage failure");
        BookingError::StorageUnavailable(report.to_string())
    } else {
        tracing::error!(error = %report, "Database error");
        BookingError::Database(report)
    }
}

pub fn sqlx_error(err: sqlx::Error) -> BookingError {
    storage_error(err.into())
}

pub fn is_unique_violation(report: &eyre::Report) -> bool {
    match report.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

pub fn is_transient(err: &BookingError) -> bool {
    matches!(err, BookingError::StorageUnavailable(_))
}
