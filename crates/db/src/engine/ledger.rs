//! PointLedger. Balances are read with a row lock, changed with the pure
//! arithmetic of [`PointBalance`] and written back with the derived total, all
//! inside the caller's transaction.

use coachslot_core::{
    errors::{BookingError, BookingResult},
    models::points::{PointBalance, PointType, PointsPatch},
};
use sqlx::PgConnection;

use crate::{
    engine::EngineContext,
    repositories::points,
    transaction::{commit, storage_error},
};

async fn locked_balance(conn: &mut PgConnection, user_id: i64) -> BookingResult<PointBalance> {
    points::get_points(conn, user_id, true)
        .await
        .map_err(storage_error)?
        .map(PointBalance::from)
        .ok_or_else(|| BookingError::NotFound(format!("User with ID {} not found", user_id)))
}

async fn store(
    conn: &mut PgConnection,
    user_id: i64,
    balance: PointBalance,
) -> BookingResult<PointBalance> {
    let row = points::update_points(conn, user_id, balance)
        .await
        .map_err(storage_error)?;
    Ok(row.into())
}

/// Fails with `InsufficientPoints` before writing anything if the balance of
/// `point_type` is lower than `amount`.
pub async fn debit(
    conn: &mut PgConnection,
    user_id: i64,
    point_type: PointType,
    amount: i32,
) -> BookingResult<PointBalance> {
    let balance = locked_balance(conn, user_id).await?.debit(point_type, amount)?;
    store(conn, user_id, balance).await
}

pub async fn credit(
    conn: &mut PgConnection,
    user_id: i64,
    point_type: PointType,
    amount: i32,
) -> BookingResult<PointBalance> {
    let balance = locked_balance(conn, user_id).await?.credit(point_type, amount)?;
    store(conn, user_id, balance).await
}

/// Current balance, locked for the rest of the transaction.
pub async fn balance_for_update(conn: &mut PgConnection, user_id: i64) -> BookingResult<PointBalance> {
    locked_balance(conn, user_id).await
}

#[derive(Clone)]
pub struct PointLedger {
    ctx: EngineContext,
}

impl PointLedger {
    pub fn new(ctx: EngineContext) -> Self {
        Self { ctx }
    }

    pub async fn balance(&self, user_id: i64) -> BookingResult<PointBalance> {
        points::get_points(&self.ctx.pool, user_id, false)
            .await
            .map_err(storage_error)?
            .map(PointBalance::from)
            .ok_or_else(|| BookingError::NotFound(format!("User with ID {} not found", user_id)))
    }

    /// Admin adjustment. Removals and sets clamp at zero instead of failing.
    pub async fn adjust(&self, user_id: i64, patch: &PointsPatch) -> BookingResult<PointBalance> {
        patch.validate()?;

        let mut tx = self.ctx.begin().await?;
        let before = locked_balance(&mut tx, user_id).await?;
        let after = store(&mut tx, user_id, before.apply(patch)?).await?;
        commit(tx).await?;

        tracing::info!(
            user_id,
            solo_before = before.solo_points,
            solo_after = after.solo_points,
            team_before = before.team_points,
            team_after = after.team_points,
            "Adjusted point balance"
        );
        Ok(after)
    }
}
