use coachslot_core::models::points::PointBalance;
use eyre::Result;
use sqlx::PgExecutor;

use crate::models::DbUserPoints;

pub async fn create_user<'e, E: PgExecutor<'e>>(
    executor: E,
    email: &str,
    display_name: &str,
    balance: PointBalance,
) -> Result<DbUserPoints> {
    let user = sqlx::query_as::<_, DbUserPoints>(
        r#"
        INSERT INTO users (email, display_name, solo_points, team_points, points)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, solo_points, team_points, points
        "#,
    )
    .bind(email)
    .bind(display_name)
    .bind(balance.solo_points)
    .bind(balance.team_points)
    .bind(balance.solo_points + balance.team_points)
    .fetch_one(executor)
    .await?;

    Ok(user)
}

pub async fn get_points<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    lock: bool,
) -> Result<Option<DbUserPoints>> {
    let query = format!(
        r#"
        SELECT id, solo_points, team_points, points
        FROM users
        WHERE id = $1
        {}
        "#,
        if lock { "FOR UPDATE" } else { "" }
    );

    let points = sqlx::query_as::<_, DbUserPoints>(&query)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(points)
}

/// Stores both balances and the derived total in one statement.
pub async fn update_points<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i64,
    balance: PointBalance,
) -> Result<DbUserPoints> {
    let points = sqlx::query_as::<_, DbUserPoints>(
        r#"
        UPDATE users
        SET solo_points = $2, team_points = $3, points = $2 + $3
        WHERE id = $1
        RETURNING id, solo_points, team_points, points
        "#,
    )
    .bind(user_id)
    .bind(balance.solo_points)
    .bind(balance.team_points)
    .fetch_one(executor)
    .await?;

    Ok(points)
}
