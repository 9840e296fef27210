use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use coachslot_core::models::points::{PointBalance, PointsPatch};

use crate::{
    middleware::{auth::Caller, error_handling::AppError},
    ApiState,
};

#[axum::debug_handler]
pub async fn get_points(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<PointBalance>, AppError> {
    let Path(user_id) = path?;
    caller.require_self_or_admin(user_id)?;

    let balance = state.ledger.balance(user_id).await?;

    Ok(Json(balance))
}

#[axum::debug_handler]
pub async fn patch_points(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PointsPatch>, JsonRejection>,
) -> Result<Json<PointBalance>, AppError> {
    caller.require_admin()?;
    let Path(user_id) = path?;
    let Json(patch) = payload?;

    let balance = state.ledger.adjust(user_id, &patch).await?;

    Ok(Json(balance))
}
