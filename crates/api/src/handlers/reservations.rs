use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use coachslot_core::models::reservation::{
    BulkReservationReport, BulkReservationRequest, CancellationReceipt, CreateReservationRequest,
    Reservation, ReservationReceipt,
};
use uuid::Uuid;

use crate::{
    middleware::{auth::Caller, error_handling::AppError},
    ApiState,
};

#[axum::debug_handler]
pub async fn create_reservation(
    State(state): State<Arc<ApiState>>,
    Caller(actor): Caller,
    payload: Result<Json<CreateReservationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ReservationReceipt>), AppError> {
    let Json(payload) = payload?;

    let receipt = state.reservations.create(&payload, actor).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Admin only. Partial success is reported in the body, not as an error.
#[axum::debug_handler]
pub async fn create_reservations_bulk(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    payload: Result<Json<BulkReservationRequest>, JsonRejection>,
) -> Result<Json<BulkReservationReport>, AppError> {
    caller.require_admin()?;
    let Json(payload) = payload?;

    let report = state.reservations.create_bulk(&payload, caller.0).await?;

    Ok(Json(report))
}

#[axum::debug_handler]
pub async fn get_reservation(
    State(state): State<Arc<ApiState>>,
    Caller(actor): Caller,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Reservation>, AppError> {
    let Path(id) = path?;

    let reservation = state.reservations.get(id, actor).await?;

    Ok(Json(reservation))
}

#[axum::debug_handler]
pub async fn cancel_reservation(
    State(state): State<Arc<ApiState>>,
    Caller(actor): Caller,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CancellationReceipt>, AppError> {
    let Path(id) = path?;

    let receipt = state.reservations.cancel(id, actor).await?;

    Ok(Json(receipt))
}
