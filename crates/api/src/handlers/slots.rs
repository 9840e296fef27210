use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use coachslot_core::models::time_slot::{
    BulkDeleteReport, BulkDeleteSlotsRequest, GenerateSlotsRequest, GenerateSlotsResponse,
    ListSlotsQuery, SetAvailabilityRequest, SlotView, TimeSlot,
};
use uuid::Uuid;

use crate::{
    middleware::{auth::Caller, error_handling::AppError},
    ApiState,
};

#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<GenerateSlotsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GenerateSlotsResponse>), AppError> {
    caller.require_admin()?;
    let Path(coach_id) = path?;
    let Json(payload) = payload?;

    let response = state.slots.generate(coach_id, &payload).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<ApiState>>,
    _caller: Caller,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<ListSlotsQuery>, QueryRejection>,
) -> Result<Json<Vec<SlotView>>, AppError> {
    let Path(coach_id) = path?;
    let Query(query) = query?;

    let slots = state.slots.list(coach_id, query.date).await?;

    Ok(Json(slots))
}

#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SetAvailabilityRequest>, JsonRejection>,
) -> Result<Json<TimeSlot>, AppError> {
    caller.require_admin()?;
    let Path(slot_id) = path?;
    let Json(payload) = payload?;

    let slot = state.slots.set_availability(slot_id, payload.available).await?;

    Ok(Json(slot))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, AppError> {
    caller.require_admin()?;
    let Path(slot_id) = path?;

    state.slots.delete(slot_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn bulk_delete_slots(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    payload: Result<Json<BulkDeleteSlotsRequest>, JsonRejection>,
) -> Result<Json<BulkDeleteReport>, AppError> {
    caller.require_admin()?;
    let Json(payload) = payload?;

    let report = state.slots.delete_many(&payload.slot_ids).await?;

    Ok(Json(report))
}
