use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/coaches/:coach_id/slots/generate",
            post(handlers::slots::generate_slots),
        )
        .route("/api/coaches/:coach_id/slots", get(handlers::slots::list_slots))
        .route(
            "/api/slots/:id/availability",
            put(handlers::slots::set_availability),
        )
        .route("/api/slots/:id", delete(handlers::slots::delete_slot))
        .route("/api/slots/bulk-delete", post(handlers::slots::bulk_delete_slots))
}
