use axum::{routing::get, Router};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new().route(
        "/api/users/:id/points",
        get(handlers::points::get_points).patch(handlers::points::patch_points),
    )
}
