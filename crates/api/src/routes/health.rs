use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::{sync::Arc, time::Duration};

use crate::ApiState;

const DATABASE_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

#[derive(Serialize)]
struct VersionResponse {
    name: &'static str,
    version: &'static str,
}

/// Liveness plus a bounded database probe. `status` stays `ok` while the
/// database is down.
async fn health_check(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    let probe = sqlx::query("SELECT 1").execute(&state.db_pool);
    let database = match tokio::time::timeout(DATABASE_PROBE_TIMEOUT, probe).await {
        Ok(Ok(_)) => "up",
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "Database health probe failed");
            "down"
        }
        Err(_) => "down",
    };

    Json(HealthResponse {
        status: "ok",
        database,
    })
}

async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version))
}
