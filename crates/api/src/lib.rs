//! # Coachslot API
//!
//! HTTP surface of the coaching session booking engine.
//!
//! ## Architecture
//!
//! - **Routes**: endpoint and URL structure
//! - **Handlers**: request decoding and delegation to the engine services
//! - **Middleware**: caller identity extraction and error to HTTP mapping
//! - **Config**: environment configuration
//!
//! The API uses Axum as the web framework. All booking rules live in
//! `coachslot-db`'s engine and `coachslot-core`; handlers only translate.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Caller identity and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::{http::HeaderValue, Router};
use coachslot_core::{clock::Clock, notify::Notifier, policy::CancellationPolicy};
use coachslot_db::engine::{EngineContext, PointLedger, ReservationManager, SlotService};
use eyre::{Result, WrapErr};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use middleware::auth::{USER_ID_HEADER, USER_ROLE_HEADER};

/// Shared application state that is accessible to all request handlers.
pub struct ApiState {
    /// PostgreSQL connection pool, also used by the health probe
    pub db_pool: PgPool,
    pub slots: SlotService,
    pub ledger: PointLedger,
    pub reservations: ReservationManager,
}

impl ApiState {
    pub fn new(
        db_pool: PgPool,
        clock: Arc<dyn Clock>,
        lock_timeout: Duration,
        policy: CancellationPolicy,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let ctx = EngineContext::new(db_pool.clone(), clock, lock_timeout);
        Self {
            db_pool,
            slots: SlotService::new(ctx.clone()),
            ledger: PointLedger::new(ctx.clone()),
            reservations: ReservationManager::new(ctx, policy, notifier),
        }
    }
}

/// Builds the application router with every route attached to `state`.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Slot management endpoints
        .merge(routes::slots::routes())
        // Reservation endpoints
        .merge(routes::reservations::routes())
        // Point balance endpoints
        .merge(routes::points::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the API server.
///
/// Sets up logging, wraps the router with CORS and timeout layers and serves
/// until the listener fails.
pub async fn start_server(config: config::ApiConfig, state: ApiState) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let app = build_router(Arc::new(state));

    // Apply CORS configuration if origins are specified
    let app = if let Some(origins) = &config.cors_origins {
        let origins = origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .wrap_err_with(|| format!("Invalid CORS origin '{}'", origin))
            })
            .collect::<Result<Vec<_>>>()?;

        let cors = tower_http::cors::CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::PATCH,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
                axum::http::header::ACCEPT,
                axum::http::HeaderName::from_static(USER_ID_HEADER),
                axum::http::HeaderName::from_static(USER_ROLE_HEADER),
            ])
            .allow_origin(origins)
            .allow_credentials(true);

        app.layer(cors)
    } else {
        app
    };

    // Add request timeout middleware
    let app = app.layer(
        tower::ServiceBuilder::new()
            .layer(axum::error_handling::HandleErrorLayer::new(handle_timeout))
            .timeout(Duration::from_secs(config.request_timeout))
            .into_inner(),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_timeout(err: tower::BoxError) -> (axum::http::StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            axum::http::StatusCode::REQUEST_TIMEOUT,
            "Request timed out".to_string(),
        )
    } else {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled internal error: {}", err),
        )
    }
}
