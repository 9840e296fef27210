use std::sync::Arc;

use coachslot_api::{config::ApiConfig, ApiState};
use coachslot_core::{clock::SystemClock, notify::LogNotifier, policy::CancellationPolicy};
use coachslot_db::{create_pool, schema::initialize_database};
use color_eyre::eyre::Result;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Load environment variables
    dotenv().ok();

    // Load configuration
    let config = ApiConfig::from_env()?;

    // Create database connection pool
    let db_pool = create_pool(&config.database_url, config.pool_settings()).await?;

    // Initialize database schema
    initialize_database(&db_pool).await?;

    let state = ApiState::new(
        db_pool,
        Arc::new(SystemClock::new(config.timezone)),
        config.lock_timeout(),
        CancellationPolicy::with_cutoff_hours(config.cancellation_cutoff_hours),
        Arc::new(LogNotifier),
    );

    // Start API server
    coachslot_api::start_server(config, state).await?;

    Ok(())
}
