//! # API Configuration Module
//!
//! Loads the server configuration from environment variables, with defaults
//! where a sensible one exists.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: host address to bind to (default: "0.0.0.0")
//! - `API_PORT`: port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: logging level (default: "info")
//! - `API_CORS_ORIGINS`: comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: per-request timeout (default: 30)
//! - `DB_MAX_CONNECTIONS`: connection pool size (default: 10)
//! - `DB_ACQUIRE_TIMEOUT_SECONDS`: wait for a pooled connection (default: 5)
//! - `LOCK_WAIT_TIMEOUT_MS`: row lock wait inside a transaction (default: 3000)
//! - `BUSINESS_TIMEZONE`: timezone all slot times are expressed in (default: "Europe/Paris")
//! - `CANCELLATION_CUTOFF_HOURS`: minimum lead time for client cancellations (default: 6)

use std::{env, str::FromStr, time::Duration};

use chrono_tz::Tz;
use coachslot_core::{clock::DEFAULT_TIMEZONE, policy::DEFAULT_CUTOFF_HOURS};
use coachslot_db::PoolSettings;
use eyre::{eyre, Result, WrapErr};
use tracing::Level;

/// Configuration for the booking API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub log_level: Level,
    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,
    /// Request timeout in seconds
    pub request_timeout: u64,
    pub db_max_connections: u32,
    pub db_acquire_timeout: u64,
    /// Lock wait bound in milliseconds
    pub lock_wait_timeout: u64,
    pub timezone: Tz,
    pub cancellation_cutoff_hours: i64,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables.
    ///
    /// # Errors
    ///
    /// Fails if `DATABASE_URL` is missing or if any numeric or timezone value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("API_PORT", 3000)?;

        // Database settings
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", 10)?;
        let db_acquire_timeout = parse_var("DB_ACQUIRE_TIMEOUT_SECONDS", 5)?;
        let lock_wait_timeout = parse_var("LOCK_WAIT_TIMEOUT_MS", 3000)?;

        // Logging settings
        let log_level = match env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()).as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS").ok().map(|origins| {
            origins.split(',').map(|s| s.trim().to_string()).collect()
        });

        let request_timeout = parse_var("API_REQUEST_TIMEOUT_SECONDS", 30)?;

        // Booking rules
        let timezone_name =
            env::var("BUSINESS_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|e| eyre!("Invalid BUSINESS_TIMEZONE value '{}': {}", timezone_name, e))?;
        let cancellation_cutoff_hours = parse_var("CANCELLATION_CUTOFF_HOURS", DEFAULT_CUTOFF_HOURS)?;
        if cancellation_cutoff_hours < 0 {
            return Err(eyre!("CANCELLATION_CUTOFF_HOURS must not be negative"));
        }

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            db_max_connections,
            db_acquire_timeout,
            lock_wait_timeout,
            timezone,
            cancellation_cutoff_hours,
        })
    }

    /// Returns the server address as a string, e.g. "127.0.0.1:8080".
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.db_max_connections,
            acquire_timeout: Duration::from_secs(self.db_acquire_timeout),
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_wait_timeout)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .wrap_err_with(|| format!("Invalid {} value '{}'", name, value)),
        Err(_) => Ok(default),
    }
}
