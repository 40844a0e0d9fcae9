//! # Service Configuration
//!
//! Settings for the booking engine and its PostgreSQL store, read from
//! environment variables:
//!
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
//! - `LOG_LEVEL`: logging level (default: "info")
//! - `FACILITY_TIMEZONE`: IANA zone that defines "today" and "now" (default: "UTC")
//! - `LOCK_TIMEOUT_MS`: how long a booking waits for a resource lock (default: 5000)

use std::{env, time::Duration};

use chrono_tz::Tz;
use eyre::{Result, WrapErr, eyre};
use tracing::Level;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// PostgreSQL database connection string
    pub database_url: String,

    pub max_connections: u32,

    /// Log level for the application
    pub log_level: Level,

    /// Timezone the facility operates in
    pub timezone: Tz,

    /// Upper bound on row-lock waits before a booking gives up with a conflict
    pub lock_timeout: Duration,
}

impl ServiceConfig {
    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` is unset, a numeric value does not parse,
    /// or `FACILITY_TIMEZONE` is not a known IANA zone.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Database settings
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| eyre!("DATABASE_URL environment variable must be set"))?;
        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .wrap_err("Invalid DATABASE_MAX_CONNECTIONS value")?;

        // Logging settings
        let log_level = match lookup("LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // Facility settings
        let timezone_name = lookup("FACILITY_TIMEZONE").unwrap_or_else(|| "UTC".to_string());
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|e| eyre!("Invalid FACILITY_TIMEZONE value {timezone_name:?}: {e}"))?;

        let lock_timeout_ms: u64 = lookup("LOCK_TIMEOUT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse()
            .wrap_err("Invalid LOCK_TIMEOUT_MS value")?;

        Ok(Self {
            database_url,
            max_connections,
            log_level,
            timezone,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        })
    }
}
