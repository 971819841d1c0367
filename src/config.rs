//! Configuration loader for the `sewerflow` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
use std::env;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// SQLite connection string, e.g. `sqlite://sewer.db`.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// TCP port the HTTP server binds to.
    pub port: u16,

    /// Minutes since last report before a node is considered offline.
    pub node_active_window_min: u32,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – SQLite connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `PORT` – HTTP listen port (default: 3000)
/// - `NODE_ACTIVE_WINDOW_MIN` – node liveness window in minutes (default: 10)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let port = parse_env_u32!("PORT", 3000);
    let node_active_window_min = parse_env_u32!("NODE_ACTIVE_WINDOW_MIN", 10);

    let port = u16::try_from(port).map_err(|_| anyhow!("Invalid PORT: {} out of range", port))?;

    Ok(Config {
        db_url,
        db_pool_max,
        port,
        node_active_window_min,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL           : {}", self.db_url);
        tracing::info!("  DB_POOL_MAX            : {}", self.db_pool_max);
        tracing::info!("  PORT                   : {}", self.port);
        tracing::info!("  NODE_ACTIVE_WINDOW_MIN : {}", self.node_active_window_min);
    }
}
