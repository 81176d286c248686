//! Environment-derived configuration.

use serde::Deserialize;

fn default_db_name() -> String {
    "timetabler".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

/// Token lifetime in minutes.
fn default_expires_delta() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Seconds granted to services to drain on shutdown.
fn default_shutdown_timeout() -> u64 {
    10
}

/// Solver wall-clock budget in seconds.
fn default_solver_time_limit() -> u64 {
    60
}

fn default_solver_workers() -> u32 {
    8
}

fn default_worker_count() -> usize {
    2
}

/// Process configuration, loaded from the environment (`MONGODB_URI`,
/// `DB_NAME`, `SECRET_KEY`, ... -- field names upper-cased).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongodb_uri: String,
    #[serde(default = "default_db_name")]
    pub db_name: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub secret_key: String,
    #[serde(default = "default_algorithm")]
    pub default_algorithm: String,
    #[serde(default = "default_expires_delta")]
    pub expires_delta: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: u64,
    #[serde(default = "default_solver_time_limit")]
    pub solver_time_limit: u64,
    #[serde(default = "default_solver_workers")]
    pub solver_workers: u32,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
}
