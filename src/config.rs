//! This file provide some configuration for pgplan.
//! Values here are compile-time defaults; the environment variables named
//! below override them at runtime.

pub const NAME: &str = "pgplan";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const LOG_LEVEL: &str = "warn";
pub const LOG_PATH: &str = "./logs/pgplan.log";
pub const LOG_ENV: &str = "PGPLAN_LOG";

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost:5432/postgres";
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

pub const FRAME_TITLE: &str = "Query Plan";
pub const FRAME_PADDING: usize = 20; // extra columns beyond the longest row

/// Database url from `DATABASE_URL`, falling back to the local default.
pub fn database_url() -> String {
    std::env::var(DATABASE_URL_ENV).unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Log filter directive from `PGPLAN_LOG`, falling back to [`LOG_LEVEL`].
pub fn log_filter() -> String {
    std::env::var(LOG_ENV).unwrap_or_else(|_| LOG_LEVEL.to_string())
}
