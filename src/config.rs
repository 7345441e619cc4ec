//! Process configuration from environment variables.

use std::path::PathBuf;

/// Default API port.
pub const DEFAULT_PORT: u16 = 7070;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database path (`FURY_DB`).
    pub db_path: PathBuf,
    /// API port (`FURY_PORT`).
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path = std::env::var("FURY_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());
        let port = std::env::var("FURY_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self { db_path, port }
    }
}

/// `~/.fury/fury.db`, with the directory created on demand by the
/// caller.
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".fury")
        .join("fury.db")
}
