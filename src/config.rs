//! Runtime configuration
//!
//! Resolved from the environment at startup.

use std::path::PathBuf;

/// Environment variable overriding the database location
pub const DATABASE_PATH_VAR: &str = "UGM_DATABASE_PATH";

/// Log directive applied on top of `RUST_LOG`
pub const DEFAULT_LOG_DIRECTIVE: &str = "ugm=info";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub log_directive: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_path: database_path(),
            log_directive: DEFAULT_LOG_DIRECTIVE.to_string(),
        }
    }
}

/// Get the database path from the environment or fall back to `<project>/data/ugm.db`
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_database_path())
}

fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    // Go up from target/release or target/debug to the project root
    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("ugm.db");
    path
}
