mod config;
mod database;
mod lease;
mod memory;

pub use config::{Config, GoalsConfig};
pub use database::{Database, IntervalRecord};
pub use lease::{TimerLease, LEASE_TTL_SECS};
pub use memory::MemorySnapshotStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/focustodo[-dev]/` based on FOCUSTODO_ENV.
///
/// Set FOCUSTODO_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FOCUSTODO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("focustodo-dev")
    } else {
        base_dir.join("focustodo")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
