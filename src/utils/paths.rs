//! Path Utilities
//!
//! Resolves the default location of the document store (~/.todo-tracker/).

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the tracker data directory (~/.todo-tracker/)
pub fn tracker_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".todo-tracker"))
}

/// Get the default store file path (~/.todo-tracker/store.db)
pub fn default_store_path() -> AppResult<PathBuf> {
    Ok(tracker_dir()?.join("store.db"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
