//! Platform-specific root directory resolution.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::PathError;

/// Environment override for the data root.
pub const DATA_DIR_ENV: &str = "REPLAYCTL_DATA_DIR";

/// Environment override for the resource root.
pub const RESOURCE_DIR_ENV: &str = "REPLAYCTL_RESOURCE_DIR";

/// Get the root directory for runtime data (staged library, reports, logs).
///
/// Resolution order:
/// 1. `REPLAYCTL_DATA_DIR` environment variable
/// 2. Local data directory (`dirs::data_local_dir()`, e.g. `~/.local/share/replayctl`)
pub fn data_root() -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(DATA_DIR_ENV) {
        return normalize_user_path(&path);
    }

    let data_dir = dirs::data_local_dir().ok_or(PathError::NoDataDir)?;
    Ok(data_dir.join("replayctl"))
}

/// Get the root directory for bundled resources (replayer library, report
/// templates).
///
/// Resolution order:
/// 1. `REPLAYCTL_RESOURCE_DIR` environment variable
/// 2. `../share/replayctl` next to the running executable, if it exists
/// 3. `<data root>/bundle`
pub fn resource_root(data_root: &Path) -> Result<PathBuf, PathError> {
    if let Ok(path) = env::var(RESOURCE_DIR_ENV) {
        return normalize_user_path(&path);
    }

    if let Ok(exe) = env::current_exe() {
        if let Some(prefix) = exe.parent().and_then(Path::parent) {
            let share = prefix.join("share").join("replayctl");
            if share.is_dir() {
                return Ok(share);
            }
        }
    }

    Ok(data_root.join("bundle"))
}

/// Create a directory (and parents) if it does not exist yet.
pub fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if !path.is_dir() {
            return Err(PathError::NotADirectory(path.to_path_buf()));
        }
        return Ok(());
    }

    fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed.starts_with("~/") || trimmed == "~" {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        if trimmed == "~" {
            home
        } else {
            home.join(trimmed.trim_start_matches("~/"))
        }
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}
