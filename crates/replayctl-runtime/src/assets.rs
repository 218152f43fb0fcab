//! Staging of the replayer library and report assets before first start.

use std::fs;
use std::io;
use std::path::Path;

use replayctl_core::paths::ensure_dir;
use replayctl_core::{ResolvedPaths, SupervisorError};
use tracing::{debug, info};

/// What a staging step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staged {
    /// Already in place, nothing copied.
    Present,
    /// Copied from the bundled resources.
    Copied,
}

/// Copy the bundled replayer library into the replayer directory if it is
/// not there yet.
pub fn stage_library(paths: &ResolvedPaths) -> Result<Staged, SupervisorError> {
    let target = paths.staged_library();
    if target.is_file() {
        debug!(path = %target.display(), "Replayer library already staged");
        return Ok(Staged::Present);
    }

    let source = paths.bundled_library();
    if !source.is_file() {
        return Err(SupervisorError::asset_missing(
            &source,
            "bundled replayer library not found",
        ));
    }

    ensure_dir(&paths.replayer_dir)
        .map_err(|e| SupervisorError::asset_missing(&paths.replayer_dir, e.to_string()))?;
    fs::copy(&source, &target)
        .map_err(|e| SupervisorError::asset_missing(&target, format!("copy failed: {e}")))?;

    info!(from = %source.display(), to = %target.display(), "Staged replayer library");
    Ok(Staged::Copied)
}

/// Copy the template `static` tree into the report directory if it is not
/// there yet.
pub fn stage_static_assets(paths: &ResolvedPaths) -> Result<Staged, SupervisorError> {
    let target = paths.report_static_dir();
    if target.is_dir() {
        debug!(path = %target.display(), "Report assets already staged");
        return Ok(Staged::Present);
    }

    let source = paths.template_static_dir();
    if !source.is_dir() {
        return Err(SupervisorError::asset_missing(
            &source,
            "report template assets not found",
        ));
    }

    copy_tree(&source, &target)
        .map_err(|e| SupervisorError::asset_missing(&target, format!("copy failed: {e}")))?;

    info!(from = %source.display(), to = %target.display(), "Staged report assets");
    Ok(Staged::Copied)
}

/// Stage everything `start` needs. The library is only required when one is
/// configured to be preloaded from the staged location.
pub fn stage_all(paths: &ResolvedPaths, needs_library: bool) -> Result<(), SupervisorError> {
    if needs_library {
        stage_library(paths)?;
    }
    stage_static_assets(paths)?;
    ensure_dir(paths.log_dir())
        .map_err(|e| SupervisorError::asset_missing(paths.log_dir(), e.to_string()))?;
    Ok(())
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
