//! Stage command handler.

use std::path::Path;

use replayctl_runtime::{Staged, stage_library, stage_static_assets};

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Copy the replayer library (when one ships) and the report assets.
pub fn execute(ctx: &CliContext) -> Result<(), CliError> {
    let paths = &ctx.paths;

    if paths.bundled_library().is_file() || paths.staged_library().is_file() {
        let staged = stage_library(paths)?;
        report("replayer library", staged, &paths.staged_library());
    } else {
        println!("replayer library: none bundled, skipped");
    }

    let staged = stage_static_assets(paths)?;
    report("report assets", staged, &paths.report_static_dir());
    Ok(())
}

fn report(what: &str, staged: Staged, target: &Path) {
    match staged {
        Staged::Present => println!("{what}: already in place at {}", target.display()),
        Staged::Copied => println!("{what}: staged to {}", target.display()),
    }
}
