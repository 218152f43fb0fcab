//! Paths command handler.
//!
//! Displays all resolved paths for diagnostics.

use replayctl_core::ResolvedPaths;

pub fn execute(paths: &ResolvedPaths) {
    println!("{paths}");
}
