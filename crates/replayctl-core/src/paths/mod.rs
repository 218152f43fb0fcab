//! Path utilities for replayctl data and resource directories.
//!
//! # Design
//!
//! - Returns `PathBuf` and `PathError` for clear error handling
//! - No interactive/terminal I/O
//! - OS-specific logic is kept in `platform`

mod error;
mod platform;
mod resolver;

pub use error::PathError;
pub use platform::{
    DATA_DIR_ENV, RESOURCE_DIR_ENV, data_root, ensure_dir, normalize_user_path, resource_root,
};
pub use resolver::{REPLAYER_LIBRARY_NAME, ResolvedPaths};
