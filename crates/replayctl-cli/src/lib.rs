//! `replayctl`: command-line front end for the replayer supervisor.
#![deny(unsafe_code)]

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod parser;
pub mod signals;

// Re-export primary types for convenient access
pub use bootstrap::{CliConfig, CliContext, SettingsOverrides, bootstrap};
pub use commands::{Commands, LaunchArgs};
pub use error::CliError;
pub use parser::Cli;
