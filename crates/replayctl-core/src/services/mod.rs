//! Pure services built on the domain types and ports.

mod exit_hooks;
mod launch_builder;
mod owner_resolver;

pub use exit_hooks::ExitHooks;
pub use launch_builder::build_launch_options;
pub use owner_resolver::{ensure_ports_unowned, resolve_owner};
