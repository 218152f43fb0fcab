//! Command handlers.

pub mod paths;
pub mod stage;
pub mod start;
pub mod status;
pub mod stop;
