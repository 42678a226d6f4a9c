//! CLI command implementations.

pub mod config;
pub mod health;
pub mod patrol;
pub mod report;
pub mod role;
pub mod scenario;
pub mod watch;
