//! Configuration loading
//!
//! Layers, lowest precedence first:
//! - built-in defaults
//! - `.nightwatch/config.yaml`
//! - `.nightwatch/local.yaml`
//! - `NIGHTWATCH_` environment variables (`__` separates nested keys)

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
