//! Domain layer for the nightwatch patrol system
//!
//! Core models, port traits and error types. No I/O lives here.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{Collaborator, CollaboratorError, ConfigurationError, RateExceeded};
