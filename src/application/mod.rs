//! Application layer: wires adapters into the patrol core.

pub mod runtime;

pub use runtime::{Collaborators, PatrolRuntime};
