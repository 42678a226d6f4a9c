//! Fleet manifest and manifest-driven health scanning

pub mod manifest;
pub mod scanner;

pub use manifest::{FleetManifest, ManifestError, WorkspaceEntry};
pub use scanner::ManifestHealthScanner;
