use async_trait::async_trait;

use crate::domain::models::ProjectHealth;

/// Error type for health scanning
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("Fleet manifest unavailable: {0}")]
    Manifest(String),

    #[error("Unknown project: {0}")]
    UnknownProject(String),

    #[error("Scan of {project} failed: {reason}")]
    ScanFailed { project: String, reason: String },
}

/// Health-scan collaborator.
///
/// The core treats a failed `scan` as "assume healthy" so that an unreachable
/// scanner never triggers a storm of drift fixes.
#[async_trait]
pub trait HealthScanner: Send + Sync {
    /// Names of all managed projects, in scan order.
    async fn projects(&self) -> Result<Vec<String>, HealthError>;

    /// Current health of one project.
    async fn scan(&self, project: &str) -> Result<ProjectHealth, HealthError>;
}
