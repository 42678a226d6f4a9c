use async_trait::async_trait;

use crate::domain::models::{DispatchReceipt, DispatchRecord};

/// Error type for dispatch operations
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Workspace '{0}' not found in manifest")]
    UnknownWorkspace(String),

    #[error("Fleet manifest unavailable: {0}")]
    Manifest(String),

    #[error("Failed to write task: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode task: {0}")]
    Encode(String),
}

/// Hands a task off to its target project.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    async fn dispatch(&self, record: &DispatchRecord) -> Result<DispatchReceipt, DispatchError>;
}
