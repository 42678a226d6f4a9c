use async_trait::async_trait;

/// Error type for inbound task processing
#[derive(Debug, thiserror::Error)]
#[error("Inbox processing failed: {0}")]
pub struct InboxError(pub String);

/// Hook for externally queued inbound tasks, run at the start of each tick.
#[async_trait]
pub trait Inbox: Send + Sync {
    /// Process whatever is pending. Returns the number of tasks handled.
    async fn process_pending(&self) -> Result<usize, InboxError>;
}

/// Inbox that never has anything pending.
#[derive(Debug, Clone, Default)]
pub struct NullInbox;

#[async_trait]
impl Inbox for NullInbox {
    async fn process_pending(&self) -> Result<usize, InboxError> {
        tracing::debug!("checking inbox");
        Ok(0)
    }
}
