use async_trait::async_trait;

use crate::domain::models::{Decision, DecisionRecord, FileChange, ProjectContext};

/// Error type for knowledge operations
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("Knowledge store unavailable: {0}")]
    Unavailable(String),

    #[error("Knowledge query failed: {0}")]
    QueryFailed(String),
}

/// Store of past decisions and project activity.
///
/// Every operation is best-effort from the core's point of view: a failure
/// yields an empty section or a skipped log line, never an aborted pipeline.
#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    /// Past decisions in `project` relevant to `topic`.
    async fn find_past_decisions(
        &self,
        topic: &str,
        project: &str,
    ) -> Result<Vec<DecisionRecord>, KnowledgeError>;

    /// Similar work done in projects other than `project`.
    async fn find_similar_work(
        &self,
        description: &str,
        project: &str,
    ) -> Result<Vec<DecisionRecord>, KnowledgeError>;

    /// Activity in `project` over the last `hours`.
    async fn project_context(
        &self,
        project: &str,
        hours: u32,
    ) -> Result<ProjectContext, KnowledgeError>;

    /// Files changed in `project` over the last `hours`, newest first.
    async fn recent_file_changes(
        &self,
        project: &str,
        hours: u32,
    ) -> Result<Vec<FileChange>, KnowledgeError>;

    /// Record a decision.
    async fn log_decision(&self, decision: Decision) -> Result<(), KnowledgeError>;
}
