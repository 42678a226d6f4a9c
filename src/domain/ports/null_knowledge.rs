//! Null knowledge graph implementation.
//!
//! Used when no knowledge store is wired in but the type system
//! requires a KnowledgeGraph implementation.

use async_trait::async_trait;

use super::knowledge_graph::{KnowledgeError, KnowledgeGraph};
use crate::domain::models::{Decision, DecisionRecord, FileChange, ProjectContext};

/// A knowledge graph that remembers nothing.
#[derive(Debug, Clone, Default)]
pub struct NullKnowledgeGraph;

impl NullKnowledgeGraph {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl KnowledgeGraph for NullKnowledgeGraph {
    async fn find_past_decisions(
        &self,
        _topic: &str,
        _project: &str,
    ) -> Result<Vec<DecisionRecord>, KnowledgeError> {
        Ok(Vec::new())
    }

    async fn find_similar_work(
        &self,
        _description: &str,
        _project: &str,
    ) -> Result<Vec<DecisionRecord>, KnowledgeError> {
        Ok(Vec::new())
    }

    async fn project_context(
        &self,
        _project: &str,
        _hours: u32,
    ) -> Result<ProjectContext, KnowledgeError> {
        Ok(ProjectContext::default())
    }

    async fn recent_file_changes(
        &self,
        _project: &str,
        _hours: u32,
    ) -> Result<Vec<FileChange>, KnowledgeError> {
        Ok(Vec::new())
    }

    async fn log_decision(&self, _decision: Decision) -> Result<(), KnowledgeError> {
        Ok(())
    }
}
