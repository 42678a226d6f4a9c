//! Process-local knowledge graph.
//!
//! Decisions and file changes live for the lifetime of the process, up to a
//! retention cap past which the oldest entries are dropped. Queries match on
//! keywords: a record is relevant when any word of the query (three
//! characters or longer) appears in its decision text, rationale or tags.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::RwLock;

use crate::domain::models::{Decision, DecisionRecord, FileChange, ProjectContext};
use crate::domain::ports::{Clock, KnowledgeError, KnowledgeGraph, SystemClock};

const MIN_KEYWORD_LEN: usize = 3;
const DEFAULT_MAX_RECORDS: usize = 10_000;

/// Keyword-matching [`KnowledgeGraph`] held in memory.
///
/// At most `max_records` decisions, and `max_records` file changes per
/// project, are retained; inserting past the cap evicts the oldest entry.
pub struct InMemoryKnowledgeGraph {
    decisions: RwLock<VecDeque<DecisionRecord>>,
    file_changes: RwLock<HashMap<String, VecDeque<FileChange>>>,
    max_records: usize,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryKnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryKnowledgeGraph {
    /// Empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty store stamping decisions with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            decisions: RwLock::new(VecDeque::new()),
            file_changes: RwLock::new(HashMap::new()),
            max_records: DEFAULT_MAX_RECORDS,
            clock,
        }
    }

    /// Retention cap. Zero is treated as one.
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records.max(1);
        self
    }

    /// Record a file change for `project`.
    pub async fn record_file_change(&self, project: &str, change: FileChange) {
        let mut changes = self.file_changes.write().await;
        let entries = changes.entry(project.to_string()).or_default();
        push_capped(entries, change, self.max_records);
    }

    /// Every retained decision, oldest first.
    pub async fn decisions(&self) -> Vec<DecisionRecord> {
        self.decisions.read().await.iter().cloned().collect()
    }

    async fn matching<F>(&self, query: &str, keep: F) -> Vec<DecisionRecord>
    where
        F: Fn(&DecisionRecord) -> bool,
    {
        let keywords = keywords(query);
        let mut hits: Vec<DecisionRecord> = self
            .decisions
            .read()
            .await
            .iter()
            .filter(|record| keep(record) && mentions_any(record, &keywords))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        hits
    }
}

fn push_capped<T>(entries: &mut VecDeque<T>, item: T, cap: usize) {
    while entries.len() >= cap {
        entries.pop_front();
    }
    entries.push_back(item);
}

fn keywords(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric() && c != '-' && c != '_')
        .filter(|word| word.len() >= MIN_KEYWORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

fn mentions_any(record: &DecisionRecord, keywords: &[String]) -> bool {
    let haystack = format!(
        "{} {} {}",
        record.decision,
        record.rationale,
        record.tags.join(" ")
    )
    .to_lowercase();
    keywords.iter().any(|word| haystack.contains(word.as_str()))
}

#[async_trait]
impl KnowledgeGraph for InMemoryKnowledgeGraph {
    async fn find_past_decisions(
        &self,
        topic: &str,
        project: &str,
    ) -> Result<Vec<DecisionRecord>, KnowledgeError> {
        Ok(self.matching(topic, |r| r.project == project).await)
    }

    async fn find_similar_work(
        &self,
        description: &str,
        project: &str,
    ) -> Result<Vec<DecisionRecord>, KnowledgeError> {
        Ok(self.matching(description, |r| r.project != project).await)
    }

    async fn project_context(
        &self,
        project: &str,
        hours: u32,
    ) -> Result<ProjectContext, KnowledgeError> {
        let since = self.clock.now() - Duration::hours(i64::from(hours));

        let mut recent_decisions: Vec<DecisionRecord> = self
            .decisions
            .read()
            .await
            .iter()
            .filter(|r| r.project == project && r.recorded_at >= since)
            .cloned()
            .collect();
        recent_decisions.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));

        let recent_files = self.recent_file_changes(project, hours).await?;
        Ok(ProjectContext {
            recent_decisions,
            recent_files,
        })
    }

    async fn recent_file_changes(
        &self,
        project: &str,
        hours: u32,
    ) -> Result<Vec<FileChange>, KnowledgeError> {
        let since = self.clock.now() - Duration::hours(i64::from(hours));
        let mut changes: Vec<FileChange> = self
            .file_changes
            .read()
            .await
            .get(project)
            .map(|all| {
                all.iter()
                    .filter(|c| c.modified_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        changes.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(changes)
    }

    async fn log_decision(&self, decision: Decision) -> Result<(), KnowledgeError> {
        let record = DecisionRecord::from_decision(decision, self.clock.now());
        tracing::debug!(project = %record.project, tags = ?record.tags, "decision recorded");
        push_capped(&mut *self.decisions.write().await, record, self.max_records);
        Ok(())
    }
}
