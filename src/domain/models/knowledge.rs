use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a logged decision is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionCategory {
    Architecture,
    Implementation,
}

impl DecisionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Architecture => "architecture",
            Self::Implementation => "implementation",
        }
    }
}

/// Write payload for the knowledge log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub decision: String,
    pub rationale: String,
    pub category: DecisionCategory,
    pub project: String,
    pub tags: Vec<String>,
}

/// A decision as returned by knowledge queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decision: String,
    pub rationale: String,
    pub category: DecisionCategory,
    pub project: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}

impl DecisionRecord {
    /// Stamp a write payload with the time it was stored.
    pub fn from_decision(decision: Decision, recorded_at: DateTime<Utc>) -> Self {
        Self {
            decision: decision.decision,
            rationale: decision.rationale,
            category: decision.category,
            project: decision.project,
            tags: decision.tags,
            recorded_at,
        }
    }
}

/// A file change observed in a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    /// e.g. "created", "modified", "deleted".
    pub operation: String,
    pub modified_at: DateTime<Utc>,
}

/// Recent activity summary for a single project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub recent_decisions: Vec<DecisionRecord>,
    pub recent_files: Vec<FileChange>,
}
