use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::pipeline::{Priority, TaskKind};

/// A fully described task handed to the dispatch collaborator.
///
/// Write-once: after `dispatch` returns, the collaborator owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub subject_name: String,
    pub task_kind: TaskKind,
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

/// Acknowledgement from a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub task_id: String,
    /// Where the task landed, if the collaborator is file based.
    pub location: Option<PathBuf>,
    pub dispatched_at: DateTime<Utc>,
}
