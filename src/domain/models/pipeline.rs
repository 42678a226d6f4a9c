use serde::{Deserialize, Serialize};

/// Kind of remediation work a pipeline run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    DriftFix,
    Feature,
    Refactor,
    BugFix,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DriftFix => "drift-fix",
            Self::Feature => "feature",
            Self::Refactor => "refactor",
            Self::BugFix => "bug-fix",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority written into the dispatched task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient state of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub subject_name: String,
    pub task_kind: TaskKind,
    pub knowledge_context: String,
    pub plan_text: Option<String>,
    /// Absent until the Critique phase completes.
    pub review_text: Option<String>,
}

impl PipelineContext {
    pub fn new(subject_name: impl Into<String>, task_kind: TaskKind) -> Self {
        Self {
            subject_name: subject_name.into(),
            task_kind,
            knowledge_context: String::new(),
            plan_text: None,
            review_text: None,
        }
    }
}

/// Pipeline phase, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    ContextAssembly,
    Plan,
    Critique,
    Dispatch,
    Log,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContextAssembly => "context_assembly",
            Self::Plan => "plan",
            Self::Critique => "critique",
            Self::Dispatch => "dispatch",
            Self::Log => "log",
        }
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one pipeline run. Runs never raise to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineReport {
    /// The task was handed off to the dispatch collaborator.
    Dispatched {
        subject_name: String,
        task_id: String,
        /// False when the post-dispatch decision log failed.
        decision_logged: bool,
    },
    /// The run terminated early.
    Aborted {
        subject_name: String,
        phase: PipelinePhase,
        reason: String,
    },
}

impl PipelineReport {
    /// True when the run handed a task off.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }

    /// Project or metasystem the run targeted.
    pub fn subject_name(&self) -> &str {
        match self {
            Self::Dispatched { subject_name, .. } | Self::Aborted { subject_name, .. } => {
                subject_name
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind_names() {
        assert_eq!(TaskKind::DriftFix.as_str(), "drift-fix");
        assert_eq!(serde_json::to_value(TaskKind::BugFix).unwrap(), "bug-fix");
    }

    #[test]
    fn test_report_accessors() {
        let report = PipelineReport::Aborted {
            subject_name: "proj-a".to_string(),
            phase: PipelinePhase::Plan,
            reason: "timeout".to_string(),
        };
        assert!(!report.is_dispatched());
        assert_eq!(report.subject_name(), "proj-a");
    }
}
