//! Serializable views of pipeline and tick outcomes.

use serde::Serialize;

use crate::cli::display::{colorize_outcome, list_table};
use crate::domain::models::PipelineReport;
use crate::domain::RateExceeded;
use crate::services::TickReport;

/// One pipeline run, flattened for the runs table.
#[derive(Debug, Serialize)]
pub struct RunRow {
    pub subject: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_logged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&PipelineReport> for RunRow {
    fn from(report: &PipelineReport) -> Self {
        match report {
            PipelineReport::Dispatched {
                subject_name,
                task_id,
                decision_logged,
            } => Self {
                subject: subject_name.clone(),
                outcome: "dispatched".to_string(),
                task_id: Some(task_id.clone()),
                decision_logged: Some(*decision_logged),
                phase: None,
                reason: None,
            },
            PipelineReport::Aborted {
                subject_name,
                phase,
                reason,
            } => Self {
                subject: subject_name.clone(),
                outcome: "aborted".to_string(),
                task_id: None,
                decision_logged: None,
                phase: Some(phase.as_str().to_string()),
                reason: Some(reason.clone()),
            },
        }
    }
}

/// Render pipeline runs as a table.
pub fn runs_table(rows: &[RunRow]) -> String {
    let mut table = list_table(&["subject", "outcome", "detail"]);
    for row in rows {
        let detail = match (&row.task_id, &row.phase, &row.reason) {
            (Some(id), _, _) if row.decision_logged == Some(false) => {
                format!("{id} (decision not logged)")
            }
            (Some(id), _, _) => id.clone(),
            (None, Some(phase), Some(reason)) => format!("at {phase}: {reason}"),
            _ => String::new(),
        };
        table.add_row(vec![
            row.subject.clone(),
            colorize_outcome(&row.outcome).to_string(),
            detail,
        ]);
    }
    table.to_string()
}

/// Rate gate load shown after a command.
#[derive(Debug, Serialize)]
pub struct GateBlock {
    pub recent_actions: usize,
    pub max_actions: u32,
    pub window_secs: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reopens_at: Option<String>,
}

impl From<&RateExceeded> for GateBlock {
    fn from(exceeded: &RateExceeded) -> Self {
        Self {
            recent_actions: exceeded.recent_actions,
            max_actions: exceeded.max_actions,
            window_secs: exceeded.window_secs,
            reopens_at: exceeded.reopens_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// What one patrol tick did.
#[derive(Debug, Serialize)]
pub struct TickView {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub runs: Vec<RunRow>,
    pub deferred: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
}

impl From<&TickReport> for TickView {
    fn from(report: &TickReport) -> Self {
        let empty = Self {
            outcome: "",
            gate: None,
            reason: None,
            runs: Vec::new(),
            deferred: Vec::new(),
            scenario: None,
        };
        match report {
            TickReport::Skipped(exceeded) => Self {
                outcome: "skipped",
                gate: Some(exceeded.into()),
                ..empty
            },
            TickReport::Unscanned { reason } => Self {
                outcome: "unscanned",
                reason: Some(reason.clone()),
                ..empty
            },
            TickReport::Drift { ran, deferred } => Self {
                outcome: "drift",
                runs: ran.iter().map(RunRow::from).collect(),
                deferred: deferred.clone(),
                ..empty
            },
            TickReport::Calm { scenario } => Self {
                outcome: "calm",
                runs: scenario.iter().map(|s| RunRow::from(&s.report)).collect(),
                scenario: scenario.as_ref().map(|s| s.name.to_string()),
                ..empty
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PipelinePhase;
    use crate::services::ScenarioRun;

    #[test]
    fn test_aborted_row_carries_phase() {
        let row = RunRow::from(&PipelineReport::Aborted {
            subject_name: "proj-a".to_string(),
            phase: PipelinePhase::Critique,
            reason: "timeout".to_string(),
        });
        assert_eq!(row.outcome, "aborted");
        assert_eq!(row.phase.as_deref(), Some("critique"));
        assert!(row.task_id.is_none());
    }

    #[test]
    fn test_calm_tick_with_scenario() {
        let report = TickReport::Calm {
            scenario: Some(ScenarioRun {
                name: "test-gap-hunt",
                report: PipelineReport::Dispatched {
                    subject_name: "meta".to_string(),
                    task_id: "task-1".to_string(),
                    decision_logged: true,
                },
            }),
        };
        let view = TickView::from(&report);
        assert_eq!(view.outcome, "calm");
        assert_eq!(view.scenario.as_deref(), Some("test-gap-hunt"));
        assert_eq!(view.runs.len(), 1);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["runs"][0]["task_id"], "task-1");
        assert!(json.get("gate").is_none());
    }
}
