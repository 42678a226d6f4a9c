//! Knowledge context assembly for pipeline prompts.
//!
//! Issues the knowledge queries for one subject concurrently and renders the
//! results into a Markdown block. Enrichment is advisory: a failed or slow
//! query contributes an empty section.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::errors::Collaborator;
use crate::domain::models::{
    DecisionRecord, FileChange, KnowledgeConfig, ProjectContext, ProjectHealth, Scenario,
};
use crate::domain::ports::KnowledgeGraph;
use crate::services::bounded::bounded;

const DRIFT_PAST_DECISIONS: usize = 3;
const DRIFT_RECENT_FILES: usize = 5;
const DRIFT_SIMILAR_WORK: usize = 3;
const SCENARIO_PAST_DECISIONS: usize = 5;
const SCENARIO_SIMILAR_WORK: usize = 3;

const DRIFT_TOPIC: &str = "drift architecture";

/// Builds the knowledge context block for drift and scenario runs.
pub struct ContextAssembler {
    knowledge: Arc<dyn KnowledgeGraph>,
    timeout: Duration,
    config: KnowledgeConfig,
}

impl ContextAssembler {
    /// Assembler bounding each query by `timeout`.
    pub fn new(knowledge: Arc<dyn KnowledgeGraph>, timeout: Duration, config: KnowledgeConfig) -> Self {
        Self {
            knowledge,
            timeout,
            config,
        }
    }

    /// Context for a drifted project: project summary, past decisions,
    /// recently modified files and similar work elsewhere, in that order.
    pub async fn for_drift(&self, project: &ProjectHealth) -> String {
        let name = project.name.as_str();
        let similar_query = format!("fix drift in {}", project.missing_modules.join(" "));

        let (context, past, files, similar) = tokio::join!(
            self.query(
                "project_context",
                self.knowledge.project_context(name, self.config.project_context_hours),
            ),
            self.query(
                "past_decisions",
                self.knowledge.find_past_decisions(DRIFT_TOPIC, name),
            ),
            self.query(
                "recent_file_changes",
                self.knowledge.recent_file_changes(name, self.config.recent_files_hours),
            ),
            self.query(
                "similar_work",
                self.knowledge.find_similar_work(&similar_query, name),
            ),
        );

        let mut out = String::from("\n## KNOWLEDGE GRAPH CONTEXT\n\n");
        render_project_summary(&mut out, name, &context.unwrap_or_default());
        render_past_decisions(
            &mut out,
            "Past Decisions Related to Drift",
            &past.unwrap_or_default(),
            DRIFT_PAST_DECISIONS,
            false,
        );
        render_recent_files(&mut out, &files.unwrap_or_default(), DRIFT_RECENT_FILES);
        render_similar_work(&mut out, &similar.unwrap_or_default(), DRIFT_SIMILAR_WORK);

        debug!(subject = name, bytes = out.len(), "assembled drift knowledge context");
        out
    }

    /// Context for a scenario targeting the metasystem.
    pub async fn for_scenario(&self, scenario: &Scenario, metasystem: &str) -> String {
        let (past, similar) = tokio::join!(
            self.query(
                "past_decisions",
                self.knowledge.find_past_decisions(scenario.name, metasystem),
            ),
            self.query(
                "similar_work",
                self.knowledge.find_similar_work(scenario.description, metasystem),
            ),
        );

        let mut out = String::from("\n## KNOWLEDGE GRAPH CONTEXT\n\n");
        render_past_decisions(
            &mut out,
            "Past Decisions",
            &past.unwrap_or_default(),
            SCENARIO_PAST_DECISIONS,
            true,
        );
        render_similar_work(&mut out, &similar.unwrap_or_default(), SCENARIO_SIMILAR_WORK);

        debug!(scenario = scenario.name, bytes = out.len(), "assembled scenario knowledge context");
        out
    }

    async fn query<T, F>(&self, name: &'static str, call: F) -> Option<T>
    where
        F: std::future::Future<Output = Result<T, crate::domain::ports::KnowledgeError>>,
    {
        match bounded(Collaborator::Knowledge, self.timeout, call).await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(query = name, error = %err, "knowledge query failed; continuing without it");
                None
            }
        }
    }
}

fn render_project_summary(out: &mut String, name: &str, context: &ProjectContext) {
    let _ = writeln!(out, "### Project: {name}");
    let _ = writeln!(out, "- Recent Decisions: {}", context.recent_decisions.len());
    let _ = writeln!(out, "- Recent File Changes: {}\n", context.recent_files.len());
}

fn render_past_decisions(
    out: &mut String,
    heading: &str,
    decisions: &[DecisionRecord],
    limit: usize,
    with_category: bool,
) {
    if decisions.is_empty() {
        return;
    }
    let _ = writeln!(out, "### {heading}:");
    for d in decisions.iter().take(limit) {
        if with_category {
            let _ = writeln!(
                out,
                "- **{}**: {} ({})",
                d.decision,
                d.rationale,
                d.category.as_str()
            );
        } else {
            let _ = writeln!(out, "- **{}**: {}", d.decision, d.rationale);
        }
    }
    out.push('\n');
}

fn render_recent_files(out: &mut String, files: &[FileChange], limit: usize) {
    if files.is_empty() {
        return;
    }
    out.push_str("### Recently Modified Files:\n");
    for f in files.iter().take(limit) {
        let _ = writeln!(
            out,
            "- {} ({}, {})",
            f.path,
            f.operation,
            f.modified_at.to_rfc3339()
        );
    }
    out.push('\n');
}

fn render_similar_work(out: &mut String, work: &[DecisionRecord], limit: usize) {
    if work.is_empty() {
        return;
    }
    out.push_str("### Similar Work in Other Projects:\n");
    for w in work.iter().take(limit) {
        let _ = writeln!(out, "- **{}**: {} - {}", w.project, w.decision, w.rationale);
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Decision, DecisionCategory};
    use crate::domain::ports::KnowledgeError;
    use async_trait::async_trait;
    use chrono::Utc;

    fn record(project: &str, decision: &str) -> DecisionRecord {
        DecisionRecord {
            decision: decision.to_string(),
            rationale: format!("because {decision}"),
            category: DecisionCategory::Architecture,
            project: project.to_string(),
            tags: Vec::new(),
            recorded_at: Utc::now(),
        }
    }

    #[derive(Default)]
    struct FixedKnowledge {
        fail_past: bool,
        stall_files: bool,
    }

    #[async_trait]
    impl KnowledgeGraph for FixedKnowledge {
        async fn find_past_decisions(&self, _: &str, project: &str) -> Result<Vec<DecisionRecord>, KnowledgeError> {
            if self.fail_past {
                return Err(KnowledgeError::Unavailable("offline".to_string()));
            }
            Ok((0..6).map(|i| record(project, &format!("past-{i}"))).collect())
        }

        async fn find_similar_work(&self, _: &str, _: &str) -> Result<Vec<DecisionRecord>, KnowledgeError> {
            Ok((0..4).map(|i| record("other", &format!("similar-{i}"))).collect())
        }

        async fn project_context(&self, project: &str, _: u32) -> Result<ProjectContext, KnowledgeError> {
            Ok(ProjectContext {
                recent_decisions: vec![record(project, "recent")],
                recent_files: Vec::new(),
            })
        }

        async fn recent_file_changes(&self, _: &str, _: u32) -> Result<Vec<FileChange>, KnowledgeError> {
            if self.stall_files {
                std::future::pending::<()>().await;
            }
            Ok((0..7)
                .map(|i| FileChange {
                    path: format!("src/file_{i}.rs"),
                    operation: "modified".to_string(),
                    modified_at: Utc::now(),
                })
                .collect())
        }

        async fn log_decision(&self, _: Decision) -> Result<(), KnowledgeError> {
            Ok(())
        }
    }

    fn assembler(fail_past: bool) -> ContextAssembler {
        assembler_over(FixedKnowledge {
            fail_past,
            ..Default::default()
        })
    }

    fn assembler_over(knowledge: FixedKnowledge) -> ContextAssembler {
        ContextAssembler::new(
            Arc::new(knowledge),
            Duration::from_secs(1),
            KnowledgeConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_drift_sections_in_order_and_truncated() {
        let project = ProjectHealth::drifted("proj-a", vec!["auth".to_string()]);
        let ctx = assembler(false).for_drift(&project).await;

        let summary = ctx.find("### Project: proj-a").unwrap();
        let past = ctx.find("### Past Decisions Related to Drift").unwrap();
        let files = ctx.find("### Recently Modified Files").unwrap();
        let similar = ctx.find("### Similar Work in Other Projects").unwrap();
        assert!(summary < past && past < files && files < similar);

        assert!(ctx.contains("- Recent Decisions: 1"));
        assert!(ctx.contains("past-2"));
        assert!(!ctx.contains("past-3"));
        assert!(ctx.contains("src/file_4.rs"));
        assert!(!ctx.contains("src/file_5.rs"));
        assert!(ctx.contains("similar-2"));
        assert!(!ctx.contains("similar-3"));
    }

    #[tokio::test]
    async fn test_failed_query_yields_empty_section() {
        let project = ProjectHealth::drifted("proj-a", vec![]);
        let ctx = assembler(true).for_drift(&project).await;

        assert!(!ctx.contains("### Past Decisions"));
        assert!(ctx.contains("### Recently Modified Files"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_query_is_dropped_after_timeout() {
        let project = ProjectHealth::drifted("proj-a", vec!["auth".to_string()]);
        let started = tokio::time::Instant::now();
        let ctx = assembler_over(FixedKnowledge {
            stall_files: true,
            ..Default::default()
        })
        .for_drift(&project)
        .await;

        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(1) && waited < Duration::from_secs(2));
        assert!(!ctx.contains("### Recently Modified Files"));
        assert!(ctx.contains("### Project: proj-a"));
        assert!(ctx.contains("### Past Decisions Related to Drift"));
        assert!(ctx.contains("### Similar Work in Other Projects"));
    }

    #[tokio::test]
    async fn test_scenario_context_includes_categories() {
        let scenario = Scenario {
            name: "docs",
            description: "refresh docs",
            prompt: "write docs",
        };
        let ctx = assembler(false).for_scenario(&scenario, "meta").await;

        assert!(ctx.contains("### Past Decisions:"));
        assert!(ctx.contains("(architecture)"));
        assert!(ctx.contains("past-4"));
        assert!(!ctx.contains("past-5"));
        assert!(!ctx.contains("### Project:"));
    }
}
