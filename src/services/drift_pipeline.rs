//! Drift remediation pipeline.
//!
//! One run walks Context-Assembly → Plan → Critique → Dispatch+Log for a
//! single subject: a drifted project or a scenario aimed at the metasystem.
//! Runs never return an error; the outcome is a [`PipelineReport`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::domain::errors::Collaborator;
use crate::domain::models::{
    Config, Decision, DecisionCategory, DispatchRecord, KnowledgeConfig, PipelineContext,
    PipelinePhase, PipelineReport, Priority, ProjectHealth, Role, Scenario, TaskKind,
};
use crate::domain::ports::{KnowledgeGraph, TaskDispatcher};
use crate::services::bounded::bounded;
use crate::services::knowledge_context::ContextAssembler;
use crate::services::role_router::{summarize, RoleOutcome, RoleRouter};

const VERDICT_PREVIEW_CHARS: usize = 100;

/// Timeouts and limits a pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub dispatch_timeout: Duration,
    pub knowledge_timeout: Duration,
    pub knowledge: KnowledgeConfig,
    /// Workspace scenarios are dispatched to.
    pub metasystem_name: String,
    /// Label for the fleet manifest in planner background context.
    pub manifest_label: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl PipelineSettings {
    /// Settings from the `timeouts`, `knowledge`, `patrol` and `fleet` sections.
    pub fn from_config(config: &Config) -> Self {
        Self {
            dispatch_timeout: config.timeouts.dispatch(),
            knowledge_timeout: config.timeouts.knowledge(),
            knowledge: config.knowledge.clone(),
            metasystem_name: config.patrol.metasystem_name.clone(),
            manifest_label: config.fleet.manifest_path.clone(),
        }
    }
}

/// Runs remediation for drifted projects and scenarios.
///
/// Every collaborator call is bounded by a timeout. A run that reaches
/// Dispatch logs at most one decision, and only after the hand-off succeeded.
pub struct DriftPipeline {
    router: Arc<RoleRouter>,
    assembler: ContextAssembler,
    dispatcher: Arc<dyn TaskDispatcher>,
    knowledge: Arc<dyn KnowledgeGraph>,
    settings: PipelineSettings,
}

impl DriftPipeline {
    /// Pipeline routing role calls through `router`.
    pub fn new(
        router: Arc<RoleRouter>,
        dispatcher: Arc<dyn TaskDispatcher>,
        knowledge: Arc<dyn KnowledgeGraph>,
        settings: PipelineSettings,
    ) -> Self {
        let assembler = ContextAssembler::new(
            knowledge.clone(),
            settings.knowledge_timeout,
            settings.knowledge.clone(),
        );
        Self {
            router,
            assembler,
            dispatcher,
            knowledge,
            settings,
        }
    }

    /// Workspace scenario tasks are dispatched to.
    pub fn metasystem_name(&self) -> &str {
        &self.settings.metasystem_name
    }

    /// Remediate one drifted (or errored) project.
    #[instrument(skip(self, project), fields(subject = %project.name, status = %project.status))]
    pub async fn run_drift(&self, project: &ProjectHealth) -> PipelineReport {
        info!("dispatching planner to fix drift");
        let mut ctx = PipelineContext::new(project.name.clone(), TaskKind::DriftFix);
        ctx.knowledge_context = self.assembler.for_drift(project).await;

        let modules = project.missing_modules.join(", ");
        let plan_prompt = format!(
            "Analyze drift in {}. Missing modules: {modules}\n\n{}",
            project.name, ctx.knowledge_context
        );
        let background = format!(
            "Context: {}. Project genome: {}",
            self.settings.manifest_label, project.name
        );
        if let Err(report) = self.plan_and_critique(&mut ctx, &plan_prompt, &background).await {
            return report;
        }

        let plan = ctx.plan_text.as_deref().unwrap_or_default();
        let review = ctx.review_text.as_deref().unwrap_or_default();
        let record = DispatchRecord {
            subject_name: project.name.clone(),
            task_kind: TaskKind::DriftFix,
            title: format!("Auto-Fix Drift: {} (Reviewed by Critic)", project.name),
            description: format!(
                "## KNOWLEDGE GRAPH INSIGHTS\n{}\n\n## PLANNER PLAN\n{plan}\n\n## REVIEWER CRITIQUE\n{review}",
                ctx.knowledge_context
            ),
            priority: Priority::High,
        };

        let mut tags = vec!["drift".to_string(), "auto-fix".to_string()];
        tags.extend(project.missing_modules.iter().cloned());
        let decision = Decision {
            decision: format!("Fix drift in {}: {modules}", project.name),
            rationale: plan.chars().take(self.settings.knowledge.rationale_chars).collect(),
            category: DecisionCategory::Architecture,
            project: project.name.clone(),
            tags,
        };

        self.dispatch_and_log(&ctx, record, decision).await
    }

    /// Run a canned scenario against the metasystem.
    #[instrument(skip(self, scenario), fields(scenario = scenario.name))]
    pub async fn run_scenario(&self, scenario: &Scenario) -> PipelineReport {
        info!("initiating dream scenario");
        let metasystem = self.settings.metasystem_name.clone();
        let mut ctx = PipelineContext::new(metasystem.clone(), TaskKind::Feature);
        ctx.knowledge_context = self.assembler.for_scenario(scenario, &metasystem).await;

        let background = format!(
            "Context: {}\n{}",
            self.settings.manifest_label, ctx.knowledge_context
        );
        if let Err(report) = self.plan_and_critique(&mut ctx, scenario.prompt, &background).await {
            return report;
        }

        let plan = ctx.plan_text.as_deref().unwrap_or_default();
        let review = ctx.review_text.as_deref().unwrap_or_default();
        let record = DispatchRecord {
            subject_name: metasystem.clone(),
            task_kind: TaskKind::Feature,
            title: format!("Dream: {}", scenario.name),
            description: format!(
                "## SCENARIO: {}\n{}\n\n## KNOWLEDGE GRAPH INSIGHTS\n{}\n\n## PLANNER PLAN\n{plan}\n\n## REVIEWER CRITIQUE\n{review}",
                scenario.name, scenario.description, ctx.knowledge_context
            ),
            priority: Priority::Low,
        };

        let decision = Decision {
            decision: format!("Dream scenario {} for {metasystem}", scenario.name),
            rationale: plan.chars().take(self.settings.knowledge.rationale_chars).collect(),
            category: DecisionCategory::Architecture,
            project: metasystem.clone(),
            tags: vec!["scenario".to_string(), scenario.name.to_string()],
        };

        self.dispatch_and_log(&ctx, record, decision).await
    }

    /// Plan then critique. The critique verdict does not gate dispatch; only
    /// a failure to obtain one does.
    async fn plan_and_critique(
        &self,
        ctx: &mut PipelineContext,
        plan_prompt: &str,
        background: &str,
    ) -> Result<(), PipelineReport> {
        // No call metadata: the post-dispatch log is the only decision of record.
        let plan = match self
            .router
            .call_role(Role::Planner, plan_prompt, background, None)
            .await
        {
            RoleOutcome::Completed(text) => text,
            RoleOutcome::Failed { reason, .. } => {
                return Err(abort(ctx, PipelinePhase::Plan, reason));
            }
        };

        info!(subject = %ctx.subject_name, "dispatching reviewer to critique plan");
        let critique = critique_prompt(&ctx.subject_name, &ctx.knowledge_context, &plan);
        ctx.plan_text = Some(plan);

        let review = match self
            .router
            .call_role(
                Role::Reviewer,
                &critique,
                "Context: Project genome (seed.yaml) and security mandates.",
                None,
            )
            .await
        {
            RoleOutcome::Completed(text) => text,
            RoleOutcome::Failed { reason, .. } => {
                return Err(abort(ctx, PipelinePhase::Critique, reason));
            }
        };

        info!(
            subject = %ctx.subject_name,
            verdict = %summarize(&review, VERDICT_PREVIEW_CHARS),
            "reviewer verdict"
        );
        ctx.review_text = Some(review);
        Ok(())
    }

    /// Dispatch, then log exactly one decision. No log without a dispatch.
    async fn dispatch_and_log(
        &self,
        ctx: &PipelineContext,
        record: DispatchRecord,
        decision: Decision,
    ) -> PipelineReport {
        let receipt = match bounded(
            Collaborator::Dispatch,
            self.settings.dispatch_timeout,
            self.dispatcher.dispatch(&record),
        )
        .await
        {
            Ok(receipt) => receipt,
            Err(err) => return abort(ctx, PipelinePhase::Dispatch, err.to_string()),
        };
        info!(
            subject = %ctx.subject_name,
            task_id = %receipt.task_id,
            priority = %record.priority,
            "task dispatched"
        );

        let decision_logged = match bounded(
            Collaborator::Knowledge,
            self.settings.knowledge_timeout,
            self.knowledge.log_decision(decision),
        )
        .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(subject = %ctx.subject_name, error = %err, "failed to log dispatch decision");
                false
            }
        };

        PipelineReport::Dispatched {
            subject_name: ctx.subject_name.clone(),
            task_id: receipt.task_id,
            decision_logged,
        }
    }
}

/// Reviewer prompt with the four mandatory checks.
pub fn critique_prompt(subject: &str, knowledge_context: &str, plan: &str) -> String {
    format!(
        "Critically review the following plan for {subject}.\n\n\
         MANDATORY CHECKS:\n\
         1. Does it violate any 'non_goals' defined in 'seed.yaml'?\n\
         2. Does it respect the 'automation_contract' (e.g. disallowed_writes)?\n\
         3. Is it aligned with the 'problem_statement'?\n\
         4. Does it consider past decisions and similar work from the knowledge graph?\n\n\
         KNOWLEDGE GRAPH CONTEXT:\n{knowledge_context}\n\n\
         PLAN:\n{plan}"
    )
}

fn abort(ctx: &PipelineContext, phase: PipelinePhase, reason: String) -> PipelineReport {
    warn!(subject = %ctx.subject_name, phase = %phase, reason = %reason, "pipeline aborted");
    PipelineReport::Aborted {
        subject_name: ctx.subject_name.clone(),
        phase,
        reason,
    }
}
