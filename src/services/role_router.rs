//! Role-based model routing.
//!
//! Maps each [`Role`] to its configured provider, wraps the caller's context in
//! a role system prompt and invokes the provider port. Provider failures come
//! back as [`RoleOutcome::Failed`] rather than errors so one role's failure
//! cannot abort neighbouring pipelines or the patrol tick.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::domain::errors::{Collaborator, ConfigurationError};
use crate::domain::models::{
    Decision, DecisionCategory, ProviderDescriptor, Role, RoleAssignments, TaskKind,
};
use crate::domain::ports::{KnowledgeGraph, ProviderClient};
use crate::services::bounded::bounded;

/// Marker carried by the rendered text of a failed role call.
pub const ERROR_MARKER: &str = "[ERROR]";

const DEFAULT_SUMMARY_CHARS: usize = 300;

/// Optional metadata that turns a successful call into a decision of record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallMetadata {
    pub subject_name: Option<String>,
    pub task_kind: Option<TaskKind>,
}

impl CallMetadata {
    /// Metadata naming `subject_name` as the project a decision is filed under.
    pub fn for_subject(subject_name: impl Into<String>, task_kind: TaskKind) -> Self {
        Self {
            subject_name: Some(subject_name.into()),
            task_kind: Some(task_kind),
        }
    }
}

/// Result of a role call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleOutcome {
    Completed(String),
    Failed { role: Role, reason: String },
}

impl RoleOutcome {
    /// True when the provider answered.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The result text, if the call completed.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Completed(text) => Some(text),
            Self::Failed { .. } => None,
        }
    }

    /// Render for display; failures become `[ERROR] Failed to contact ROLE: reason`.
    pub fn render(&self) -> String {
        match self {
            Self::Completed(text) => text.clone(),
            Self::Failed { role, reason } => format!(
                "{ERROR_MARKER} Failed to contact {}: {reason}",
                role.display_name()
            ),
        }
    }
}

/// Routes role calls to their providers.
pub struct RoleRouter {
    roles: RoleAssignments,
    client: Arc<dyn ProviderClient>,
    knowledge: Arc<dyn KnowledgeGraph>,
    provider_timeout: Duration,
    knowledge_timeout: Duration,
    summary_chars: usize,
    system_name: String,
}

impl RoleRouter {
    /// Router over `roles`, rejecting assignments with an empty model.
    ///
    /// Defaults: 300 s provider timeout, 10 s knowledge timeout, 300-character
    /// summaries, `metasystem` as the system name.
    pub fn new(
        roles: RoleAssignments,
        client: Arc<dyn ProviderClient>,
        knowledge: Arc<dyn KnowledgeGraph>,
    ) -> Result<Self, ConfigurationError> {
        roles.validate()?;
        Ok(Self {
            roles,
            client,
            knowledge,
            provider_timeout: Duration::from_secs(300),
            knowledge_timeout: Duration::from_secs(10),
            summary_chars: DEFAULT_SUMMARY_CHARS,
            system_name: "metasystem".to_string(),
        })
    }

    /// Override the provider and knowledge-write timeouts.
    pub fn with_timeouts(mut self, provider: Duration, knowledge: Duration) -> Self {
        self.provider_timeout = provider;
        self.knowledge_timeout = knowledge;
        self
    }

    /// Characters of a role result kept in a logged decision's rationale.
    pub fn with_summary_chars(mut self, summary_chars: usize) -> Self {
        self.summary_chars = summary_chars;
        self
    }

    /// Name the system prompt introduces the agent as part of.
    pub fn with_system_name(mut self, system_name: impl Into<String>) -> Self {
        self.system_name = system_name.into();
        self
    }

    /// Provider configured for `role`.
    pub fn provider_for(&self, role: Role) -> &ProviderDescriptor {
        self.roles.get(role)
    }

    /// System prompt for `role`: identity, background context, role instructions.
    pub fn system_prompt(&self, role: Role, background_context: &str) -> String {
        format!(
            "You are the {} of the {} Metasystem.\n\
             Your goal is to maintain and grow the system autonomously.\n\n\
             CONTEXT:\n{background_context}\n\n\
             INSTRUCTIONS:\n{}\n",
            role.display_name(),
            self.system_name,
            role.instructions(),
        )
    }

    /// Invoke `role` with `user_prompt`.
    ///
    /// When `metadata` names a subject and a Planner or Builder call completes,
    /// a decision is recorded in the knowledge graph. Reviewer calls never are.
    #[instrument(skip(self, user_prompt, background_context, metadata), fields(role = %role))]
    pub async fn call_role(
        &self,
        role: Role,
        user_prompt: &str,
        background_context: &str,
        metadata: Option<&CallMetadata>,
    ) -> RoleOutcome {
        let provider = self.provider_for(role);
        info!(
            provider = %provider.vendor,
            model = %provider.model,
            "routing role call"
        );

        let system_prompt = self.system_prompt(role, background_context);
        let outcome = match bounded(
            Collaborator::Provider,
            self.provider_timeout,
            self.client.invoke(provider, &system_prompt, user_prompt),
        )
        .await
        {
            Ok(reply) => RoleOutcome::Completed(reply.content),
            Err(err) => {
                warn!(error = %err, "role call failed");
                RoleOutcome::Failed {
                    role,
                    reason: err.to_string(),
                }
            }
        };

        if let (RoleOutcome::Completed(content), Some(metadata)) = (&outcome, metadata) {
            self.record_decision(role, content, metadata).await;
        }

        outcome
    }

    async fn record_decision(&self, role: Role, content: &str, metadata: &CallMetadata) {
        let Some(subject) = metadata.subject_name.as_deref() else {
            return;
        };
        // Text carrying the failure marker is never a decision of record.
        if !role.records_decisions() || content.contains(ERROR_MARKER) {
            return;
        }

        let decision = match role {
            Role::Planner => self.planner_decision(content, subject, metadata.task_kind),
            Role::Builder => self.builder_decision(content, subject, metadata.task_kind),
            Role::Reviewer => return,
        };

        match bounded(
            Collaborator::Knowledge,
            self.knowledge_timeout,
            self.knowledge.log_decision(decision),
        )
        .await
        {
            Ok(()) => info!(subject, "logged {} decision to knowledge graph", role),
            Err(err) => warn!(subject, error = %err, "failed to log decision to knowledge graph"),
        }
    }

    fn planner_decision(&self, plan: &str, subject: &str, kind: Option<TaskKind>) -> Decision {
        let kind_label = kind.map_or("task", |k| k.as_str());
        Decision {
            decision: format!("{kind_label} for {subject}"),
            rationale: summarize(plan, self.summary_chars),
            category: DecisionCategory::Architecture,
            project: subject.to_string(),
            tags: vec![
                kind.map_or("general", |k| k.as_str()).to_string(),
                "planner-agent".to_string(),
                "automated".to_string(),
            ],
        }
    }

    fn builder_decision(&self, output: &str, subject: &str, kind: Option<TaskKind>) -> Decision {
        let kind_label = kind.map_or("changes", |k| k.as_str());
        let blocks = count_code_blocks(output);
        let rationale = if blocks > 0 {
            format!("Generated {blocks} code blocks")
        } else {
            summarize(output, self.summary_chars)
        };

        let mut tags = vec![
            kind.map_or("general", |k| k.as_str()).to_string(),
            "builder-agent".to_string(),
            "automated".to_string(),
        ];
        if blocks > 0 {
            tags.push("code-generation".to_string());
        }

        Decision {
            decision: format!("Implemented {kind_label} for {subject}"),
            rationale,
            category: DecisionCategory::Implementation,
            project: subject.to_string(),
            tags,
        }
    }
}

/// First `max_chars` characters with newlines collapsed.
pub fn summarize(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Count fenced (```) code blocks. An unterminated fence does not count.
pub fn count_code_blocks(text: &str) -> usize {
    let mut open = false;
    let mut blocks = 0;
    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            if open {
                blocks += 1;
            }
            open = !open;
        }
    }
    blocks
}
