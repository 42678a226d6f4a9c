//! Agent roles and the provider each one is routed to.
//!
//! Roles are assigned to providers by a "token arbitrage" table: a long-context
//! reviewer watches the planner and builder, each on a different vendor.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::errors::ConfigurationError;

/// A fixed function an automated agent performs in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Produces a plan, never code.
    Planner,
    /// Produces concrete content from a plan.
    Builder,
    /// Evaluates a plan against the target project's declared constraints.
    Reviewer,
}

impl Role {
    /// Every role, in pipeline order.
    pub const ALL: [Self; 3] = [Self::Planner, Self::Builder, Self::Reviewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planner => "planner",
            Self::Builder => "builder",
            Self::Reviewer => "reviewer",
        }
    }

    /// Upper-case name used in prompts and error text.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Planner => "PLANNER",
            Self::Builder => "BUILDER",
            Self::Reviewer => "REVIEWER",
        }
    }

    /// Static role instructions embedded in the system prompt.
    pub fn instructions(&self) -> &'static str {
        match self {
            Self::Planner => {
                "Analyze the request and produce a detailed Markdown plan (TASK_PLAN.md). Do not write code yet."
            }
            Self::Builder => {
                "Read the plan and output the specific code file content. Wrap code in ```block```."
            }
            Self::Reviewer => {
                "Review the proposed changes for safety and consistency with the project's declared constraints."
            }
        }
    }

    /// Whether a successful call by this role is a decision of record.
    pub fn records_decisions(&self) -> bool {
        !matches!(self, Self::Reviewer)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role name does not name one of the three fixed roles.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown role: {0}. Must be one of: planner, builder, reviewer")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "planner" | "architect" => Ok(Self::Planner),
            "builder" => Ok(Self::Builder),
            "reviewer" | "critic" => Ok(Self::Reviewer),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Model vendor behind a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderVendor {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    Gemini,
}

impl ProviderVendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for ProviderVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relative price band of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Low,
    Medium,
    High,
}

/// A configured model provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub vendor: ProviderVendor,
    /// Model name passed to the vendor API.
    pub model: String,
    /// Context window in tokens.
    pub context_window: u32,
    pub cost_tier: CostTier,
}

impl ProviderDescriptor {
    pub fn new(
        vendor: ProviderVendor,
        model: impl Into<String>,
        context_window: u32,
        cost_tier: CostTier,
    ) -> Self {
        Self {
            vendor,
            model: model.into(),
            context_window,
            cost_tier,
        }
    }
}

/// Role → provider table. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignments {
    pub planner: ProviderDescriptor,
    pub builder: ProviderDescriptor,
    pub reviewer: ProviderDescriptor,
}

impl Default for RoleAssignments {
    fn default() -> Self {
        Self {
            planner: ProviderDescriptor::new(
                ProviderVendor::Anthropic,
                "claude-3-5-sonnet-20240620",
                200_000,
                CostTier::Medium,
            ),
            builder: ProviderDescriptor::new(
                ProviderVendor::OpenAi,
                "gpt-4o",
                128_000,
                CostTier::Medium,
            ),
            reviewer: ProviderDescriptor::new(
                ProviderVendor::Gemini,
                "gemini-1.5-pro-latest",
                1_000_000,
                CostTier::Medium,
            ),
        }
    }
}

impl RoleAssignments {
    /// Provider assigned to `role`.
    pub fn get(&self, role: Role) -> &ProviderDescriptor {
        match role {
            Role::Planner => &self.planner,
            Role::Builder => &self.builder,
            Role::Reviewer => &self.reviewer,
        }
    }

    /// Reject an assignment with an empty model name.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for role in Role::ALL {
            if self.get(role).model.trim().is_empty() {
                return Err(ConfigurationError::EmptyModel {
                    role: role.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("planner".parse::<Role>(), Ok(Role::Planner));
        assert_eq!("Builder".parse::<Role>(), Ok(Role::Builder));
        assert_eq!("critic".parse::<Role>(), Ok(Role::Reviewer));
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = "janitor".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRole("janitor".to_string()));
    }

    #[test]
    fn test_reviewer_does_not_record_decisions() {
        assert!(Role::Planner.records_decisions());
        assert!(Role::Builder.records_decisions());
        assert!(!Role::Reviewer.records_decisions());
    }

    #[test]
    fn test_default_assignments_cover_every_role() {
        let roles = RoleAssignments::default();
        assert_eq!(roles.get(Role::Planner).vendor, ProviderVendor::Anthropic);
        assert_eq!(roles.get(Role::Builder).model, "gpt-4o");
        assert_eq!(roles.get(Role::Reviewer).context_window, 1_000_000);
        assert!(roles.validate().is_ok());
    }

    #[test]
    fn test_empty_model_fails_validation() {
        let mut roles = RoleAssignments::default();
        roles.builder.model = "  ".to_string();
        assert_eq!(
            roles.validate(),
            Err(ConfigurationError::EmptyModel {
                role: "builder".to_string()
            })
        );
    }

    #[test]
    fn test_vendor_serde_names() {
        let yaml = "vendor: openai\nmodel: gpt-4o\ncontext_window: 128000\ncost_tier: high\n";
        let descriptor: ProviderDescriptor = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(descriptor.vendor, ProviderVendor::OpenAi);
        assert_eq!(descriptor.cost_tier, CostTier::High);
    }
}
