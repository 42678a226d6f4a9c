use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health classification of a managed project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Project matches its declared shape.
    Healthy,
    /// Project is missing declared capabilities.
    Drifted,
    /// Project could not be evaluated cleanly.
    Error,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Drifted => "drifted",
            Self::Error => "error",
        }
    }

    /// Drifted and errored projects both get a remediation pipeline.
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::Drifted | Self::Error)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health record for one project, recomputed every patrol tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectHealth {
    /// Unique project identifier.
    pub name: String,
    pub status: HealthStatus,
    /// Last known test-suite outcome.
    pub last_test_result: bool,
    /// Absent capabilities, in declaration order.
    #[serde(default)]
    pub missing_modules: Vec<String>,
    /// Informational only.
    #[serde(default)]
    pub tech_stack: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

impl ProjectHealth {
    /// A project with nothing missing.
    pub fn healthy(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: HealthStatus::Healthy,
            last_test_result: true,
            missing_modules: Vec::new(),
            tech_stack: Vec::new(),
            checked_at: Utc::now(),
        }
    }

    /// A project missing the listed modules.
    pub fn drifted(name: impl Into<String>, missing_modules: Vec<String>) -> Self {
        Self {
            status: HealthStatus::Drifted,
            missing_modules,
            ..Self::healthy(name)
        }
    }

    /// A project whose health could not be judged.
    pub fn errored(name: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Error,
            last_test_result: false,
            ..Self::healthy(name)
        }
    }

    pub fn with_tech_stack(mut self, tech_stack: Vec<String>) -> Self {
        self.tech_stack = tech_stack;
        self
    }

    pub fn needs_attention(&self) -> bool {
        self.status.needs_attention()
    }
}
