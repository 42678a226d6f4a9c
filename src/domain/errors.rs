//! Domain errors for the nightwatch patrol system.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Invalid construction parameters. Fatal at startup.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("Invalid rate gate window: {0:?}. Must be positive")]
    InvalidWindow(Duration),

    #[error("Invalid rate gate ceiling: {0}. Must be at least 1")]
    InvalidCeiling(u32),

    #[error("Invalid patrol interval: {0:?}. Must be positive")]
    InvalidInterval(Duration),

    #[error("Invalid scenario probability: {0}. Must be within [0, 1]")]
    InvalidProbability(f64),

    #[error("Provider for role {role} has an empty model name")]
    EmptyModel { role: String },
}

/// The rate gate refused an action. A normal outcome, not a failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Rate gate open: {recent_actions} actions in the last {window_secs}s (ceiling {max_actions})")]
pub struct RateExceeded {
    pub recent_actions: usize,
    pub max_actions: u32,
    pub window_secs: i64,
    /// When enough actions age out for the gate to close again.
    pub reopens_at: Option<DateTime<Utc>>,
}

/// Which external collaborator a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    HealthScan,
    Provider,
    Knowledge,
    Dispatch,
    Inbox,
}

impl Collaborator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HealthScan => "health_scan",
            Self::Provider => "provider",
            Self::Knowledge => "knowledge",
            Self::Dispatch => "dispatch",
            Self::Inbox => "inbox",
        }
    }
}

impl std::fmt::Display for Collaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A collaborator call that did not produce a usable result.
///
/// Always non-fatal: the core converts it into a skipped unit of work.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{collaborator} unavailable: {reason}")]
    Unavailable {
        collaborator: Collaborator,
        reason: String,
    },

    #[error("{collaborator} timed out after {after:?}")]
    Timeout {
        collaborator: Collaborator,
        after: Duration,
    },
}

impl CollaboratorError {
    /// Failure reported by the collaborator itself.
    pub fn unavailable(collaborator: Collaborator, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            collaborator,
            reason: reason.into(),
        }
    }

    /// Which collaborator failed.
    pub fn collaborator(&self) -> Collaborator {
        match self {
            Self::Unavailable { collaborator, .. } | Self::Timeout { collaborator, .. } => {
                *collaborator
            }
        }
    }

    /// True when the call was cut off rather than answered with an error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collaborator_error_display() {
        let err = CollaboratorError::unavailable(Collaborator::Dispatch, "disk full");
        assert_eq!(err.to_string(), "dispatch unavailable: disk full");
        assert_eq!(err.collaborator(), Collaborator::Dispatch);
        assert!(!err.is_timeout());

        let err = CollaboratorError::Timeout {
            collaborator: Collaborator::Provider,
            after: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "provider timed out after 3s");
        assert!(err.is_timeout());
    }

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::InvalidCeiling(0);
        assert_eq!(err.to_string(), "Invalid rate gate ceiling: 0. Must be at least 1");
    }
}
