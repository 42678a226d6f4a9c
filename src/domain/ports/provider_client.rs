use async_trait::async_trait;

use crate::domain::models::ProviderDescriptor;

/// Successful completion from a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    pub content: String,
}

impl ProviderReply {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Error types for provider calls
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Could not decode provider response: {0}")]
    Decode(String),

    #[error("Provider returned no text content")]
    EmptyResponse,
}

impl ProviderError {
    /// Rate limits, server errors and network failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_) => true,
            Self::NotConfigured(_) | Self::Decode(_) | Self::EmptyResponse => false,
        }
    }
}

/// Raw model-calling transport.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn invoke(
        &self,
        provider: &ProviderDescriptor,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderReply, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ProviderError::Http { status: 429, body: String::new() }.is_transient());
        assert!(ProviderError::Http { status: 503, body: String::new() }.is_transient());
        assert!(!ProviderError::Http { status: 401, body: String::new() }.is_transient());
        assert!(ProviderError::Transport("reset".into()).is_transient());
        assert!(!ProviderError::EmptyResponse.is_transient());
    }
}
