use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::retry::RetryPolicy;
use super::wire::{
    AnthropicRequest, AnthropicResponse, ChatMessage, GeminiContent, GeminiRequest,
    GeminiResponse, GenerationConfig, OpenAiRequest, OpenAiResponse,
};
use crate::domain::models::{EndpointConfig, ProviderDescriptor, ProviderVendor, ProvidersConfig};
use crate::domain::ports::{ProviderClient, ProviderError, ProviderReply};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// HTTP transport for the Anthropic, OpenAI and Gemini completion APIs.
pub struct HttpProviderClient {
    http: Client,
    config: ProvidersConfig,
    retry: RetryPolicy,
    /// Keys set explicitly; otherwise read from each endpoint's env var.
    api_keys: HashMap<ProviderVendor, String>,
}

impl HttpProviderClient {
    /// Client with a per-request timeout of `request_timeout`.
    pub fn new(config: ProvidersConfig, request_timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            retry: RetryPolicy::from_config(&config),
            config,
            api_keys: HashMap::new(),
        })
    }

    /// Use `key` for `vendor` instead of reading its environment variable.
    pub fn with_api_key(mut self, vendor: ProviderVendor, key: impl Into<String>) -> Self {
        self.api_keys.insert(vendor, key.into());
        self
    }

    fn endpoint(&self, vendor: ProviderVendor) -> &EndpointConfig {
        match vendor {
            ProviderVendor::Anthropic => &self.config.anthropic,
            ProviderVendor::OpenAi => &self.config.openai,
            ProviderVendor::Gemini => &self.config.gemini,
        }
    }

    fn api_key(&self, vendor: ProviderVendor) -> Result<String, ProviderError> {
        if let Some(key) = self.api_keys.get(&vendor) {
            return Ok(key.clone());
        }
        let env = &self.endpoint(vendor).api_key_env;
        std::env::var(env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!("{vendor}: environment variable {env} not set"))
            })
    }

    async fn send_once(
        &self,
        provider: &ProviderDescriptor,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, ProviderError> {
        let base = self.endpoint(provider.vendor).base_url.trim_end_matches('/');
        let max_tokens = self.config.max_tokens;

        match provider.vendor {
            ProviderVendor::Anthropic => {
                let body = AnthropicRequest {
                    model: &provider.model,
                    max_tokens,
                    system: system_prompt,
                    messages: vec![ChatMessage {
                        role: "user",
                        content: user_prompt,
                    }],
                };
                let request = self
                    .http
                    .post(format!("{base}/v1/messages"))
                    .header("x-api-key", api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&body);
                let response: AnthropicResponse = send_json(request).await?;
                response.into_text().ok_or(ProviderError::EmptyResponse)
            }
            ProviderVendor::OpenAi => {
                let body = OpenAiRequest {
                    model: &provider.model,
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: system_prompt,
                        },
                        ChatMessage {
                            role: "user",
                            content: user_prompt,
                        },
                    ],
                    max_tokens,
                };
                let request = self
                    .http
                    .post(format!("{base}/v1/chat/completions"))
                    .bearer_auth(api_key)
                    .json(&body);
                let response: OpenAiResponse = send_json(request).await?;
                response.into_text().ok_or(ProviderError::EmptyResponse)
            }
            ProviderVendor::Gemini => {
                let body = GeminiRequest {
                    system_instruction: GeminiContent::text(None, system_prompt),
                    contents: vec![GeminiContent::text(Some("user"), user_prompt)],
                    generation_config: GenerationConfig {
                        max_output_tokens: max_tokens,
                    },
                };
                let request = self
                    .http
                    .post(format!(
                        "{base}/v1beta/models/{}:generateContent",
                        provider.model
                    ))
                    .header("x-goog-api-key", api_key)
                    .json(&body);
                let response: GeminiResponse = send_json(request).await?;
                response.into_text().ok_or(ProviderError::EmptyResponse)
            }
        }
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Transport(e.without_url().to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Http {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Decode(e.without_url().to_string()))
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn invoke(
        &self,
        provider: &ProviderDescriptor,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderReply, ProviderError> {
        let api_key = self.api_key(provider.vendor)?;
        debug!(vendor = %provider.vendor, model = %provider.model, "sending provider request");

        let content = self
            .retry
            .execute(|| self.send_once(provider, &api_key, system_prompt, user_prompt))
            .await?;
        Ok(ProviderReply::new(content))
    }
}
