// ABOUTME: OpenRouter completion provider speaking the OpenAI-compatible chat API
// ABOUTME: Handles request construction, attribution headers, timeouts, and upstream error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenRouter provider
//!
//! Talks to the OpenRouter `/chat/completions` endpoint. Upstream failures
//! are mapped to typed errors by status class; the liveness probe never
//! raises, it only answers healthy/unhealthy.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{ChatRequest, ChatResponse, CompletionProvider, ModelInfo, TokenUsage};
use crate::config::OpenRouterConfig;
use crate::errors::{AppError, AppResult};

/// OpenRouter completion provider
pub struct OpenRouterProvider {
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterProvider {
    /// Create a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns a config error if the HTTP client cannot be constructed.
    pub fn new(config: OpenRouterConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.chat_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::config(format!("Failed to build HTTP client: {e}")).with_source(e)
            })?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.config.base_url)
    }

    /// Map a non-success upstream response to a typed error
    async fn parse_error_response(response: reqwest::Response) -> AppError {
        let status = response.status();
        let detail = match response.json::<OpenRouterErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_owned(),
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::external_auth_failed(
                format!("OpenRouter rejected the API key: {detail}"),
            ),
            StatusCode::TOO_MANY_REQUESTS => {
                AppError::external_rate_limited(format!("OpenRouter rate limit: {detail}"))
            }
            _ => AppError::external_service("OpenRouter", detail)
                .with_details(serde_json::json!({ "status": status.as_u16() })),
        }
    }

    fn map_request_error(error: reqwest::Error) -> AppError {
        if error.is_timeout() {
            AppError::timeout("OpenRouter request timed out").with_source(error)
        } else {
            AppError::external_service("OpenRouter", error.to_string()).with_source(error)
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.config.default_model.clone());

        let defaults = &self.config.generation;
        let payload = OpenRouterRequest {
            model: model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature.unwrap_or(defaults.temperature),
            max_tokens: request.max_tokens.unwrap_or(defaults.max_tokens),
            top_p: request.top_p.unwrap_or(defaults.top_p),
            presence_penalty: request
                .presence_penalty
                .unwrap_or(defaults.presence_penalty),
            frequency_penalty: request
                .frequency_penalty
                .unwrap_or(defaults.frequency_penalty),
        };

        debug!(model = %model, messages = payload.messages.len(), "Sending completion request");

        let mut builder = self
            .client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("HTTP-Referer", &self.config.site_url)
            .header("X-Title", &self.config.site_name)
            .json(&payload);

        // The crisis path runs with a tighter deadline than regular chat.
        if let Some(secs) = request.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let response = builder.send().await.map_err(Self::map_request_error)?;

        if !response.status().is_success() {
            return Err(Self::parse_error_response(response).await);
        }

        let body: OpenRouterResponse = response.json().await.map_err(|e| {
            AppError::external_service("OpenRouter", format!("Invalid response body: {e}"))
                .with_source(e)
        })?;

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            AppError::external_service("OpenRouter", "Response contained no choices")
        })?;

        Ok(ChatResponse {
            content: choice.message.content,
            model: body.model.unwrap_or(model),
            usage: body.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    async fn list_models(&self) -> AppResult<Vec<ModelInfo>> {
        let response = self
            .client
            .get(self.models_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if !response.status().is_success() {
            return Err(Self::parse_error_response(response).await);
        }

        let body: ModelListResponse = response.json().await.map_err(|e| {
            AppError::external_service("OpenRouter", format!("Invalid model list: {e}"))
                .with_source(e)
        })?;

        Ok(body
            .data
            .into_iter()
            .map(|m| ModelInfo {
                id: m.id,
                name: m.name,
            })
            .collect())
    }

    async fn check_status(&self) -> bool {
        let result = self
            .client
            .get(self.models_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .timeout(Duration::from_secs(self.config.status_timeout_secs))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(status = %response.status(), "OpenRouter status probe failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "OpenRouter status probe failed");
                false
            }
        }
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct OpenRouterRequest<'a> {
    model: String,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct OpenRouterResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ModelListResponse {
    data: Vec<WireModel>,
}

#[derive(Deserialize)]
struct WireModel {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
struct OpenRouterErrorBody {
    error: OpenRouterErrorDetail,
}

#[derive(Deserialize)]
struct OpenRouterErrorDetail {
    message: String,
}
