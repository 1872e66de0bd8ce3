// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses server, database, auth, and completion-provider settings from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment-based configuration management
//!
//! All configuration is environment-only. Provider credentials and generation
//! parameters are read once at startup and treated as process-wide read-only
//! state afterwards.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use tracing::info;

/// Default OpenRouter API endpoint
const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default completion model
const DEFAULT_MODEL: &str = "openai/gpt-5";

/// Default request timeout for normal chat completions
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 60;

/// Default request timeout for crisis completions (tighter than chat)
const DEFAULT_CRISIS_TIMEOUT_SECS: u64 = 20;

/// Default timeout for the liveness probe
const DEFAULT_STATUS_TIMEOUT_SECS: u64 = 5;

/// Environment type for deployment mode switches
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Default generation parameters applied when a request does not override them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationDefaults {
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Nucleus sampling cutoff
    pub top_p: f32,
    /// Presence penalty
    pub presence_penalty: f32,
    /// Frequency penalty
    pub frequency_penalty: f32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            top_p: 0.9,
            presence_penalty: 0.1,
            frequency_penalty: 0.1,
        }
    }
}

/// OpenRouter completion provider configuration
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// API base URL
    pub base_url: String,
    /// API key (required)
    pub api_key: String,
    /// Default model identifier
    pub default_model: String,
    /// Site URL sent as `HTTP-Referer` for OpenRouter attribution
    pub site_url: String,
    /// Site name sent as `X-Title` for OpenRouter attribution
    pub site_name: String,
    /// Default generation parameters
    pub generation: GenerationDefaults,
    /// Timeout for normal chat completions
    pub chat_timeout_secs: u64,
    /// Timeout for crisis-path completions
    pub crisis_timeout_secs: u64,
    /// Timeout for the status probe
    pub status_timeout_secs: u64,
}

impl OpenRouterConfig {
    /// Load provider configuration from environment variables
    ///
    /// Reads:
    /// - `OPENROUTER_API_KEY` (required)
    /// - `OPENROUTER_BASE_URL`, `OPENROUTER_MODEL`
    /// - `OPENROUTER_SITE_URL`, `OPENROUTER_SITE_NAME`
    /// - `OPENROUTER_TIMEOUT_SECS`, `OPENROUTER_CRISIS_TIMEOUT_SECS`
    ///
    /// # Errors
    ///
    /// Returns a config error if `OPENROUTER_API_KEY` is missing or empty.
    pub fn from_env() -> AppResult<Self> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::config("OPENROUTER_API_KEY is not configured"))?;

        Ok(Self {
            base_url: env::var("OPENROUTER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENROUTER_BASE_URL.to_owned()),
            api_key,
            default_model: env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_owned()),
            site_url: env::var("OPENROUTER_SITE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_owned()),
            site_name: env::var("OPENROUTER_SITE_NAME")
                .unwrap_or_else(|_| "Melius Recovery Coach".to_owned()),
            generation: GenerationDefaults::default(),
            chat_timeout_secs: parse_env_u64("OPENROUTER_TIMEOUT_SECS", DEFAULT_CHAT_TIMEOUT_SECS),
            crisis_timeout_secs: parse_env_u64(
                "OPENROUTER_CRISIS_TIMEOUT_SECS",
                DEFAULT_CRISIS_TIMEOUT_SECS,
            ),
            status_timeout_secs: DEFAULT_STATUS_TIMEOUT_SECS,
        })
    }
}

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection URL (sqlite)
    pub database_url: String,
    /// JWT signing secret
    pub jwt_secret: String,
    /// Deployment environment
    pub environment: Environment,
    /// Completion provider configuration
    pub open_router: OpenRouterConfig,
}

impl ServerConfig {
    /// Load the full server configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a config error if any required variable is missing.
    pub fn from_env() -> AppResult<Self> {
        let environment = Environment::from_str_or_default(
            &env::var("ENVIRONMENT").unwrap_or_default(),
        );

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::config("JWT_SECRET is not configured"))?;

        let config = Self {
            http_port: parse_env_u64("HTTP_PORT", 3001).try_into().map_err(|_| {
                AppError::config("HTTP_PORT must fit in a 16-bit port number")
            })?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:melius.db".to_owned()),
            jwt_secret,
            environment,
            open_router: OpenRouterConfig::from_env()?,
        };

        info!(
            "Loaded configuration: environment={}, port={}, model={}",
            config.environment, config.http_port, config.open_router.default_model
        );

        Ok(config)
    }
}

/// Parse an integer environment variable with a fallback default
fn parse_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("production"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("prod"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("anything"),
            Environment::Development
        );
        assert!(Environment::Production.is_production());
    }

    #[test]
    fn test_generation_defaults() {
        let defaults = GenerationDefaults::default();
        assert!((defaults.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(defaults.max_tokens, 1000);
    }
}
