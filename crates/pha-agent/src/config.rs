//! Model configuration for the LLM providers.

use std::time::Duration;

use pha_core::config::{MAX_TOKENS_ENV, MODEL_ENV, PROVIDER_ENV, TIMEOUT_ENV};
use pha_core::{env_or, env_string, ConfigError};
use serde::{Deserialize, Serialize};

/// Default output token cap per call.
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Default per-call HTTP timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default temperature when an operation does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// LLM provider behind the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Google Gemini `generateContent` API.
    #[default]
    Gemini,
    /// OpenRouter chat completions API.
    OpenRouter,
}

impl Provider {
    /// Model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::OpenRouter => "google/gemini-2.5-flash",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::OpenRouter => write!(f, "openrouter"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openrouter" | "open_router" | "open-router" => Ok(Self::OpenRouter),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Model configuration shared by every gateway call of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g. "gemini-2.5-flash").
    pub model: String,

    /// Maximum tokens to generate per call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Fallback temperature (0.0 to 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Provider to use.
    #[serde(default)]
    pub provider: Provider,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::for_provider(Provider::default())
    }
}

impl ModelConfig {
    /// Create a configuration with the given model on the default provider.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Create a configuration using the provider's default model.
    pub fn for_provider(provider: Provider) -> Self {
        Self {
            model: provider.default_model().to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            provider,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read `PHA_PROVIDER`, `PHA_MODEL`, `PHA_MAX_TOKENS`, and `PHA_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider: Provider = env_or(PROVIDER_ENV, Provider::default())?;
        let mut config = Self::for_provider(provider)
            .with_max_tokens(env_or(MAX_TOKENS_ENV, DEFAULT_MAX_TOKENS)?)
            .with_timeout_secs(env_or(TIMEOUT_ENV, DEFAULT_TIMEOUT_SECS)?);
        if let Some(model) = env_string(MODEL_ENV) {
            config.model = model;
        }
        Ok(config)
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the maximum tokens (at least 1).
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    /// Set the provider, switching to its default model if the current one
    /// is another provider's default.
    pub fn with_provider(mut self, provider: Provider) -> Self {
        if self.model == self.provider.default_model() {
            self.model = provider.default_model().to_string();
        }
        self.provider = provider;
        self
    }

    /// Set the per-call timeout (at least one second).
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs.max(1);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_display() {
        assert_eq!(Provider::Gemini.to_string(), "gemini");
        assert_eq!(Provider::OpenRouter.to_string(), "openrouter");
    }

    #[test]
    fn test_provider_from_str() {
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!("Google".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!(
            "open-router".parse::<Provider>().unwrap(),
            Provider::OpenRouter
        );
        assert!("anthropic".parse::<Provider>().is_err());
    }

    #[test]
    fn test_model_config_default() {
        let config = ModelConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.max_tokens, 8192);
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_model_config_builder() {
        let config = ModelConfig::new("test-model")
            .with_max_tokens(1000)
            .with_temperature(0.3)
            .with_timeout_secs(5);

        assert_eq!(config.model, "test-model");
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.temperature, 0.3);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_with_provider_switches_default_model() {
        let config = ModelConfig::default().with_provider(Provider::OpenRouter);
        assert_eq!(config.model, "google/gemini-2.5-flash");

        let config = ModelConfig::new("custom").with_provider(Provider::OpenRouter);
        assert_eq!(config.model, "custom");
    }

    #[test]
    fn test_clamping() {
        let config = ModelConfig::default().with_temperature(5.0);
        assert_eq!(config.temperature, 1.0);

        let config = ModelConfig::default().with_temperature(-1.0);
        assert_eq!(config.temperature, 0.0);

        let config = ModelConfig::default().with_max_tokens(0).with_timeout_secs(0);
        assert_eq!(config.max_tokens, 1);
        assert_eq!(config.timeout_secs, 1);
    }

    #[test]
    fn test_serialization() {
        let config = ModelConfig::for_provider(Provider::OpenRouter);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ModelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }
}
