//! HTTP gateway clients for Gemini and OpenRouter.
//!
//! Both clients send a single non-streaming request per call, bounded by the
//! timeout from [`ModelConfig`]. API keys are held as [`SecretString`] and
//! never formatted into URLs, logs, or errors.

use std::sync::Arc;

use async_trait::async_trait;
use pha_core::config::{GOOGLE_API_KEY_ENV, OPENROUTER_API_KEY_ENV};
use pha_core::env_string;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{ModelConfig, Provider};
use crate::error::GatewayError;
use crate::gateway::{CompletionRequest, Gateway, SharedGateway};

/// Gemini REST API base.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// OpenRouter chat completions endpoint.
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Longest upstream error message passed through.
const MAX_ERROR_LEN: usize = 300;

/// Build the gateway selected by `config.provider`, reading its key from the environment.
pub fn build_gateway(config: &ModelConfig) -> Result<SharedGateway, GatewayError> {
    let gateway: SharedGateway = match config.provider {
        Provider::Gemini => Arc::new(GeminiClient::from_env(config.clone())?),
        Provider::OpenRouter => Arc::new(OpenRouterClient::from_env(config.clone())?),
    };
    debug!(provider = %config.provider, model = %config.model, "Gateway ready");
    Ok(gateway)
}

/// Strip credential and quota details from upstream error text.
pub(crate) fn sanitize_api_error(error: &str) -> String {
    let lower = error.to_lowercase();

    if lower.contains("api key")
        || lower.contains("apikey")
        || lower.contains("invalid key")
        || lower.contains("unauthorized")
        || lower.contains("authentication")
        || lower.contains("permission denied")
    {
        return "authentication error, check the configured API key".to_string();
    }

    if lower.contains("rate limit") || lower.contains("quota") || lower.contains("resource_exhausted")
    {
        return "rate limit exceeded, try again later".to_string();
    }

    if error.chars().count() > MAX_ERROR_LEN {
        let truncated: String = error.chars().take(MAX_ERROR_LEN).collect();
        format!("{truncated}...(truncated)")
    } else {
        error.to_string()
    }
}

fn build_http_client(provider: Provider, config: &ModelConfig) -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| GatewayError::Upstream {
            provider: provider.to_string(),
            status: None,
            message: format!("failed to build HTTP client: {e}"),
        })
}

fn send_error(provider: Provider, config: &ModelConfig, e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout {
            provider: provider.to_string(),
            secs: config.timeout_secs,
        }
    } else {
        GatewayError::Upstream {
            provider: provider.to_string(),
            status: None,
            message: sanitize_api_error(&format!("HTTP request failed: {e}")),
        }
    }
}

async fn check_status(
    provider: Provider,
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(GatewayError::InvalidCredential {
            provider: provider.to_string(),
        });
    }
    let text = response.text().await.unwrap_or_default();
    Err(GatewayError::Upstream {
        provider: provider.to_string(),
        status: Some(status.as_u16()),
        message: sanitize_api_error(&format!("{status}: {text}")),
    })
}

fn non_empty(provider: Provider, text: String) -> Result<String, GatewayError> {
    if text.trim().is_empty() {
        Err(GatewayError::EmptyResponse {
            provider: provider.to_string(),
        })
    } else {
        Ok(text)
    }
}

// ============================================================================
// Gemini
// ============================================================================

/// Client for the Gemini `generateContent` endpoint.
///
/// The role and task instructions are folded into one user prompt.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    config: ModelConfig,
    base_url: String,
}

impl GeminiClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>, config: ModelConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_http_client(Provider::Gemini, &config)?,
            api_key: SecretString::from(api_key.into()),
            config,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Create a client from the `GOOGLE_API_KEY` environment variable.
    pub fn from_env(config: ModelConfig) -> Result<Self, GatewayError> {
        let api_key = env_string(GOOGLE_API_KEY_ENV)
            .ok_or_else(|| GatewayError::MissingCredential(GOOGLE_API_KEY_ENV.to_string()))?;
        Self::new(api_key, config)
    }

    /// Point the client at another API base (e.g. a local proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.config.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

impl GeminiResponse {
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Gateway for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: Some(request.combined_prompt()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens.min(self.config.max_tokens),
            },
        };

        trace!(prompt_len = request.prompt_len(), "Sending Gemini request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(Provider::Gemini, &self.config, e))?;

        let response = check_status(Provider::Gemini, response).await?;
        let parsed: GeminiResponse =
            response.json().await.map_err(|e| GatewayError::Upstream {
                provider: Provider::Gemini.to_string(),
                status: None,
                message: format!("failed to parse response: {e}"),
            })?;

        let text = non_empty(Provider::Gemini, parsed.text())?;
        debug!(response_len = text.len(), "Gemini response received");
        Ok(text)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// OpenRouter
// ============================================================================

/// OpenRouter chat completions client; role and task are sent as the
/// system and user messages.
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: SecretString,
    config: ModelConfig,
}

impl OpenRouterClient {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>, config: ModelConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            client: build_http_client(Provider::OpenRouter, &config)?,
            api_key: SecretString::from(api_key.into()),
            config,
        })
    }

    /// Create a client from the `OPENROUTER_API_KEY` environment variable.
    pub fn from_env(config: ModelConfig) -> Result<Self, GatewayError> {
        let api_key = env_string(OPENROUTER_API_KEY_ENV)
            .ok_or_else(|| GatewayError::MissingCredential(OPENROUTER_API_KEY_ENV.to_string()))?;
        Self::new(api_key, config)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[async_trait]
impl Gateway for OpenRouterClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.role_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &request.task_instruction,
                },
            ],
            max_tokens: request.max_output_tokens.min(self.config.max_tokens),
            temperature: request.temperature,
        };

        trace!(prompt_len = request.prompt_len(), "Sending OpenRouter request");

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .bearer_auth(self.api_key.expose_secret())
            .header("HTTP-Referer", "https://github.com/pha-team/pha")
            .header("X-Title", "Personal Health Agent")
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(Provider::OpenRouter, &self.config, e))?;

        let response = check_status(Provider::OpenRouter, response).await?;
        let parsed: ChatResponse = response.json().await.map_err(|e| GatewayError::Upstream {
            provider: Provider::OpenRouter.to_string(),
            status: None,
            message: format!("failed to parse response: {e}"),
        })?;

        debug!(
            "OpenRouter response received: {} tokens used",
            parsed.usage.as_ref().map_or(0, |u| u.total_tokens)
        );

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        non_empty(Provider::OpenRouter, text)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_api_error() {
        assert_eq!(
            sanitize_api_error("API key not valid. Please pass a valid API key."),
            "authentication error, check the configured API key"
        );
        assert_eq!(
            sanitize_api_error("429 RESOURCE_EXHAUSTED"),
            "rate limit exceeded, try again later"
        );
        assert_eq!(sanitize_api_error("model not found"), "model not found");

        let long = "x".repeat(400);
        let sanitized = sanitize_api_error(&long);
        assert!(sanitized.ends_with("...(truncated)"));
        assert_eq!(sanitized.len(), MAX_ERROR_LEN + "...(truncated)".len());
    }

    #[test]
    fn test_gemini_endpoint() {
        let client = GeminiClient::new("key", ModelConfig::default())
            .unwrap()
            .with_base_url("http://localhost:8080/");
        assert_eq!(
            client.endpoint(),
            "http://localhost:8080/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(client.model_id(), "gemini-2.5-flash");
    }

    #[test]
    fn test_gemini_request_shape() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts: vec![GeminiPart {
                    text: Some("hi".into()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 100,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 100);
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_gemini_response_text() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"there"}]}}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.text(), "Hello there");

        let parsed: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.text(), "");
    }

    #[test]
    fn test_chat_response_parse() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}],"usage":{"total_tokens":12}}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.usage.map(|u| u.total_tokens), Some(12));
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("ok"));
    }

    #[test]
    fn test_non_empty() {
        assert!(matches!(
            non_empty(Provider::Gemini, "  \n".into()),
            Err(GatewayError::EmptyResponse { .. })
        ));
        assert_eq!(non_empty(Provider::Gemini, "x".into()).unwrap(), "x");
    }

    #[test]
    fn test_build_gateway_missing_credential() {
        std::env::remove_var(OPENROUTER_API_KEY_ENV);
        let config = ModelConfig::for_provider(Provider::OpenRouter);
        let err = build_gateway(&config).err();
        assert_eq!(
            err,
            Some(GatewayError::MissingCredential(OPENROUTER_API_KEY_ENV.into()))
        );
    }
}
