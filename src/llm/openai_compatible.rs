// ABOUTME: Chat completions client for OpenAI, Groq, Ollama, and other compatible endpoints
// ABOUTME: Maps chat requests to the wire format and HTTP failures to typed service errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! # `OpenAI`-Compatible Provider
//!
//! `OpenAI`, Groq, Ollama, vLLM, and `LocalAI` all expose
//! `POST {base}/chat/completions`, so a single client covers them. Presets
//! only differ in base URL, default model, and [`LlmCapabilities`].
//!
//! Images travel as `image_url` content parts. JSON mode maps to
//! `response_format: {"type": "json_object"}` when the backend honors it.

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use super::{
    ChatMessage, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider, MessageRole, TokenUsage,
};
use crate::config::{LlmProviderType, LlmSettings};
use clipchef_core::errors::{AppError, ErrorCode};

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Vision extraction on a local model can take minutes
const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Longest slice of an unparseable error body quoted back in errors
const ERROR_BODY_PREVIEW: usize = 200;

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
    stream: bool,
}

/// `content` is a string for text and an array of parts once images are attached
#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Value,
}

impl WireMessage {
    fn text(role: MessageRole, text: &str) -> Self {
        Self {
            role: role.as_str(),
            content: Value::String(text.to_owned()),
        }
    }
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        if message.images.is_empty() {
            return Self::text(message.role, &message.content);
        }

        let parts = std::iter::once(json!({ "type": "text", "text": message.content }))
            .chain(
                message
                    .images
                    .iter()
                    .map(|url| json!({ "type": "image_url", "image_url": { "url": url } })),
            )
            .collect();

        Self {
            role: message.role.as_str(),
            content: Value::Array(parts),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireReply,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<WireUsage> for TokenUsage {
    fn from(usage: WireUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

// ============================================================================
// Configuration
// ============================================================================

/// Connection details and feature set of one backend
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// API root, e.g. <http://localhost:11434/v1>
    pub base_url: String,
    /// Bearer token, absent for most local servers
    pub api_key: Option<String>,
    /// Model used when a request does not name one
    pub default_model: String,
    /// Short identifier used in logs and `/ready`
    pub provider_name: String,
    /// Name used in error messages
    pub display_name: String,
    /// Features the backend supports
    pub capabilities: LlmCapabilities,
    /// Temperature used when a request does not set one
    pub default_temperature: Option<f32>,
}

impl OpenAiCompatibleConfig {
    /// Preset for a provider type with its default endpoint
    #[must_use]
    pub fn preset(provider: LlmProviderType, model: &str, api_key: Option<&str>) -> Self {
        let (display_name, capabilities) = match provider {
            LlmProviderType::OpenAi => ("OpenAI", LlmCapabilities::full_featured()),
            LlmProviderType::Groq => (
                "Groq",
                LlmCapabilities::SYSTEM_MESSAGES | LlmCapabilities::JSON_MODE,
            ),
            LlmProviderType::Ollama => ("Ollama", LlmCapabilities::full_featured()),
            LlmProviderType::Local => ("Local LLM", LlmCapabilities::text_only()),
        };

        Self {
            base_url: provider.default_base_url().to_owned(),
            api_key: api_key.filter(|key| !key.is_empty()).map(str::to_owned),
            default_model: model.to_owned(),
            provider_name: provider.to_string(),
            display_name: display_name.to_owned(),
            capabilities,
            default_temperature: None,
        }
    }

    /// Preset adjusted by explicit base URL, model, key, and temperature settings
    #[must_use]
    pub fn from_settings(settings: &LlmSettings) -> Self {
        let mut config = Self::preset(
            settings.provider,
            settings.effective_model(),
            settings.api_key.as_deref(),
        );
        settings.effective_base_url().clone_into(&mut config.base_url);
        config.default_temperature = Some(settings.temperature);
        config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

// ============================================================================
// Provider
// ============================================================================

/// LLM provider speaking the chat completions API
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Create a provider for the given backend
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        info!(
            provider = %config.provider_name,
            base_url = %config.base_url,
            model = %config.default_model,
            vision = config.capabilities.supports_vision(),
            "LLM provider configured"
        );

        Ok(Self { client, config })
    }

    /// Create a provider from the server's LLM settings
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, AppError> {
        Self::new(OpenAiCompatibleConfig::from_settings(settings))
    }

    /// Backend configuration
    #[must_use]
    pub const fn config(&self) -> &OpenAiCompatibleConfig {
        &self.config
    }

    fn wire_request<'a>(&'a self, request: &'a ChatRequest) -> Result<WireRequest<'a>, AppError> {
        let caps = self.config.capabilities;
        if request.has_images() && !caps.supports_vision() {
            return Err(AppError::invalid_input(format!(
                "{} does not accept image input",
                self.config.display_name
            )));
        }

        Ok(WireRequest {
            model: request
                .model
                .as_deref()
                .unwrap_or(&self.config.default_model),
            messages: wire_messages(&request.messages, caps.supports_system_messages()),
            temperature: request.temperature.or(self.config.default_temperature),
            max_tokens: request.max_tokens,
            response_format: (request.json_mode && caps.supports_json_mode())
                .then(|| json!({ "type": "json_object" })),
            stream: false,
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn transport_error(&self, e: &reqwest::Error) -> AppError {
        let service = self.config.display_name.as_str();
        if e.is_timeout() {
            AppError::external_timeout(service, REQUEST_TIMEOUT_SECS)
        } else if e.is_connect() {
            AppError::new(
                ErrorCode::ExternalServiceUnavailable,
                format!(
                    "Cannot connect to {service} at {}",
                    self.config.base_url
                ),
            )
        } else {
            AppError::external_service(service, e.to_string())
        }
    }

    /// Turn a non-2xx answer into the matching error code
    fn status_error(&self, status: StatusCode, body: &str) -> AppError {
        let service = self.config.display_name.as_str();
        let Ok(WireErrorBody { error }) = serde_json::from_str::<WireErrorBody>(body) else {
            // Local servers and proxies often answer with plain text or HTML
            return if matches!(status.as_u16(), 502..=504) {
                AppError::new(
                    ErrorCode::ExternalServiceUnavailable,
                    format!("{service} is not responding at {}", self.config.base_url),
                )
            } else {
                let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
                AppError::external_service(service, format!("HTTP {status}: {preview}"))
            };
        };

        match status.as_u16() {
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("{service} rejected the API key: {}", error.message),
            ),
            429 => {
                AppError::new(ErrorCode::ExternalRateLimited, rate_limit_message(&error.message))
            }
            404 => AppError::external_service(
                service,
                format!("model or endpoint not found: {}", error.message),
            ),
            503 => AppError::new(
                ErrorCode::ExternalServiceUnavailable,
                format!("{service} unavailable: {}", error.message),
            ),
            _ => AppError::external_service(
                service,
                match error.kind {
                    Some(kind) => format!("{kind}: {}", error.message),
                    None => error.message,
                },
            ),
        }
    }
}

/// Convert messages, folding system prompts into the first user turn when unsupported
fn wire_messages(messages: &[ChatMessage], system_supported: bool) -> Vec<WireMessage> {
    if system_supported {
        return messages.iter().map(WireMessage::from).collect();
    }

    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .map(|m| m.content.as_str())
        .collect();
    let mut pending = (!system.is_empty()).then(|| system.join("\n\n"));

    messages
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|message| match (message.role, pending.take()) {
            (MessageRole::User, Some(preamble)) => {
                let mut merged = message.clone();
                merged.content = format!("{preamble}\n\n{}", message.content);
                WireMessage::from(&merged)
            }
            (_, preamble) => {
                pending = preamble;
                WireMessage::from(message)
            }
        })
        .collect()
}

/// Friendly rate limit message, keeping the retry hint when the backend gives one
fn rate_limit_message(message: &str) -> String {
    static RETRY_AFTER: OnceLock<Option<Regex>> = OnceLock::new();
    let retry_after = RETRY_AFTER
        .get_or_init(|| Regex::new(r"(?i)try again in (\d+(?:\.\d+)?)\s*s").ok())
        .as_ref()
        .and_then(|re| re.captures(message))
        .and_then(|caps| caps[1].parse::<f64>().ok());

    match retry_after {
        Some(seconds) => format!(
            "LLM rate limit reached, retry in {} seconds",
            seconds.ceil() as u64
        ),
        None => "LLM rate limit reached, retry shortly".to_owned(),
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.config.provider_name
    }

    fn display_name(&self) -> &str {
        &self.config.display_name
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip_all, fields(provider = %self.config.provider_name))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let wire = self.wire_request(request)?;
        debug!(
            model = wire.model,
            messages = wire.messages.len(),
            json_mode = wire.response_format.is_some(),
            images = request.has_images(),
            "Sending chat completion"
        );

        let started = Instant::now();
        let response = self
            .authorized(self.client.post(self.config.endpoint("chat/completions")))
            .json(&wire)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !status.is_success() {
            let error = self.status_error(status, &body);
            warn!(status = %status, error = %error.message, "Chat completion failed");
            return Err(error);
        }

        let parsed: WireResponse = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service(
                self.config.display_name.as_str(),
                format!("unreadable completion: {e}"),
            )
        })?;

        let Some(choice) = parsed.choices.into_iter().next() else {
            return Err(AppError::external_service(
                self.config.display_name.as_str(),
                "completion had no choices",
            ));
        };

        let content = choice.message.content.unwrap_or_default();
        debug!(
            chars = content.len(),
            finish_reason = ?choice.finish_reason,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Chat completion received"
        );

        Ok(ChatResponse {
            content,
            model: parsed.model.unwrap_or_else(|| wire.model.to_owned()),
            usage: parsed.usage.map(TokenUsage::from),
            finish_reason: choice.finish_reason,
        })
    }

    #[instrument(skip_all, fields(provider = %self.config.provider_name))]
    async fn health_check(&self) -> Result<bool, AppError> {
        // Listing models is the cheapest authenticated call
        let response = self
            .authorized(self.client.get(self.config.endpoint("models")))
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let healthy = response.status().is_success();
        if !healthy {
            warn!(status = %response.status(), "LLM health check failed");
        }
        Ok(healthy)
    }
}
