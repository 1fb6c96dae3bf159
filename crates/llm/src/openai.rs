//! OpenAI Provider
//!
//! Implementation of the LlmProvider trait for OpenAI-compatible
//! chat-completions endpoints. Non-streaming, with optional JSON mode.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{missing_api_key_error, parse_http_error, LlmProvider};
use super::types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole, ProviderConfig,
    StopReason, UsageStats,
};
use crate::http_client::build_http_client;

/// Default OpenAI API base
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given configuration.
    ///
    /// Fails when the base URL or proxy URL is malformed.
    pub fn new(config: ProviderConfig) -> LlmResult<Self> {
        let endpoint = chat_completions_url(config.base_url.as_deref())?;
        let client = build_http_client(
            config.proxy_url.as_deref(),
            Duration::from_secs(config.timeout_secs.max(1)),
        )?;
        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    /// Chat-completions URL this provider posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build the request body for the API
    fn build_request_body(
        &self,
        messages: &[Message],
        system: Option<&str>,
        request_options: &LlmRequestOptions,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": request_options
                .max_tokens_override
                .unwrap_or(self.config.max_tokens),
            "temperature": request_options
                .temperature_override
                .unwrap_or(self.config.temperature),
            "stream": false,
        });

        if request_options.json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let mut openai_messages: Vec<serde_json::Value> = Vec::new();
        if let Some(sys) = system {
            openai_messages.push(serde_json::json!({
                "role": "system",
                "content": sys
            }));
        }
        for msg in messages {
            openai_messages.push(message_to_openai(msg));
        }
        body["messages"] = serde_json::json!(openai_messages);

        body
    }

    /// Parse a response from OpenAI API
    fn parse_response(&self, response: &OpenAIResponse) -> LlmResponse {
        let choice = response.choices.first();

        let content = choice
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone());

        let stop_reason = choice
            .and_then(|c| c.finish_reason.as_ref())
            .map(|r| StopReason::from(r.as_str()))
            .unwrap_or(StopReason::EndTurn);

        let usage = response
            .usage
            .as_ref()
            .map(|u| UsageStats {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            stop_reason,
            usage,
            model: response.model.clone().unwrap_or_else(|| self.config.model.clone()),
        }
    }
}

/// Resolve `<base>/chat/completions`, validating the base URL.
fn chat_completions_url(base_url: Option<&str>) -> LlmResult<String> {
    let base = base_url
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(OPENAI_API_BASE)
        .trim_end_matches('/');

    let base = base.strip_suffix("/chat/completions").unwrap_or(base);
    let endpoint = format!("{}/chat/completions", base);

    let parsed = url::Url::parse(&endpoint).map_err(|e| LlmError::Config {
        message: format!("invalid base URL '{}': {}", base, e),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(LlmError::Config {
            message: format!("unsupported URL scheme '{}'", parsed.scheme()),
        });
    }
    Ok(endpoint)
}

/// Convert a Message to OpenAI API format
fn message_to_openai(message: &Message) -> serde_json::Value {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
    };
    serde_json::json!({
        "role": role,
        "content": message.content
    })
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| missing_api_key_error("openai"))?;

        let body = self.build_request_body(&messages, system.as_deref(), &request_options);

        tracing::debug!(
            "[OpenAI] POST {} model={} json_mode={}",
            self.endpoint,
            self.config.model,
            request_options.json_mode
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: if e.is_timeout() {
                    format!("request timed out: {}", e)
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
            message: e.to_string(),
        })?;

        if status != 200 {
            return Err(parse_http_error(status, &body_text, "openai"));
        }

        let openai_response: OpenAIResponse =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                message: format!("Failed to parse response: {}", e),
            })?;

        let parsed = self.parse_response(&openai_response);
        tracing::debug!(
            "[OpenAI] completion finished: stop={:?} tokens={}",
            parsed.stop_reason,
            parsed.usage.total_tokens()
        );
        Ok(parsed)
    }
}

/// OpenAI API response format
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
