use super::{Oracle, SamplingParams};
use crate::error::{ConcordError, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicOracleConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl AnthropicOracleConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Oracle backed by the Anthropic Messages API.
pub struct AnthropicOracle {
    client: reqwest::Client,
    config: AnthropicOracleConfig,
}

impl AnthropicOracle {
    pub fn new(config: AnthropicOracleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConcordError::Validation(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request_body<'a>(&'a self, prompt: &'a str, params: SamplingParams) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

/// First text block of a Messages API response body.
fn reply_text(body: &str) -> Result<String> {
    let response: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| ConcordError::OracleMalformedReply(format!("Undecodable response: {}", e)))?;

    response
        .content
        .into_iter()
        .filter(|block| block.kind.is_empty() || block.kind == "text")
        .find_map(|block| block.text)
        .ok_or_else(|| ConcordError::OracleMalformedReply("No text content in response".into()))
}

#[async_trait]
impl Oracle for AnthropicOracle {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, prompt: &str, params: SamplingParams) -> Result<String> {
        debug!(
            "Calling Anthropic API with model {} (max_tokens={}, temperature={})",
            self.config.model, params.max_tokens, params.temperature
        );

        let response = self
            .client
            .post(format!("{}/messages", self.config.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(prompt, params))
            .send()
            .await
            .map_err(|e| ConcordError::OracleUnavailable(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ConcordError::OracleUnavailable(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ConcordError::OracleUnavailable(format!(
                "Anthropic API error {}: {}",
                status,
                body.chars().take(500).collect::<String>()
            )));
        }

        reply_text(&body)
    }
}
