//! Model client for the Anthropic Messages API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::oracle::{AssistantBlock, Oracle, OracleRequest, OracleTurn, StopReason, Usage};
use crate::actions::{ActionInvocation, ActionResult, ToolOutput};
use crate::agent::{Conversation, Turn};

/// Default number of retry attempts for failed requests.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between retry attempts in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Text sent in place of screenshots dropped by the retention limit.
pub const OMITTED_SCREENSHOT: &str = "[Earlier screenshot omitted]";

/// Model client errors.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Max retries exceeded after {0} attempts: {1}")]
    MaxRetriesExceeded(u32, String),
    #[error("No API key configured. Set ANTHROPIC_API_KEY.")]
    MissingApiKey,
}

impl ModelError {
    /// Network failures, rate limits and server errors are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Request(e) => !e.is_builder() && !e.is_decode(),
            ModelError::Api { status, .. } => *status == 429 || *status >= 500,
            ModelError::Parse(_)
            | ModelError::MaxRetriesExceeded(..)
            | ModelError::MissingApiKey => false,
        }
    }
}

/// Configuration for the oracle model.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model_name: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Maximum number of retry attempts for failed requests.
    pub max_retries: u32,
    /// Delay between retry attempts in seconds.
    pub retry_delay_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model_name: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: 120,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

impl ModelConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the maximum number of retry attempts for failed requests.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the delay between retry attempts in seconds.
    pub fn with_retry_delay(mut self, delay_secs: u64) -> Self {
        self.retry_delay_secs = delay_secs;
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Unsupported,
}

/// [`Oracle`] backed by the Anthropic Messages API.
pub struct AnthropicClient {
    config: ModelConfig,
    client: Client,
}

impl AnthropicClient {
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        if config.api_key.trim().is_empty() {
            return Err(ModelError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Send a request, retrying transient failures.
    pub async fn request(&self, body: &Value) -> Result<OracleTurn, ModelError> {
        let url = self.config.messages_url();
        let mut last_error: Option<ModelError> = None;
        let max_attempts = self.config.max_retries + 1;

        for attempt in 1..=max_attempts {
            match self.send_request(&url, body).await {
                Ok(turn) => return Ok(turn),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    if attempt < max_attempts {
                        warn!(
                            "Request failed (attempt {}/{}): {}. Retrying in {}s",
                            attempt, max_attempts, e, self.config.retry_delay_secs
                        );
                        sleep(Duration::from_secs(self.config.retry_delay_secs)).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(ModelError::MaxRetriesExceeded(
            max_attempts,
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }

    async fn send_request(&self, url: &str, body: &Value) -> Result<OracleTurn, ModelError> {
        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(api_error(status, &text));
        }
        parse_response(&text)
    }
}

#[async_trait]
impl Oracle for AnthropicClient {
    async fn decide(&self, request: OracleRequest<'_>) -> Result<OracleTurn, ModelError> {
        let body = MessageBuilder::build_body(&self.config, &request);
        debug!(
            turns = request.conversation.len(),
            tools = request.tools.len(),
            "Sending messages request"
        );
        self.request(&body).await
    }
}

fn api_error(status: StatusCode, body: &str) -> ModelError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    ModelError::Api {
        status: status.as_u16(),
        body: message,
    }
}

/// Parse a Messages API response body.
pub fn parse_response(body: &str) -> Result<OracleTurn, ModelError> {
    let response: MessagesResponse =
        serde_json::from_str(body).map_err(|e| ModelError::Parse(e.to_string()))?;

    let mut blocks = Vec::with_capacity(response.content.len());
    for block in response.content {
        match block {
            ContentBlock::Text { text } => blocks.push(AssistantBlock::Text(text)),
            ContentBlock::ToolUse { id, name, input } => {
                let invocation = ActionInvocation::from_value(id, name.clone(), input)
                    .ok_or_else(|| {
                        ModelError::Parse(format!("tool_use input for {name} is not an object"))
                    })?;
                blocks.push(AssistantBlock::ToolUse(invocation));
            }
            ContentBlock::Unsupported => {}
        }
    }

    let stop_reason = response
        .stop_reason
        .as_deref()
        .map(StopReason::parse)
        .ok_or_else(|| ModelError::Parse("missing stop_reason".to_string()))?;

    Ok(OracleTurn {
        blocks,
        stop_reason,
        usage: response.usage,
    })
}

/// Builds Messages API request bodies from a conversation.
pub struct MessageBuilder;

impl MessageBuilder {
    pub fn build_body(config: &ModelConfig, request: &OracleRequest<'_>) -> Value {
        let tools: Vec<Value> = request
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": t.input_schema,
                })
            })
            .collect();

        json!({
            "model": config.model_name,
            "max_tokens": config.max_tokens,
            "system": request.system,
            "tools": tools,
            "messages": Self::build_messages(request.conversation, request.max_images),
        })
    }

    /// Serialize every turn in order.
    ///
    /// With `max_images`, only the newest screenshots are sent as images;
    /// older ones become [`OMITTED_SCREENSHOT`].
    pub fn build_messages(conversation: &Conversation, max_images: Option<usize>) -> Vec<Value> {
        let total = conversation.screenshot_count();
        let mut to_skip = max_images.map_or(0, |keep| total.saturating_sub(keep));

        conversation
            .turns()
            .iter()
            .map(|turn| match turn {
                Turn::Task { text } => json!({
                    "role": "user",
                    "content": format!("Task: {text}"),
                }),
                Turn::Assistant(reply) => Self::assistant_message(reply),
                Turn::ToolResults(results) => json!({
                    "role": "user",
                    "content": results
                        .iter()
                        .map(|r| Self::tool_result(r, &mut to_skip))
                        .collect::<Vec<_>>(),
                }),
            })
            .collect()
    }

    fn assistant_message(reply: &OracleTurn) -> Value {
        let mut content: Vec<Value> = reply
            .blocks
            .iter()
            .filter_map(|block| match block {
                AssistantBlock::Text(text) if text.trim().is_empty() => None,
                AssistantBlock::Text(text) => Some(json!({"type": "text", "text": text})),
                AssistantBlock::ToolUse(inv) => Some(json!({
                    "type": "tool_use",
                    "id": inv.id,
                    "name": inv.name,
                    "input": inv.arguments,
                })),
            })
            .collect();
        if content.is_empty() {
            content.push(json!({"type": "text", "text": "(no response)"}));
        }
        json!({"role": "assistant", "content": content})
    }

    fn tool_result(result: &ActionResult, to_skip: &mut usize) -> Value {
        let content = match &result.output {
            ToolOutput::Text(text) => vec![json!({"type": "text", "text": text})],
            ToolOutput::Image(_) if *to_skip > 0 => {
                *to_skip -= 1;
                vec![json!({"type": "text", "text": OMITTED_SCREENSHOT})]
            }
            ToolOutput::Image(shot) => vec![
                json!({
                    "type": "text",
                    "text": format!("Here is the current screen ({}x{}):", shot.width, shot.height),
                }),
                json!({
                    "type": "image",
                    "source": {
                        "type": "base64",
                        "media_type": shot.format.media_type(),
                        "data": shot.base64_data(),
                    },
                }),
            ],
        };

        let mut block = json!({
            "type": "tool_result",
            "tool_use_id": result.invocation_id,
            "content": content,
        });
        if result.is_error {
            block["is_error"] = json!(true);
        }
        block
    }
}
