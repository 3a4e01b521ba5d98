//! Model client module: the oracle trait and its Anthropic implementation.

mod client;
mod oracle;

pub use client::{
    parse_response, AnthropicClient, MessageBuilder, ModelConfig, ModelError, DEFAULT_BASE_URL,
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, OMITTED_SCREENSHOT,
};
pub use oracle::{AssistantBlock, Oracle, OracleRequest, OracleTurn, StopReason, Usage};
