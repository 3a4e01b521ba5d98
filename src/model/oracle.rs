//! The decision-making service behind the agent loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::ModelError;
use crate::actions::{ActionInvocation, ToolDescriptor};
use crate::agent::Conversation;

/// Everything the oracle sees when choosing the next actions.
#[derive(Debug, Clone, Copy)]
pub struct OracleRequest<'a> {
    pub system: &'a str,
    pub conversation: &'a Conversation,
    pub tools: &'a [ToolDescriptor],
    /// Keep only this many of the newest screenshots when serializing.
    pub max_images: Option<usize>,
}

/// One block of an assistant reply.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantBlock {
    Text(String),
    ToolUse(ActionInvocation),
}

/// Why the oracle stopped producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

impl StopReason {
    pub fn parse(value: &str) -> Self {
        match value {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            other => StopReason::Other(other.to_string()),
        }
    }
}

/// Token usage reported for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn add(&mut self, other: Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// An assistant reply: commentary and zero or more invocations, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleTurn {
    pub blocks: Vec<AssistantBlock>,
    pub stop_reason: StopReason,
    pub usage: Option<Usage>,
}

impl OracleTurn {
    pub fn invocations(&self) -> impl Iterator<Item = &ActionInvocation> {
        self.blocks.iter().filter_map(|block| match block {
            AssistantBlock::ToolUse(invocation) => Some(invocation),
            AssistantBlock::Text(_) => None,
        })
    }

    pub fn has_invocations(&self) -> bool {
        self.invocations().next().is_some()
    }

    /// Non-empty text blocks joined by newlines.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                AssistantBlock::Text(text) if !text.trim().is_empty() => Some(text.trim()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Chooses the next actions given the conversation so far.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn decide(&self, request: OracleRequest<'_>) -> Result<OracleTurn, ModelError>;
}
