//! Append-only record of a session's exchanges with the oracle.

use thiserror::Error;

use crate::actions::{ActionResult, ToolOutput};
use crate::model::OracleTurn;

/// Turn-order violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    #[error("An assistant turn cannot follow another assistant turn")]
    AssistantAfterAssistant,
    #[error("Tool results must follow an assistant turn")]
    ResultsWithoutAssistant,
    #[error("Assistant turn has no invocations to answer")]
    NothingToAnswer,
    #[error("Expected {expected} results, got {found}")]
    ResultCount { expected: usize, found: usize },
    #[error("Result {position} answers '{found}' but the invocation id is '{expected}'")]
    UnpairedResult {
        position: usize,
        expected: String,
        found: String,
    },
}

/// One entry in the log.
#[derive(Debug, Clone)]
pub enum Turn {
    /// The user's task; always first.
    Task { text: String },
    Assistant(OracleTurn),
    /// Results for every invocation of the preceding assistant turn, in order.
    ToolResults(Vec<ActionResult>),
}

/// Ordered task, assistant and tool-result turns.
///
/// Appends enforce `Task (Assistant ToolResults)* Assistant?`, and every
/// result batch pairs one-to-one with the previous turn's invocations.
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::Task { text: task.into() }],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn task(&self) -> &str {
        match self.turns.first() {
            Some(Turn::Task { text }) => text,
            _ => "",
        }
    }

    pub fn push_assistant(&mut self, turn: OracleTurn) -> Result<(), ConversationError> {
        if matches!(self.turns.last(), Some(Turn::Assistant(_))) {
            return Err(ConversationError::AssistantAfterAssistant);
        }
        self.turns.push(Turn::Assistant(turn));
        Ok(())
    }

    pub fn push_results(&mut self, results: Vec<ActionResult>) -> Result<(), ConversationError> {
        let Some(Turn::Assistant(assistant)) = self.turns.last() else {
            return Err(ConversationError::ResultsWithoutAssistant);
        };

        let ids: Vec<&str> = assistant.invocations().map(|i| i.id.as_str()).collect();
        if ids.is_empty() {
            return Err(ConversationError::NothingToAnswer);
        }
        if ids.len() != results.len() {
            return Err(ConversationError::ResultCount {
                expected: ids.len(),
                found: results.len(),
            });
        }
        for (position, (id, result)) in ids.iter().zip(&results).enumerate() {
            if *id != result.invocation_id {
                return Err(ConversationError::UnpairedResult {
                    position,
                    expected: id.to_string(),
                    found: result.invocation_id.clone(),
                });
            }
        }

        self.turns.push(Turn::ToolResults(results));
        Ok(())
    }

    /// Number of screenshots held in tool results.
    pub fn screenshot_count(&self) -> usize {
        self.turns
            .iter()
            .filter_map(|turn| match turn {
                Turn::ToolResults(results) => Some(results),
                _ => None,
            })
            .flatten()
            .filter(|r| matches!(r.output, ToolOutput::Image(_)))
            .count()
    }
}
