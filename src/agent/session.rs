//! Per-run session state and the report handed back to callers.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use super::conversation::{Conversation, Turn};
use crate::actions::ActionResult;
use crate::adb::ScreenSize;
use crate::model::{OracleTurn, Usage};

/// Device discovered at session start; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceConnection {
    pub serial: String,
    pub screen: ScreenSize,
    /// The screen size could not be read and the default was assumed.
    pub assumed_screen: bool,
}

/// Where the loop is between suspension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    AwaitingObservation,
    AwaitingDecision,
    AwaitingExecution,
    Terminated,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The oracle called `done`.
    Done { summary: String },
    /// The oracle replied without invoking anything.
    EndedTurn { commentary: String },
    /// `max_steps` iterations ran without termination.
    BudgetExhausted { max_steps: u32 },
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done { .. })
    }
}

/// Timing of one executed invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    pub name: String,
    pub elapsed: Duration,
    pub is_error: bool,
}

/// Timing and usage of one loop iteration.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: u32,
    pub oracle_elapsed: Duration,
    pub usage: Option<Usage>,
    pub actions: Vec<ActionRecord>,
}

/// One run of the agentic loop.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub task: String,
    pub device: DeviceConnection,
    pub started_at: DateTime<Local>,
    pub step_count: u32,
    pub max_steps: u32,
    pub conversation: Conversation,
    pub steps: Vec<StepRecord>,
    pub state: LoopState,
    pub outcome: Option<Outcome>,
    pub usage: Usage,
}

impl Session {
    pub fn new(task: &str, device: DeviceConnection, max_steps: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            task: task.to_string(),
            device,
            started_at: Local::now(),
            step_count: 0,
            max_steps,
            conversation: Conversation::new(task),
            steps: Vec::new(),
            state: LoopState::AwaitingObservation,
            outcome: None,
            usage: Usage::default(),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.state == LoopState::Terminated
    }

    pub(crate) fn terminate(&mut self, outcome: Outcome) {
        self.state = LoopState::Terminated;
        self.outcome = Some(outcome);
    }

    /// Each assistant turn with the results that answered it, if any.
    pub fn history(&self) -> Vec<(&OracleTurn, Option<&[ActionResult]>)> {
        let turns = self.conversation.turns();
        turns
            .iter()
            .enumerate()
            .filter_map(|(i, turn)| match turn {
                Turn::Assistant(reply) => {
                    let results = match turns.get(i + 1) {
                        Some(Turn::ToolResults(results)) => Some(results.as_slice()),
                        _ => None,
                    };
                    Some((reply, results))
                }
                _ => None,
            })
            .collect()
    }
}

/// Returned by a completed run.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session: Session,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

impl SessionReport {
    pub fn steps(&self) -> u32 {
        self.session.step_count
    }

    pub fn usage(&self) -> Usage {
        self.session.usage
    }

    /// Final message for the user.
    pub fn message(&self) -> String {
        match &self.outcome {
            Outcome::Done { summary } => summary.clone(),
            Outcome::EndedTurn { commentary } if commentary.is_empty() => {
                "Finished without a summary".to_string()
            }
            Outcome::EndedTurn { commentary } => commentary.clone(),
            Outcome::BudgetExhausted { max_steps } => {
                format!("Reached max steps ({max_steps}) before the task was done")
            }
        }
    }
}
