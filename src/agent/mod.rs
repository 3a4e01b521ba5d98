//! Agent module: the session loop and its conversation log.

mod conversation;
mod phone_agent;
mod session;

pub use conversation::{Conversation, ConversationError, Turn};
pub use phone_agent::{
    AgentConfig, AgentError, AgentEvent, EventCallback, PhoneAgent, DEFAULT_MAX_STEPS,
};
pub use session::{
    ActionRecord, DeviceConnection, LoopState, Outcome, Session, SessionReport, StepRecord,
};
