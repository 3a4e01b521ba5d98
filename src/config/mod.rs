//! Configuration module: prompts.

mod prompts;

pub use prompts::{get_system_prompt, STRATEGY};
