// Copyright 2025 Zhipu AI (Original Python implementation)
// Copyright 2025 ModerRAS (Rust implementation)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # ADB Agent
//!
//! Drives an Android device over ADB with a reasoning model in a
//! decide, act, observe loop.
//!
//! The crate has three layers:
//!
//! - [`adb`]: the command executor. Every device command goes through a
//!   [`Bridge`], normally the `adb` executable.
//! - [`actions`]: the fixed action catalog with JSON schemas, validation and
//!   dispatch. [`ToolRegistry`] exposes the device actions to an external
//!   tool server.
//! - [`agent`]: the [`PhoneAgent`] loop, talking to an [`Oracle`] such as
//!   [`AnthropicClient`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use adb_agent::{AdbBridge, AdbConfig, AdbDevice, AgentConfig, AnthropicClient, ModelConfig, PhoneAgent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let adb = AdbConfig::from_env();
//!     let serial = adb.serial.clone();
//!     let device = AdbDevice::new(Arc::new(AdbBridge::new(adb)), serial);
//!
//!     let model_config = ModelConfig::default()
//!         .with_api_key(std::env::var("ANTHROPIC_API_KEY")?);
//!     let oracle = Arc::new(AnthropicClient::new(model_config)?);
//!
//!     let mut agent = PhoneAgent::new(oracle, device, AgentConfig::default());
//!     let report = agent.run("Open Chrome and search for the weather").await?;
//!
//!     println!("Task result: {}", report.message());
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod adb;
pub mod agent;
pub mod config;
pub mod model;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use actions::{
    Action, ActionError, ActionHandler, ActionInvocation, ActionKind, ActionResult, Catalog,
    ToolDescriptor, ToolOutput, ToolRegistry,
};
pub use adb::{
    AdbBridge, AdbConfig, AdbDevice, AdbError, Bridge, ConnectionError, Direction, ScreenSize,
    Screenshot,
};
pub use agent::{
    AgentConfig, AgentError, AgentEvent, Conversation, Outcome, PhoneAgent, Session,
    SessionReport,
};
pub use model::{AnthropicClient, ModelConfig, ModelError, Oracle};
pub use settings::AppSettings;
