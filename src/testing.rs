//! Scripted fakes for the bridge and the oracle.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use crate::actions::ActionInvocation;
use crate::adb::{AdbError, Bridge, BridgeOutput};
use crate::model::{
    AssistantBlock, ModelError, Oracle, OracleRequest, OracleTurn, StopReason, Usage,
};

/// Canned answer for a bridge command.
#[derive(Clone)]
enum Reply {
    Output(BridgeOutput),
    /// Fails the way [`crate::adb::AdbBridge`] does when the deadline passes.
    Timeout,
}

/// Records every command and answers from prefix-matched rules.
///
/// The last matching rule wins; unmatched commands succeed with empty output.
pub struct ScriptedBridge {
    rules: Mutex<Vec<(Vec<String>, Reply)>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedBridge {
    fn with_devices(listing: &str) -> Self {
        let bridge = Self {
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        };
        bridge.respond(&["devices"], BridgeOutput::ok(listing));
        bridge
    }

    /// One ready device, `emulator-5554`.
    pub fn with_device() -> Self {
        Self::with_devices("List of devices attached\nemulator-5554\tdevice\n")
    }

    pub fn without_device() -> Self {
        Self::with_devices("List of devices attached\n\n")
    }

    pub fn respond(&self, prefix: &[&str], output: BridgeOutput) {
        self.push_rule(prefix, Reply::Output(output));
    }

    /// Commands starting with `prefix` fail with [`AdbError::Timeout`].
    pub fn time_out(&self, prefix: &[&str]) {
        self.push_rule(prefix, Reply::Timeout);
    }

    fn push_rule(&self, prefix: &[&str], reply: Reply) {
        let prefix = prefix.iter().map(|s| s.to_string()).collect();
        self.rules.lock().unwrap().push((prefix, reply));
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than the connection check.
    pub fn device_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|call| call != &["devices"])
            .collect()
    }
}

#[async_trait]
impl Bridge for ScriptedBridge {
    async fn run(&self, args: &[String], timeout: Duration) -> Result<BridgeOutput, AdbError> {
        self.calls.lock().unwrap().push(args.to_vec());
        let rules = self.rules.lock().unwrap();
        let reply = rules
            .iter()
            .rev()
            .find(|(prefix, _)| args.starts_with(prefix))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Reply::Output(BridgeOutput::ok(Vec::new())));
        match reply {
            Reply::Output(output) => Ok(output),
            Reply::Timeout => Err(AdbError::Timeout {
                command: args.join(" "),
                secs: timeout.as_secs(),
            }),
        }
    }
}

/// What the oracle was shown on one call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: String,
    pub turns: usize,
    pub tools: Vec<&'static str>,
    pub max_images: Option<usize>,
}

/// Returns queued replies in order, then the fallback if any.
pub struct ScriptedOracle {
    queue: Mutex<VecDeque<Result<OracleTurn, ModelError>>>,
    fallback: Option<OracleTurn>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<Result<OracleTurn, ModelError>>) -> Self {
        Self {
            queue: Mutex::new(replies.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every call with `turn`.
    pub fn repeating(turn: OracleTurn) -> Self {
        Self {
            fallback: Some(turn),
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn decide(&self, request: OracleRequest<'_>) -> Result<OracleTurn, ModelError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system: request.system.to_string(),
            turns: request.conversation.len(),
            tools: request.tools.iter().map(|t| t.name).collect(),
            max_images: request.max_images,
        });
        if let Some(reply) = self.queue.lock().unwrap().pop_front() {
            return reply;
        }
        self.fallback
            .clone()
            .ok_or_else(|| ModelError::Parse("script exhausted".to_string()))
    }
}

/// A reply invoking `(id, name, arguments)` in order.
pub fn tool_turn(calls: &[(&str, &str, Value)]) -> OracleTurn {
    OracleTurn {
        blocks: calls
            .iter()
            .map(|(id, name, args)| {
                AssistantBlock::ToolUse(
                    ActionInvocation::from_value(*id, *name, args.clone()).unwrap(),
                )
            })
            .collect(),
        stop_reason: StopReason::ToolUse,
        usage: Some(Usage {
            input_tokens: 100,
            output_tokens: 20,
        }),
    }
}

/// A plain reply with no invocations.
pub fn text_turn(text: &str) -> OracleTurn {
    OracleTurn {
        blocks: vec![AssistantBlock::Text(text.to_string())],
        stop_reason: StopReason::EndTurn,
        usage: None,
    }
}

/// A blank PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
    buffer.into_inner()
}
