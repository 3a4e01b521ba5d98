//! Invocation and result types shared by the catalog, the handler and the agent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::adb::Screenshot;

/// A request from the oracle to run one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionInvocation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ActionInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Build from a JSON value; `null` means no arguments.
    pub fn from_value(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Option<Self> {
        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => return None,
        };
        Some(Self::new(id, name, arguments))
    }

    /// Short human-readable argument summary for progress output.
    pub fn describe_arguments(&self) -> String {
        let str_arg = |key: &str| self.arguments.get(key).and_then(Value::as_str);
        let num_arg = |key: &str| self.arguments.get(key).map(|v| v.to_string());

        match self.name.as_str() {
            "tap" | "double_tap" | "long_press" => format!(
                "({}, {})",
                num_arg("x").unwrap_or_default(),
                num_arg("y").unwrap_or_default()
            ),
            "type_text" => format!("\"{}\"", str_arg("text").unwrap_or_default()),
            "swipe" => str_arg("direction").unwrap_or_default().to_string(),
            "press_key" => str_arg("key").unwrap_or_default().to_string(),
            "launch_app" => str_arg("package").unwrap_or_default().to_string(),
            "shell" => str_arg("command").unwrap_or_default().to_string(),
            "screenshot" => "capturing...".to_string(),
            "done" => str_arg("summary")
                .unwrap_or_default()
                .chars()
                .take(60)
                .collect(),
            _ if self.arguments.is_empty() => String::new(),
            _ => Value::Object(self.arguments.clone()).to_string(),
        }
    }
}

/// Payload produced by an action.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Text(String),
    Image(Screenshot),
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput::Text(text.into())
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        match self {
            ToolOutput::Text(text) => {
                let first = text.lines().next().unwrap_or_default();
                if first.chars().count() > 80 {
                    format!("{}...", first.chars().take(80).collect::<String>())
                } else {
                    first.to_string()
                }
            }
            ToolOutput::Image(shot) => format!(
                "{} {}x{} ({} bytes)",
                shot.format.media_type(),
                shot.width,
                shot.height,
                shot.data.len()
            ),
        }
    }
}

/// Output of one invocation, paired with the invocation that produced it.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub invocation_id: String,
    pub action_name: String,
    pub output: ToolOutput,
    pub is_error: bool,
}

impl ActionResult {
    pub fn success(invocation: &ActionInvocation, output: ToolOutput) -> Self {
        Self {
            invocation_id: invocation.id.clone(),
            action_name: invocation.name.clone(),
            output,
            is_error: false,
        }
    }

    pub fn failure(invocation: &ActionInvocation, message: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation.id.clone(),
            action_name: invocation.name.clone(),
            output: ToolOutput::Text(message.into()),
            is_error: true,
        }
    }
}

/// Advertised form of a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}
