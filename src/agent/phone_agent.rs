//! Main PhoneAgent type running the decide, act, observe loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{error, info, warn};

use super::conversation::ConversationError;
use super::session::{
    ActionRecord, DeviceConnection, LoopState, Outcome, Session, SessionReport, StepRecord,
};
use crate::actions::{
    ActionHandler, ActionInvocation, ActionKind, ActionResult, Catalog, ToolOutput,
};
use crate::adb::{AdbDevice, AdbError, ScreenSize, DEFAULT_SCREEN_SIZE};
use crate::config::get_system_prompt;
use crate::model::{ModelError, Oracle, OracleRequest, Usage};

/// Agent errors. Device failures after start-up never surface here.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Device unavailable: {0}")]
    Device(#[from] AdbError),
    #[error("Model error: {0}")]
    Oracle(#[from] ModelError),
    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),
}

/// Default step budget.
pub const DEFAULT_MAX_STEPS: u32 = 25;

/// Configuration for the PhoneAgent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum number of oracle calls before stopping.
    pub max_steps: u32,
    /// Custom system prompt (if None, the default is built from the screen size).
    pub system_prompt: Option<String>,
    /// Keep only this many of the newest screenshots in requests.
    pub keep_screenshots: Option<usize>,
    /// Actions offered to the oracle.
    pub catalog: Catalog,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            system_prompt: None,
            keep_screenshots: None,
            catalog: Catalog::AGENT,
        }
    }
}

impl AgentConfig {
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_keep_screenshots(mut self, keep: usize) -> Self {
        self.keep_screenshots = Some(keep);
        self
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Get the system prompt (custom or default for the screen).
    pub fn get_system_prompt(&self, screen: ScreenSize) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| get_system_prompt(screen, &self.catalog))
    }
}

/// Progress notifications. They never influence control flow.
#[derive(Debug)]
pub enum AgentEvent<'a> {
    Started {
        session: &'a Session,
    },
    StepStarted {
        step: u32,
        max_steps: u32,
    },
    OracleReplied {
        step: u32,
        elapsed: Duration,
        usage: Option<Usage>,
        total: Usage,
    },
    Commentary {
        text: &'a str,
    },
    ActionStarted {
        invocation: &'a ActionInvocation,
    },
    ActionFinished {
        result: &'a ActionResult,
        elapsed: Duration,
    },
    Finished {
        outcome: &'a Outcome,
        elapsed: Duration,
        usage: Usage,
    },
}

/// Callback type for progress events.
pub type EventCallback = Box<dyn Fn(&AgentEvent<'_>) + Send + Sync>;

/// Agent driving an Android device through an [`Oracle`].
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use adb_agent::{AdbBridge, AdbConfig, AdbDevice, AgentConfig, AnthropicClient, ModelConfig, PhoneAgent};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let adb = AdbConfig::from_env();
///     let serial = adb.serial.clone();
///     let device = AdbDevice::new(Arc::new(AdbBridge::new(adb)), serial);
///     let oracle = AnthropicClient::new(ModelConfig::default().with_api_key("sk-ant-..."))?;
///
///     let mut agent = PhoneAgent::new(Arc::new(oracle), device, AgentConfig::default());
///     let report = agent.run("Open Chrome").await?;
///
///     println!("Task result: {}", report.message());
///     Ok(())
/// }
/// ```
pub struct PhoneAgent {
    oracle: Arc<dyn Oracle>,
    handler: ActionHandler,
    config: AgentConfig,
    on_event: Option<EventCallback>,
}

impl PhoneAgent {
    /// Create a new PhoneAgent.
    ///
    /// # Arguments
    /// * `oracle` - Chooses the actions.
    /// * `device` - Device the actions run against.
    /// * `config` - Step budget, prompt and catalog.
    pub fn new(oracle: Arc<dyn Oracle>, device: AdbDevice, config: AgentConfig) -> Self {
        Self {
            oracle,
            handler: ActionHandler::new(device),
            config,
            on_event: None,
        }
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.on_event = Some(callback);
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn emit(&self, event: AgentEvent<'_>) {
        if let Some(callback) = &self.on_event {
            callback(&event);
        }
    }

    /// Check the device and settle the screen geometry for the session.
    async fn connect(&mut self) -> Result<DeviceConnection, AgentError> {
        let serial = self.handler.device().check_connection().await?;
        let (screen, assumed_screen) = match self.handler.device().get_screen_size().await {
            Ok(screen) => (screen, false),
            Err(e) => {
                warn!(
                    "Could not read screen size ({}), assuming {}",
                    e, DEFAULT_SCREEN_SIZE
                );
                (DEFAULT_SCREEN_SIZE, true)
            }
        };
        self.handler.device_mut().set_screen_size(screen);

        Ok(DeviceConnection {
            serial,
            screen,
            assumed_screen,
        })
    }

    /// Run the agent to complete a task.
    ///
    /// Returns the session report for every ending, including an exhausted
    /// step budget. Only a failed initial device check, an oracle failure or
    /// a broken conversation invariant produce an error.
    pub async fn run(&mut self, task: &str) -> Result<SessionReport, AgentError> {
        let started = Instant::now();
        let connection = self.connect().await?;
        let system = self.config.get_system_prompt(connection.screen);
        let tools = self.config.catalog.descriptors();
        let catalog = self.config.catalog;

        let mut session = Session::new(task, connection, self.config.max_steps);
        info!(
            session = %session.id,
            serial = %session.device.serial,
            screen = %session.device.screen,
            "Starting task: {}",
            task
        );
        self.emit(AgentEvent::Started { session: &session });

        let outcome = loop {
            if session.step_count >= session.max_steps {
                warn!("Reached max steps ({})", session.max_steps);
                break Outcome::BudgetExhausted {
                    max_steps: session.max_steps,
                };
            }

            session.step_count += 1;
            let step = session.step_count;
            info!(step, max_steps = session.max_steps, "Step started");
            self.emit(AgentEvent::StepStarted {
                step,
                max_steps: session.max_steps,
            });

            session.state = LoopState::AwaitingDecision;
            let asked = Instant::now();
            let request = OracleRequest {
                system: &system,
                conversation: &session.conversation,
                tools: &tools,
                max_images: self.config.keep_screenshots,
            };
            let turn = match self.oracle.decide(request).await {
                Ok(turn) => turn,
                Err(e) => {
                    error!(step, "Oracle request failed: {}", e);
                    return Err(AgentError::Oracle(e));
                }
            };
            let oracle_elapsed = asked.elapsed();

            if let Some(usage) = turn.usage {
                session.usage.add(usage);
            }
            info!(
                step,
                elapsed_ms = oracle_elapsed.as_millis() as u64,
                input_tokens = session.usage.input_tokens,
                output_tokens = session.usage.output_tokens,
                "Oracle replied"
            );
            self.emit(AgentEvent::OracleReplied {
                step,
                elapsed: oracle_elapsed,
                usage: turn.usage,
                total: session.usage,
            });

            let commentary = turn.text();
            if !commentary.is_empty() {
                self.emit(AgentEvent::Commentary { text: &commentary });
            }

            let invocations: Vec<ActionInvocation> = turn.invocations().cloned().collect();
            let mut record = StepRecord {
                step,
                oracle_elapsed,
                usage: turn.usage,
                actions: Vec::with_capacity(invocations.len()),
            };
            session.conversation.push_assistant(turn)?;

            if invocations.is_empty() {
                session.steps.push(record);
                break Outcome::EndedTurn { commentary };
            }

            session.state = LoopState::AwaitingExecution;
            let mut results = Vec::with_capacity(invocations.len());
            let mut summary = None;
            for invocation in &invocations {
                self.emit(AgentEvent::ActionStarted { invocation });
                let began = Instant::now();
                let result = self.handler.invoke(&catalog, invocation).await;
                let elapsed = began.elapsed();

                let is_done = invocation.name == ActionKind::Done.name();
                if is_done && !result.is_error && summary.is_none() {
                    if let ToolOutput::Text(text) = &result.output {
                        summary = Some(text.clone());
                    }
                }

                record.actions.push(ActionRecord {
                    name: invocation.name.clone(),
                    elapsed,
                    is_error: result.is_error,
                });
                self.emit(AgentEvent::ActionFinished {
                    result: &result,
                    elapsed,
                });
                results.push(result);
            }

            session.conversation.push_results(results)?;
            session.steps.push(record);

            if let Some(summary) = summary {
                break Outcome::Done { summary };
            }
            session.state = LoopState::AwaitingObservation;
        };

        let elapsed = started.elapsed();
        info!(
            steps = session.step_count,
            elapsed_ms = elapsed.as_millis() as u64,
            total_tokens = session.usage.total(),
            "Session finished: {:?}",
            outcome
        );
        session.terminate(outcome.clone());
        self.emit(AgentEvent::Finished {
            outcome: &outcome,
            elapsed,
            usage: session.usage,
        });

        Ok(SessionReport {
            session,
            outcome,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::BridgeOutput;
    use crate::agent::Turn;
    use crate::testing::{text_turn, tool_turn, ScriptedBridge, ScriptedOracle};
    use serde_json::json;
    use std::sync::Mutex;

    fn agent(
        bridge: &Arc<ScriptedBridge>,
        oracle: &Arc<ScriptedOracle>,
        config: AgentConfig,
    ) -> PhoneAgent {
        PhoneAgent::new(oracle.clone(), AdbDevice::new(bridge.clone(), None), config)
    }

    fn device_with_screen() -> Arc<ScriptedBridge> {
        let bridge = Arc::new(ScriptedBridge::with_device());
        bridge.respond(&["shell", "wm", "size"], BridgeOutput::ok("Physical size: 1080x2400"));
        bridge
    }

    #[test]
    fn test_agent_config_default() {
        let config = AgentConfig::default();
        assert_eq!(config.max_steps, 25);
        assert_eq!(config.catalog, Catalog::AGENT);
        assert!(config.keep_screenshots.is_none());
    }

    #[test]
    fn test_agent_config_builder() {
        let config = AgentConfig::default()
            .with_max_steps(5)
            .with_keep_screenshots(2)
            .with_catalog(Catalog::FULL)
            .with_system_prompt("Be careful");

        assert_eq!(config.max_steps, 5);
        assert_eq!(config.keep_screenshots, Some(2));
        assert_eq!(config.catalog, Catalog::FULL);
        assert_eq!(
            config.get_system_prompt(ScreenSize::new(1, 1)),
            "Be careful"
        );
    }

    #[tokio::test]
    async fn test_done_batch_is_drained() {
        let bridge = device_with_screen();
        let oracle = Arc::new(ScriptedOracle::new(vec![Ok(tool_turn(&[
            ("t1", "done", json!({"summary": "Opened Chrome"})),
            ("t2", "tap", json!({"x": 10, "y": 20})),
        ]))]));

        let report = agent(&bridge, &oracle, AgentConfig::default())
            .run("Open Chrome")
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            Outcome::Done {
                summary: "Opened Chrome".to_string()
            }
        );
        assert!(report.session.is_terminated());
        assert_eq!(report.steps(), 1);
        assert!(bridge
            .device_calls()
            .iter()
            .any(|call| call == &["shell", "input", "tap", "10", "20"]));
        match report.session.conversation.turns().last() {
            Some(Turn::ToolResults(results)) => assert_eq!(results.len(), 2),
            other => panic!("unexpected last turn: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_budget_exhausted_after_max_steps() {
        let bridge = device_with_screen();
        let oracle = Arc::new(ScriptedOracle::repeating(tool_turn(&[(
            "t",
            "press_key",
            json!({"key": "back"}),
        )])));

        let report = agent(&bridge, &oracle, AgentConfig::default().with_max_steps(3))
            .run("Loop forever")
            .await
            .unwrap();

        assert_eq!(report.outcome, Outcome::BudgetExhausted { max_steps: 3 });
        assert_eq!(report.steps(), 3);
        assert_eq!(report.session.steps.len(), 3);
        assert_eq!(oracle.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_reply_without_invocations_ends_turn() {
        let bridge = device_with_screen();
        let oracle = Arc::new(ScriptedOracle::new(vec![Ok(text_turn(
            "The app is already open.",
        ))]));

        let report = agent(&bridge, &oracle, AgentConfig::default())
            .run("Open Chrome")
            .await
            .unwrap();

        assert_eq!(
            report.outcome,
            Outcome::EndedTurn {
                commentary: "The app is already open.".to_string()
            }
        );
        assert_eq!(report.session.conversation.len(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_fed_back() {
        let bridge = device_with_screen();
        let oracle = Arc::new(ScriptedOracle::new(vec![
            Ok(tool_turn(&[
                ("t1", "tap", json!({"x": 5})),
                ("t2", "shell", json!({"command": "reboot"})),
            ])),
            Ok(tool_turn(&[("t3", "done", json!({"summary": "gave up"}))])),
        ]));

        let report = agent(&bridge, &oracle, AgentConfig::default())
            .run("t")
            .await
            .unwrap();

        assert!(report.outcome.is_done());
        let history = report.session.history();
        let first = history[0].1.unwrap();
        assert!(first.iter().all(|r| r.is_error));
        assert!(bridge
            .device_calls()
            .iter()
            .all(|call| call[..] != ["shell", "reboot"]));
        // The second request saw the error results.
        assert_eq!(oracle.requests()[1].turns, 3);
    }

    #[tokio::test]
    async fn test_bridge_timeout_becomes_error_result() {
        let bridge = device_with_screen();
        bridge.time_out(&["shell", "input", "tap"]);
        let oracle = Arc::new(ScriptedOracle::new(vec![
            Ok(tool_turn(&[("t1", "tap", json!({"x": 100, "y": 200}))])),
            Ok(tool_turn(&[("t2", "done", json!({"summary": "retried later"}))])),
        ]));

        let report = agent(&bridge, &oracle, AgentConfig::default())
            .run("tap it")
            .await
            .unwrap();

        assert!(report.outcome.is_done());
        assert_eq!(report.steps(), 2);
        let history = report.session.history();
        let results = history[0].1.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_error);
        assert!(results[0].output.summary().contains("timed out"));
        assert_eq!(oracle.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_overflowing_swipe_is_reported_not_fatal() {
        let bridge = device_with_screen();
        let oracle = Arc::new(ScriptedOracle::new(vec![
            Ok(tool_turn(&[(
                "t1",
                "swipe",
                json!({"direction": "down", "distance": i32::MAX, "x": 10, "y": 10}),
            )])),
            Ok(text_turn("Could not swipe that far.")),
        ]));

        let report = agent(&bridge, &oracle, AgentConfig::default())
            .run("scroll")
            .await
            .unwrap();

        assert!(matches!(report.outcome, Outcome::EndedTurn { .. }));
        let history = report.session.history();
        let result = &history[0].1.unwrap()[0];
        assert!(result.is_error);
        assert!(result.output.summary().contains("out of range"));
        assert!(bridge
            .device_calls()
            .iter()
            .all(|call| call.get(2).map(String::as_str) != Some("swipe")));
    }

    #[tokio::test]
    async fn test_oracle_failure_is_fatal() {
        let bridge = device_with_screen();
        let oracle = Arc::new(ScriptedOracle::new(vec![Err(ModelError::Api {
            status: 401,
            body: "invalid x-api-key".to_string(),
        })]));

        let err = agent(&bridge, &oracle, AgentConfig::default())
            .run("t")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Oracle(ModelError::Api { status: 401, .. })));
    }

    #[tokio::test]
    async fn test_no_device_at_start_is_fatal() {
        let bridge = Arc::new(ScriptedBridge::without_device());
        let oracle = Arc::new(ScriptedOracle::new(vec![]));

        let err = agent(&bridge, &oracle, AgentConfig::default())
            .run("t")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Device(AdbError::Connection(_))));
        assert!(oracle.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_screen_falls_back_to_default() {
        let bridge = Arc::new(ScriptedBridge::with_device());
        bridge.respond(&["shell", "wm", "size"], BridgeOutput::ok("garbage"));
        let oracle = Arc::new(ScriptedOracle::new(vec![
            Ok(tool_turn(&[("t1", "swipe", json!({"direction": "up"}))])),
            Ok(text_turn("Scrolled.")),
        ]));

        let report = agent(&bridge, &oracle, AgentConfig::default())
            .run("scroll")
            .await
            .unwrap();

        assert_eq!(report.session.device.screen, DEFAULT_SCREEN_SIZE);
        assert!(report.session.device.assumed_screen);
        assert!(oracle.requests()[0].system.contains("1080x2400"));
        // The swipe used the assumed geometry without asking again.
        let swipe = bridge
            .device_calls()
            .into_iter()
            .find(|call| call.get(2).map(String::as_str) == Some("swipe"))
            .unwrap();
        assert_eq!(swipe, vec!["shell", "input", "swipe", "540", "1200", "540", "700", "300"]);
    }

    #[tokio::test]
    async fn test_events_and_screenshot_retention() {
        let bridge = device_with_screen();
        let oracle = Arc::new(ScriptedOracle::new(vec![Ok(tool_turn(&[(
            "t1",
            "done",
            json!({"summary": "ok"}),
        )]))]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut agent = agent(
            &bridge,
            &oracle,
            AgentConfig::default().with_keep_screenshots(1),
        )
        .with_event_callback(Box::new(move |event: &AgentEvent<'_>| {
            let name = match event {
                AgentEvent::Started { .. } => "started",
                AgentEvent::StepStarted { .. } => "step",
                AgentEvent::OracleReplied { .. } => "oracle",
                AgentEvent::Commentary { .. } => "commentary",
                AgentEvent::ActionStarted { .. } => "action",
                AgentEvent::ActionFinished { .. } => "result",
                AgentEvent::Finished { .. } => "finished",
            };
            sink.lock().unwrap().push(name);
        }));
        agent.run("t").await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["started", "step", "oracle", "action", "result", "finished"]
        );
        assert_eq!(oracle.requests()[0].max_images, Some(1));
        assert_eq!(oracle.requests()[0].tools.len(), Catalog::AGENT.len());
    }
}
