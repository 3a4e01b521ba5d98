//! Dispatch of validated actions to the device.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, warn};

use super::catalog::{Action, ActionError, Catalog};
use super::types::{ActionInvocation, ActionResult, ToolDescriptor, ToolOutput};
use crate::adb::AdbDevice;

/// Runs actions against one device.
#[derive(Clone)]
pub struct ActionHandler {
    device: AdbDevice,
}

impl ActionHandler {
    /// Create a handler.
    ///
    /// # Arguments
    /// * `device` - Device every action is sent to.
    pub fn new(device: AdbDevice) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &AdbDevice {
        &self.device
    }

    /// Mutable access, used to record the screen size found at session start.
    pub fn device_mut(&mut self) -> &mut AdbDevice {
        &mut self.device
    }

    /// Execute a validated action.
    ///
    /// Query actions return their result as JSON text. `done` touches nothing
    /// and echoes its summary.
    pub async fn execute(&self, action: &Action) -> Result<ToolOutput, ActionError> {
        let device = &self.device;
        let output = match action {
            Action::Screenshot => ToolOutput::Image(device.screenshot().await?),
            Action::GetScreenSize => {
                ToolOutput::Text(serde_json::to_string(&device.get_screen_size().await?)?)
            }
            Action::Tap { x, y } => ToolOutput::Text(device.tap(*x, *y).await?),
            Action::DoubleTap { x, y } => ToolOutput::Text(device.double_tap(*x, *y).await?),
            Action::LongPress { x, y } => ToolOutput::Text(device.long_press(*x, *y).await?),
            Action::TypeText { text } => ToolOutput::Text(device.type_text(text).await?),
            Action::PressKey { key } => ToolOutput::Text(device.press_key(key).await?),
            Action::Swipe {
                direction,
                distance,
                x,
                y,
            } => ToolOutput::Text(device.swipe(*direction, *distance, *x, *y).await?),
            Action::Drag {
                start_x,
                start_y,
                end_x,
                end_y,
            } => ToolOutput::Text(device.drag(*start_x, *start_y, *end_x, *end_y).await?),
            Action::PressHome => ToolOutput::Text(device.press_home().await?),
            Action::PressBack => ToolOutput::Text(device.press_back().await?),
            Action::OpenNotifications => ToolOutput::Text(device.open_notifications().await?),
            Action::OpenQuickSettings => ToolOutput::Text(device.open_quick_settings().await?),
            Action::LaunchApp { package } => ToolOutput::Text(device.launch_app(package).await?),
            Action::GetCurrentApp => ToolOutput::Text(device.get_current_app().await?),
            Action::ListInstalledApps => {
                ToolOutput::Text(serde_json::to_string(&device.list_installed_apps().await?)?)
            }
            Action::Shell { command } => ToolOutput::Text(device.shell_command(command).await?),
            Action::GetDeviceInfo => {
                ToolOutput::Text(serde_json::to_string_pretty(&device.get_device_info().await?)?)
            }
            Action::Done { summary } => ToolOutput::Text(summary.clone()),
        };
        Ok(output)
    }

    /// Validate an invocation against `catalog` and run it.
    ///
    /// # Arguments
    /// * `catalog` - Actions the caller was offered; anything else is rejected.
    /// * `invocation` - Name and arguments chosen by the oracle.
    ///
    /// # Returns
    /// Never fails: validation and device errors become an error result
    /// paired with the invocation.
    pub async fn invoke(&self, catalog: &Catalog, invocation: &ActionInvocation) -> ActionResult {
        let started = Instant::now();
        let outcome = match catalog.validate(invocation) {
            Ok(action) => self.execute(&action).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(output) => {
                debug!(
                    action = %invocation.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "{}",
                    output.summary()
                );
                ActionResult::success(invocation, output)
            }
            Err(e) => {
                warn!(
                    action = %invocation.name,
                    validation = e.is_validation(),
                    "Action failed: {}",
                    e
                );
                ActionResult::failure(invocation, e.to_string())
            }
        }
    }
}

/// The device tool catalog, ready to be wrapped by an external tool server.
#[derive(Clone)]
pub struct ToolRegistry {
    handler: ActionHandler,
}

impl ToolRegistry {
    /// Create a registry serving every device tool.
    pub fn new(device: AdbDevice) -> Self {
        Self {
            handler: ActionHandler::new(device),
        }
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::DEVICE_TOOLS
    }

    /// Name, description and input schema of every tool.
    pub fn tools(&self) -> Vec<ToolDescriptor> {
        Catalog::DEVICE_TOOLS.descriptors()
    }

    /// Run one tool call.
    ///
    /// # Arguments
    /// * `name` - Tool name from [`ToolRegistry::tools`]
    /// * `arguments` - A JSON object, or null for tools without parameters
    ///
    /// # Returns
    /// The text or image payload, or the validation or device error.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<ToolOutput, ActionError> {
        let Some(kind) = Catalog::DEVICE_TOOLS.get(name) else {
            return Err(ActionError::UnknownAction(name.to_string()));
        };
        let id = uuid::Uuid::new_v4().to_string();
        let invocation = ActionInvocation::from_value(id, name, arguments).ok_or(
            ActionError::InvalidArguments {
                action: kind.name(),
            },
        )?;
        let action = Catalog::DEVICE_TOOLS.validate(&invocation)?;
        self.handler.execute(&action).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adb::BridgeOutput;
    use crate::testing::{png_bytes, ScriptedBridge};
    use serde_json::json;
    use std::sync::Arc;

    fn handler(bridge: &Arc<ScriptedBridge>) -> ActionHandler {
        ActionHandler::new(AdbDevice::new(bridge.clone(), None))
    }

    fn invocation(name: &str, args: Value) -> ActionInvocation {
        ActionInvocation::from_value("toolu_1", name, args).unwrap()
    }

    #[tokio::test]
    async fn test_press_key_case_insensitive() {
        let bridge = Arc::new(ScriptedBridge::with_device());
        let handler = handler(&bridge);
        handler
            .execute(&Action::PressKey { key: "ENTER".into() })
            .await
            .unwrap();
        handler
            .execute(&Action::PressKey { key: "enter".into() })
            .await
            .unwrap();
        handler
            .execute(&Action::PressKey {
                key: "KEYCODE_99".into(),
            })
            .await
            .unwrap();

        let keyevent = |code| vec!["shell", "input", "keyevent", code];
        assert_eq!(
            bridge.device_calls(),
            vec![keyevent("66"), keyevent("66"), keyevent("KEYCODE_99")]
        );
    }

    #[tokio::test]
    async fn test_invalid_invocation_never_reaches_bridge() {
        let bridge = Arc::new(ScriptedBridge::with_device());
        let result = handler(&bridge)
            .invoke(&Catalog::AGENT, &invocation("tap", json!({"x": 1})))
            .await;

        assert!(result.is_error);
        assert_eq!(result.invocation_id, "toolu_1");
        assert!(bridge.calls().is_empty());
    }

    #[tokio::test]
    async fn test_device_failure_becomes_error_result() {
        let bridge = Arc::new(ScriptedBridge::without_device());
        let result = handler(&bridge)
            .invoke(&Catalog::AGENT, &invocation("tap", json!({"x": 1, "y": 2})))
            .await;

        assert!(result.is_error);
        match result.output {
            ToolOutput::Text(text) => assert!(text.contains("No ADB devices")),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_done_does_not_touch_device() {
        let bridge = Arc::new(ScriptedBridge::with_device());
        let result = handler(&bridge)
            .invoke(
                &Catalog::AGENT,
                &invocation("done", json!({"summary": "All set"})),
            )
            .await;

        assert!(!result.is_error);
        assert_eq!(result.output.summary(), "All set");
        assert!(bridge.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_installed_apps_as_json() {
        let bridge = Arc::new(ScriptedBridge::with_device());
        bridge.respond(
            &["shell", "pm", "list"],
            BridgeOutput::ok("package:com.whatsapp\npackage:com.android.chrome\n"),
        );
        let output = handler(&bridge)
            .execute(&Action::ListInstalledApps)
            .await
            .unwrap();
        match output {
            ToolOutput::Text(text) => {
                let apps: Vec<String> = serde_json::from_str(&text).unwrap();
                assert_eq!(apps, vec!["com.android.chrome", "com.whatsapp"]);
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_registry_tools_exclude_done() {
        let bridge = Arc::new(ScriptedBridge::with_device());
        let registry = ToolRegistry::new(AdbDevice::new(bridge.clone(), None));
        let tools = registry.tools();
        assert_eq!(tools.len(), 18);
        assert!(tools.iter().all(|t| t.name != "done"));

        let err = registry
            .call("done", json!({"summary": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::UnknownAction(_)));
    }

    #[tokio::test]
    async fn test_registry_call_returns_image() {
        let bridge = Arc::new(ScriptedBridge::with_device());
        bridge.respond(
            &["exec-out", "screencap"],
            BridgeOutput::ok(png_bytes(4, 8)),
        );
        let registry = ToolRegistry::new(AdbDevice::new(bridge.clone(), None));
        match registry.call("screenshot", Value::Null).await.unwrap() {
            ToolOutput::Image(shot) => assert_eq!((shot.width, shot.height), (4, 8)),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_registry_rejects_non_object_arguments() {
        let bridge = Arc::new(ScriptedBridge::with_device());
        let registry = ToolRegistry::new(AdbDevice::new(bridge.clone(), None));
        let err = registry.call("tap", json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, ActionError::InvalidArguments { action: "tap" }));
        assert!(bridge.calls().is_empty());
    }
}
