//! The fixed action catalog: names, descriptions, parameter schemas and validation.

use serde_json::{json, Map, Value};
use thiserror::Error;

use super::types::{ActionInvocation, ToolDescriptor};
use crate::adb::{AdbError, Direction, DEFAULT_SWIPE_DISTANCE};

/// Action errors.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("Arguments for {action} must be a JSON object")]
    InvalidArguments { action: &'static str },
    #[error("Missing required parameter '{param}' for {action}")]
    MissingParameter {
        action: &'static str,
        param: &'static str,
    },
    #[error("Invalid parameter '{param}' for {action}: {reason}")]
    InvalidParameter {
        action: &'static str,
        param: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Device(#[from] AdbError),
    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ActionError {
    /// Whether the call was rejected before reaching the device.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ActionError::Device(_) | ActionError::Encode(_))
    }
}

/// JSON type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Non-negative pixel coordinate.
    Coordinate,
    Integer,
    String,
    /// String restricted to the listed values (compared case-insensitively).
    Enum(&'static [&'static str]),
}

/// One parameter of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub description: &'static str,
}

impl ParamSpec {
    const fn required(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: true,
            description,
        }
    }

    const fn optional(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: false,
            description,
        }
    }

    fn schema(&self) -> Value {
        let mut schema = match self.ty {
            ParamType::Coordinate => json!({"type": "integer", "minimum": 0}),
            ParamType::Integer => json!({"type": "integer"}),
            ParamType::String => json!({"type": "string"}),
            ParamType::Enum(values) => json!({"type": "string", "enum": values}),
        };
        if !self.description.is_empty() {
            schema["description"] = json!(self.description);
        }
        schema
    }
}

const DIRECTIONS: &[&str] = &["up", "down", "left", "right"];

const NO_PARAMS: &[ParamSpec] = &[];

const POINT: &[ParamSpec] = &[
    ParamSpec::required("x", ParamType::Coordinate, "X coordinate in pixels"),
    ParamSpec::required("y", ParamType::Coordinate, "Y coordinate in pixels"),
];

const TYPE_TEXT: &[ParamSpec] = &[ParamSpec::required(
    "text",
    ParamType::String,
    "Text to type",
)];

const PRESS_KEY: &[ParamSpec] = &[ParamSpec::required(
    "key",
    ParamType::String,
    "enter, backspace, delete, tab, space, home, back, menu, search, volume_up, volume_down, power, escape, or a raw KEYCODE_* name",
)];

const SWIPE: &[ParamSpec] = &[
    ParamSpec::required("direction", ParamType::Enum(DIRECTIONS), ""),
    ParamSpec::optional(
        "distance",
        ParamType::Coordinate,
        "Swipe distance in pixels (default 500)",
    ),
    ParamSpec::optional(
        "x",
        ParamType::Integer,
        "Starting X coordinate. Defaults to screen center.",
    ),
    ParamSpec::optional(
        "y",
        ParamType::Integer,
        "Starting Y coordinate. Defaults to screen center.",
    ),
];

const DRAG: &[ParamSpec] = &[
    ParamSpec::required("start_x", ParamType::Coordinate, ""),
    ParamSpec::required("start_y", ParamType::Coordinate, ""),
    ParamSpec::required("end_x", ParamType::Coordinate, ""),
    ParamSpec::required("end_y", ParamType::Coordinate, ""),
];

const LAUNCH_APP: &[ParamSpec] = &[ParamSpec::required(
    "package",
    ParamType::String,
    "e.g. com.android.chrome",
)];

const SHELL: &[ParamSpec] = &[ParamSpec::required(
    "command",
    ParamType::String,
    "Shell command to run on the device",
)];

const DONE: &[ParamSpec] = &[ParamSpec::required(
    "summary",
    ParamType::String,
    "What was accomplished",
)];

/// Every action the crate knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Screenshot,
    GetScreenSize,
    Tap,
    DoubleTap,
    LongPress,
    TypeText,
    PressKey,
    Swipe,
    Drag,
    PressHome,
    PressBack,
    OpenNotifications,
    OpenQuickSettings,
    LaunchApp,
    GetCurrentApp,
    ListInstalledApps,
    Shell,
    GetDeviceInfo,
    Done,
}

impl ActionKind {
    pub const ALL: [ActionKind; 19] = [
        ActionKind::Screenshot,
        ActionKind::GetScreenSize,
        ActionKind::Tap,
        ActionKind::DoubleTap,
        ActionKind::LongPress,
        ActionKind::TypeText,
        ActionKind::PressKey,
        ActionKind::Swipe,
        ActionKind::Drag,
        ActionKind::PressHome,
        ActionKind::PressBack,
        ActionKind::OpenNotifications,
        ActionKind::OpenQuickSettings,
        ActionKind::LaunchApp,
        ActionKind::GetCurrentApp,
        ActionKind::ListInstalledApps,
        ActionKind::Shell,
        ActionKind::GetDeviceInfo,
        ActionKind::Done,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Screenshot => "screenshot",
            ActionKind::GetScreenSize => "get_screen_size",
            ActionKind::Tap => "tap",
            ActionKind::DoubleTap => "double_tap",
            ActionKind::LongPress => "long_press",
            ActionKind::TypeText => "type_text",
            ActionKind::PressKey => "press_key",
            ActionKind::Swipe => "swipe",
            ActionKind::Drag => "drag",
            ActionKind::PressHome => "press_home",
            ActionKind::PressBack => "press_back",
            ActionKind::OpenNotifications => "open_notifications",
            ActionKind::OpenQuickSettings => "open_quick_settings",
            ActionKind::LaunchApp => "launch_app",
            ActionKind::GetCurrentApp => "get_current_app",
            ActionKind::ListInstalledApps => "list_installed_apps",
            ActionKind::Shell => "shell",
            ActionKind::GetDeviceInfo => "get_device_info",
            ActionKind::Done => "done",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActionKind::Screenshot => {
                "Take a screenshot of the Android screen. Call this to see what's on screen."
            }
            ActionKind::GetScreenSize => {
                "Get the physical screen size of the Android device in pixels."
            }
            ActionKind::Tap => "Tap at (x, y) pixel coordinates on the screen.",
            ActionKind::DoubleTap => "Double-tap at (x, y) pixel coordinates on the screen.",
            ActionKind::LongPress => "Long-press at (x, y) pixel coordinates (holds for 1 second).",
            ActionKind::TypeText => {
                "Type text into the currently focused input field. Spaces and special characters are handled automatically."
            }
            ActionKind::PressKey => "Press a key on the Android device.",
            ActionKind::Swipe => {
                "Swipe the screen in a direction (up/down/left/right), starting from the screen center unless x/y are given."
            }
            ActionKind::Drag => "Drag from (start_x, start_y) to (end_x, end_y) with a 300ms duration.",
            ActionKind::PressHome => "Press the Home button.",
            ActionKind::PressBack => "Press the Back button.",
            ActionKind::OpenNotifications => "Open the notification shade.",
            ActionKind::OpenQuickSettings => "Open the quick settings panel.",
            ActionKind::LaunchApp => {
                "Launch an Android app by its package name (e.g. com.android.chrome)."
            }
            ActionKind::GetCurrentApp => {
                "Get the currently visible app (package name and activity)."
            }
            ActionKind::ListInstalledApps => "List third-party installed apps (package names).",
            ActionKind::Shell => {
                "Run an arbitrary ADB shell command and return its output. Use this for anything not covered by the other tools."
            }
            ActionKind::GetDeviceInfo => {
                "Get device information: screen size, Android version, model, and battery level."
            }
            ActionKind::Done => {
                "Call this when the task is complete. Include a summary of what you did."
            }
        }
    }

    pub fn params(&self) -> &'static [ParamSpec] {
        match self {
            ActionKind::Tap | ActionKind::DoubleTap | ActionKind::LongPress => POINT,
            ActionKind::TypeText => TYPE_TEXT,
            ActionKind::PressKey => PRESS_KEY,
            ActionKind::Swipe => SWIPE,
            ActionKind::Drag => DRAG,
            ActionKind::LaunchApp => LAUNCH_APP,
            ActionKind::Shell => SHELL,
            ActionKind::Done => DONE,
            ActionKind::Screenshot
            | ActionKind::GetScreenSize
            | ActionKind::PressHome
            | ActionKind::PressBack
            | ActionKind::OpenNotifications
            | ActionKind::OpenQuickSettings
            | ActionKind::GetCurrentApp
            | ActionKind::ListInstalledApps
            | ActionKind::GetDeviceInfo => NO_PARAMS,
        }
    }

    /// Ends the session when invoked.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionKind::Done)
    }

    /// JSON schema of the parameters.
    pub fn input_schema(&self) -> Value {
        let params = self.params();
        let properties: Map<String, Value> = params
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();
        let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

/// A validated action with typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Screenshot,
    GetScreenSize,
    Tap { x: i32, y: i32 },
    DoubleTap { x: i32, y: i32 },
    LongPress { x: i32, y: i32 },
    TypeText { text: String },
    PressKey { key: String },
    Swipe {
        direction: Direction,
        distance: i32,
        x: Option<i32>,
        y: Option<i32>,
    },
    Drag {
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
    },
    PressHome,
    PressBack,
    OpenNotifications,
    OpenQuickSettings,
    LaunchApp { package: String },
    GetCurrentApp,
    ListInstalledApps,
    Shell { command: String },
    GetDeviceInfo,
    Done { summary: String },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Screenshot => ActionKind::Screenshot,
            Action::GetScreenSize => ActionKind::GetScreenSize,
            Action::Tap { .. } => ActionKind::Tap,
            Action::DoubleTap { .. } => ActionKind::DoubleTap,
            Action::LongPress { .. } => ActionKind::LongPress,
            Action::TypeText { .. } => ActionKind::TypeText,
            Action::PressKey { .. } => ActionKind::PressKey,
            Action::Swipe { .. } => ActionKind::Swipe,
            Action::Drag { .. } => ActionKind::Drag,
            Action::PressHome => ActionKind::PressHome,
            Action::PressBack => ActionKind::PressBack,
            Action::OpenNotifications => ActionKind::OpenNotifications,
            Action::OpenQuickSettings => ActionKind::OpenQuickSettings,
            Action::LaunchApp { .. } => ActionKind::LaunchApp,
            Action::GetCurrentApp => ActionKind::GetCurrentApp,
            Action::ListInstalledApps => ActionKind::ListInstalledApps,
            Action::Shell { .. } => ActionKind::Shell,
            Action::GetDeviceInfo => ActionKind::GetDeviceInfo,
            Action::Done { .. } => ActionKind::Done,
        }
    }
}

/// Type-checked view over invocation arguments.
struct Args<'a> {
    kind: ActionKind,
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    fn invalid(&self, param: &'static str, reason: impl Into<String>) -> ActionError {
        ActionError::InvalidParameter {
            action: self.kind.name(),
            param,
            reason: reason.into(),
        }
    }

    /// Check every declared parameter; undeclared extras are ignored.
    fn check(&self) -> Result<(), ActionError> {
        for spec in self.kind.params() {
            match self.map.get(spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(ActionError::MissingParameter {
                        action: self.kind.name(),
                        param: spec.name,
                    })
                }
                None | Some(Value::Null) => {}
                Some(value) => self.check_value(spec, value)?,
            }
        }
        Ok(())
    }

    fn check_value(&self, spec: &'static ParamSpec, value: &Value) -> Result<(), ActionError> {
        match spec.ty {
            ParamType::Coordinate => {
                let n = self.to_i32(spec.name, value)?;
                if n < 0 {
                    return Err(self.invalid(spec.name, format!("must be >= 0, got {n}")));
                }
            }
            ParamType::Integer => {
                self.to_i32(spec.name, value)?;
            }
            ParamType::String => {
                if !value.is_string() {
                    return Err(self.invalid(spec.name, format!("expected a string, got {value}")));
                }
            }
            ParamType::Enum(allowed) => {
                let s = value
                    .as_str()
                    .ok_or_else(|| self.invalid(spec.name, format!("expected a string, got {value}")))?;
                if !allowed.iter().any(|a| a.eq_ignore_ascii_case(s.trim())) {
                    return Err(self.invalid(
                        spec.name,
                        format!("'{s}' is not one of {}", allowed.join("/")),
                    ));
                }
            }
        }
        Ok(())
    }

    /// JSON numbers are truncated to whole pixels.
    fn to_i32(&self, param: &'static str, value: &Value) -> Result<i32, ActionError> {
        let n = value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| self.invalid(param, format!("expected a number, got {value}")))?;
        i32::try_from(n).map_err(|_| self.invalid(param, format!("{n} is out of range")))
    }

    fn int(&self, name: &'static str) -> Result<i32, ActionError> {
        let value = self.map.get(name).ok_or(ActionError::MissingParameter {
            action: self.kind.name(),
            param: name,
        })?;
        self.to_i32(name, value)
    }

    fn opt_int(&self, name: &'static str) -> Result<Option<i32>, ActionError> {
        match self.map.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.to_i32(name, value).map(Some),
        }
    }

    fn string(&self, name: &'static str) -> Result<String, ActionError> {
        self.map
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ActionError::MissingParameter {
                action: self.kind.name(),
                param: name,
            })
    }

    fn build(&self) -> Result<Action, ActionError> {
        let action = match self.kind {
            ActionKind::Screenshot => Action::Screenshot,
            ActionKind::GetScreenSize => Action::GetScreenSize,
            ActionKind::Tap => Action::Tap {
                x: self.int("x")?,
                y: self.int("y")?,
            },
            ActionKind::DoubleTap => Action::DoubleTap {
                x: self.int("x")?,
                y: self.int("y")?,
            },
            ActionKind::LongPress => Action::LongPress {
                x: self.int("x")?,
                y: self.int("y")?,
            },
            ActionKind::TypeText => Action::TypeText {
                text: self.string("text")?,
            },
            ActionKind::PressKey => Action::PressKey {
                key: self.string("key")?,
            },
            ActionKind::Swipe => Action::Swipe {
                direction: self
                    .string("direction")?
                    .parse()
                    .map_err(|e: AdbError| self.invalid("direction", e.to_string()))?,
                distance: self.opt_int("distance")?.unwrap_or(DEFAULT_SWIPE_DISTANCE),
                x: self.opt_int("x")?,
                y: self.opt_int("y")?,
            },
            ActionKind::Drag => Action::Drag {
                start_x: self.int("start_x")?,
                start_y: self.int("start_y")?,
                end_x: self.int("end_x")?,
                end_y: self.int("end_y")?,
            },
            ActionKind::PressHome => Action::PressHome,
            ActionKind::PressBack => Action::PressBack,
            ActionKind::OpenNotifications => Action::OpenNotifications,
            ActionKind::OpenQuickSettings => Action::OpenQuickSettings,
            ActionKind::LaunchApp => Action::LaunchApp {
                package: self.string("package")?,
            },
            ActionKind::GetCurrentApp => Action::GetCurrentApp,
            ActionKind::ListInstalledApps => Action::ListInstalledApps,
            ActionKind::Shell => Action::Shell {
                command: self.string("command")?,
            },
            ActionKind::GetDeviceInfo => Action::GetDeviceInfo,
            ActionKind::Done => Action::Done {
                summary: self.string("summary")?,
            },
        };
        Ok(action)
    }
}

/// A fixed subset of [`ActionKind`]s offered to one consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog {
    kinds: &'static [ActionKind],
}

impl Catalog {
    /// The oracle's default menu.
    pub const AGENT: Catalog = Catalog {
        kinds: &[
            ActionKind::Screenshot,
            ActionKind::Tap,
            ActionKind::TypeText,
            ActionKind::Swipe,
            ActionKind::PressKey,
            ActionKind::LaunchApp,
            ActionKind::LongPress,
            ActionKind::Done,
        ],
    };

    /// Every device action; what an external tool server exposes.
    pub const DEVICE_TOOLS: Catalog = Catalog {
        kinds: &[
            ActionKind::Screenshot,
            ActionKind::GetScreenSize,
            ActionKind::Tap,
            ActionKind::DoubleTap,
            ActionKind::LongPress,
            ActionKind::TypeText,
            ActionKind::PressKey,
            ActionKind::Swipe,
            ActionKind::Drag,
            ActionKind::PressHome,
            ActionKind::PressBack,
            ActionKind::OpenNotifications,
            ActionKind::OpenQuickSettings,
            ActionKind::LaunchApp,
            ActionKind::GetCurrentApp,
            ActionKind::ListInstalledApps,
            ActionKind::Shell,
            ActionKind::GetDeviceInfo,
        ],
    };

    /// Device actions plus `done`.
    pub const FULL: Catalog = Catalog {
        kinds: &ActionKind::ALL,
    };

    pub fn kinds(&self) -> &'static [ActionKind] {
        self.kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<ActionKind> {
        self.kinds.iter().copied().find(|kind| kind.name() == name)
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.kinds.iter().map(ActionKind::descriptor).collect()
    }

    /// Resolve and type-check an invocation against this catalog.
    pub fn validate(&self, invocation: &ActionInvocation) -> Result<Action, ActionError> {
        let kind = self
            .get(&invocation.name)
            .ok_or_else(|| ActionError::UnknownAction(invocation.name.clone()))?;
        let args = Args {
            kind,
            map: &invocation.arguments,
        };
        args.check()?;
        args.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(name: &str, args: Value) -> ActionInvocation {
        ActionInvocation::from_value("toolu_test", name, args).unwrap()
    }

    #[test]
    fn test_agent_catalog_entries() {
        let names: Vec<&str> = Catalog::AGENT.kinds().iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            vec![
                "screenshot",
                "tap",
                "type_text",
                "swipe",
                "press_key",
                "launch_app",
                "long_press",
                "done"
            ]
        );
    }

    #[test]
    fn test_device_tools_exclude_done() {
        assert!(Catalog::DEVICE_TOOLS.get("done").is_none());
        assert_eq!(Catalog::DEVICE_TOOLS.len() + 1, Catalog::FULL.len());
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_schema_shape() {
        let schema = ActionKind::Swipe.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["direction"]));
        assert_eq!(
            schema["properties"]["direction"]["enum"],
            json!(["up", "down", "left", "right"])
        );
        assert_eq!(schema["properties"]["distance"]["type"], "integer");
        assert_eq!(schema["properties"]["distance"]["minimum"], 0);

        let schema = ActionKind::Screenshot.input_schema();
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));

        let schema = ActionKind::Tap.input_schema();
        assert_eq!(schema["properties"]["x"]["minimum"], 0);
    }

    #[test]
    fn test_validate_tap() {
        let action = Catalog::AGENT
            .validate(&invocation("tap", json!({"x": 100, "y": 200.7})))
            .unwrap();
        assert_eq!(action, Action::Tap { x: 100, y: 200 });
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = Catalog::AGENT
            .validate(&invocation("fly", json!({})))
            .unwrap_err();
        assert!(matches!(err, ActionError::UnknownAction(ref name) if name == "fly"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_action_outside_catalog_rejected() {
        let err = Catalog::AGENT
            .validate(&invocation("shell", json!({"command": "reboot"})))
            .unwrap_err();
        assert!(matches!(err, ActionError::UnknownAction(_)));

        assert!(Catalog::DEVICE_TOOLS
            .validate(&invocation("shell", json!({"command": "ls"})))
            .is_ok());
    }

    #[test]
    fn test_missing_required_parameter() {
        let err = Catalog::AGENT
            .validate(&invocation("tap", json!({"x": 1})))
            .unwrap_err();
        assert!(matches!(
            err,
            ActionError::MissingParameter { action: "tap", param: "y" }
        ));

        let err = Catalog::AGENT
            .validate(&invocation("done", json!({"summary": null})))
            .unwrap_err();
        assert!(matches!(err, ActionError::MissingParameter { param: "summary", .. }));
    }

    #[test]
    fn test_wrong_types_rejected() {
        let err = Catalog::AGENT
            .validate(&invocation("tap", json!({"x": "10", "y": 2})))
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { param: "x", .. }));

        let err = Catalog::AGENT
            .validate(&invocation("type_text", json!({"text": 5})))
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { param: "text", .. }));

        let err = Catalog::AGENT
            .validate(&invocation("tap", json!({"x": -5, "y": 2})))
            .unwrap_err();
        assert!(err.to_string().contains(">= 0"));
    }

    #[test]
    fn test_swipe_direction_validation() {
        let err = Catalog::AGENT
            .validate(&invocation("swipe", json!({"direction": "diagonal"})))
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { param: "direction", .. }));

        let action = Catalog::AGENT
            .validate(&invocation("swipe", json!({"direction": "UP"})))
            .unwrap();
        assert_eq!(
            action,
            Action::Swipe {
                direction: Direction::Up,
                distance: DEFAULT_SWIPE_DISTANCE,
                x: None,
                y: None
            }
        );
    }

    #[test]
    fn test_swipe_optional_parameters() {
        let action = Catalog::DEVICE_TOOLS
            .validate(&invocation(
                "swipe",
                json!({"direction": "left", "distance": 300, "x": 900, "y": 1000}),
            ))
            .unwrap();
        assert_eq!(
            action,
            Action::Swipe {
                direction: Direction::Left,
                distance: 300,
                x: Some(900),
                y: Some(1000)
            }
        );
    }

    #[test]
    fn test_negative_swipe_distance_rejected() {
        let err = Catalog::AGENT
            .validate(&invocation("swipe", json!({"direction": "up", "distance": -50})))
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidParameter { param: "distance", .. }));
    }

    #[test]
    fn test_done_is_terminal() {
        let action = Catalog::AGENT
            .validate(&invocation("done", json!({"summary": "Opened Chrome"})))
            .unwrap();
        assert!(action.kind().is_terminal());
        assert!(!ActionKind::Tap.is_terminal());
    }

    #[test]
    fn test_extra_arguments_ignored() {
        let action = Catalog::AGENT
            .validate(&invocation("screenshot", json!({"quality": "high"})))
            .unwrap();
        assert_eq!(action, Action::Screenshot);
    }
}
