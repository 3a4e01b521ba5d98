//! Device control commands for Android automation.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::bridge::{Bridge, BridgeOutput};
use super::connection::{check_connection, AdbError};
use super::info::{
    parse_battery, parse_packages, parse_resumed_activity, parse_screen_size, DeviceReport,
    ScreenReport, ScreenSize,
};
use super::input::{escape_input_text, resolve_key};
use super::screenshot::{Screenshot, SCREENSHOT_TIMEOUT};

/// Default timeout for `adb shell` commands.
pub const SHELL_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for the free-form `shell` tool.
pub const RAW_SHELL_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for `dumpsys activity`.
pub const ACTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Gap between the two taps of a double tap.
pub const DOUBLE_TAP_INTERVAL: Duration = Duration::from_millis(100);
/// Hold time of a long press.
pub const LONG_PRESS_MS: u32 = 1000;
/// Duration of swipes and drags.
pub const SWIPE_MS: u32 = 300;
/// Swipe distance when none is given.
pub const DEFAULT_SWIPE_DISTANCE: i32 = 500;

/// Swipe direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Lowercase name as used in tool arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// The opposite direction on the same axis.
    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

impl FromStr for Direction {
    type Err = AdbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            _ => Err(AdbError::Validation(format!(
                "Invalid direction: {s}. Use up/down/left/right."
            ))),
        }
    }
}

/// End point of a swipe starting at `(x, y)`.
///
/// # Returns
/// The end point, or a validation error when it does not fit in `i32`.
pub fn swipe_endpoint(
    direction: Direction,
    x: i32,
    y: i32,
    distance: i32,
) -> Result<(i32, i32), AdbError> {
    let end = match direction {
        Direction::Up => y.checked_sub(distance).map(|ey| (x, ey)),
        Direction::Down => y.checked_add(distance).map(|ey| (x, ey)),
        Direction::Left => x.checked_sub(distance).map(|ex| (ex, y)),
        Direction::Right => x.checked_add(distance).map(|ex| (ex, y)),
    };
    end.ok_or_else(|| {
        AdbError::Validation(format!(
            "swipe end point out of range: {} {distance}px from ({x}, {y})",
            direction.as_str()
        ))
    })
}

/// Issues device commands through a [`Bridge`].
///
/// Every public command re-checks the connection first, so a device that
/// disappears mid-session is reported on the next call.
#[derive(Clone)]
pub struct AdbDevice {
    bridge: Arc<dyn Bridge>,
    serial: Option<String>,
    screen: Option<ScreenSize>,
}

impl AdbDevice {
    /// Create a device handle.
    ///
    /// # Arguments
    /// * `bridge` - Transport used for every command.
    /// * `serial` - Only this device is accepted when set.
    pub fn new(bridge: Arc<dyn Bridge>, serial: Option<String>) -> Self {
        Self {
            bridge,
            serial,
            screen: None,
        }
    }

    /// Use a known screen geometry instead of querying it for swipe defaults.
    pub fn with_screen_size(mut self, screen: ScreenSize) -> Self {
        self.screen = Some(screen);
        self
    }

    /// Record the screen geometry used for swipe defaults and screenshot sizes.
    ///
    /// # Arguments
    /// * `screen` - Size read at session start, or the assumed default.
    pub fn set_screen_size(&mut self, screen: ScreenSize) {
        self.screen = Some(screen);
    }

    /// Geometry set with [`AdbDevice::set_screen_size`], if any.
    pub fn known_screen_size(&self) -> Option<ScreenSize> {
        self.screen
    }

    /// Verify exactly one usable device is attached.
    ///
    /// # Returns
    /// The serial of the selected device.
    pub async fn check_connection(&self) -> Result<String, AdbError> {
        check_connection(self.bridge.as_ref(), self.serial.as_deref()).await
    }

    async fn run(&self, args: &[&str], timeout: Duration) -> Result<BridgeOutput, AdbError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.bridge.run(&args, timeout).await
    }

    async fn shell(&self, args: &[&str], timeout: Duration) -> Result<String, AdbError> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("shell");
        full.extend_from_slice(args);
        Ok(self.run(&full, timeout).await?.stdout_text())
    }

    /// Capture the screen as image bytes.
    ///
    /// # Returns
    /// The screenshot, or `AdbError::Capture` when `screencap` fails or
    /// returns fewer than 8 bytes.
    pub async fn screenshot(&self) -> Result<Screenshot, AdbError> {
        self.check_connection().await?;
        let output = self
            .run(&["exec-out", "screencap", "-p"], SCREENSHOT_TIMEOUT)
            .await?;
        let known = self.screen.unwrap_or(DEFAULT_SCREEN_SIZE);
        Screenshot::from_capture(output, known.width, known.height)
    }

    /// Physical screen size in pixels.
    pub async fn get_screen_size(&self) -> Result<ScreenSize, AdbError> {
        self.check_connection().await?;
        self.query_screen_size().await
    }

    async fn query_screen_size(&self) -> Result<ScreenSize, AdbError> {
        let output = self.shell(&["wm", "size"], SHELL_TIMEOUT).await?;
        parse_screen_size(&output)
    }

    /// Tap at `(x, y)`.
    ///
    /// # Arguments
    /// * `x` - X coordinate in pixels
    /// * `y` - Y coordinate in pixels
    ///
    /// Coordinates are not checked against the screen bounds.
    pub async fn tap(&self, x: i32, y: i32) -> Result<String, AdbError> {
        self.check_connection().await?;
        self.input_tap(x, y).await?;
        Ok(format!("Tapped ({x}, {y})"))
    }

    async fn input_tap(&self, x: i32, y: i32) -> Result<(), AdbError> {
        let (x, y) = (x.to_string(), y.to_string());
        self.shell(&["input", "tap", &x, &y], SHELL_TIMEOUT).await?;
        Ok(())
    }

    /// Two discrete taps separated by [`DOUBLE_TAP_INTERVAL`].
    pub async fn double_tap(&self, x: i32, y: i32) -> Result<String, AdbError> {
        self.check_connection().await?;
        self.input_tap(x, y).await?;
        tokio::time::sleep(DOUBLE_TAP_INTERVAL).await;
        self.input_tap(x, y).await?;
        Ok(format!("Double-tapped ({x}, {y})"))
    }

    /// Zero-distance swipe held for [`LONG_PRESS_MS`].
    pub async fn long_press(&self, x: i32, y: i32) -> Result<String, AdbError> {
        self.check_connection().await?;
        self.input_swipe((x, y), (x, y), LONG_PRESS_MS).await?;
        Ok(format!("Long-pressed ({x}, {y})"))
    }

    async fn input_swipe(
        &self,
        start: (i32, i32),
        end: (i32, i32),
        duration_ms: u32,
    ) -> Result<(), AdbError> {
        let args = [
            start.0.to_string(),
            start.1.to_string(),
            end.0.to_string(),
            end.1.to_string(),
            duration_ms.to_string(),
        ];
        self.shell(
            &["input", "swipe", &args[0], &args[1], &args[2], &args[3], &args[4]],
            SHELL_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    /// Type into the focused input field.
    ///
    /// # Arguments
    /// * `text` - Literal text; spaces and shell metacharacters are escaped.
    pub async fn type_text(&self, text: &str) -> Result<String, AdbError> {
        self.check_connection().await?;
        let escaped = escape_input_text(text);
        self.shell(&["input", "text", &escaped], SHELL_TIMEOUT).await?;
        Ok(format!("Typed: {text}"))
    }

    /// Swipe `distance` pixels in `direction`.
    ///
    /// # Arguments
    /// * `direction` - Axis and sign of the movement
    /// * `distance` - Length in pixels
    /// * `x`, `y` - Start point; a missing (or negative) value defaults to the
    ///   screen centre, taken from the known geometry or queried from the device.
    ///
    /// # Returns
    /// A description of the swipe, or `AdbError::Validation` when the end
    /// point would not fit in `i32`.
    pub async fn swipe(
        &self,
        direction: Direction,
        distance: i32,
        x: Option<i32>,
        y: Option<i32>,
    ) -> Result<String, AdbError> {
        self.check_connection().await?;

        let x = x.filter(|v| *v >= 0);
        let y = y.filter(|v| *v >= 0);
        let (x, y) = match (x, y) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                let screen = match self.screen {
                    Some(screen) => screen,
                    None => self.query_screen_size().await?,
                };
                let (cx, cy) = screen.center();
                (x.unwrap_or(cx), y.unwrap_or(cy))
            }
        };

        let (ex, ey) = swipe_endpoint(direction, x, y, distance)?;
        self.input_swipe((x, y), (ex, ey), SWIPE_MS).await?;
        Ok(format!(
            "Swiped {} from ({x}, {y}) to ({ex}, {ey})",
            direction.as_str()
        ))
    }

    /// Point-to-point swipe.
    pub async fn drag(
        &self,
        start_x: i32,
        start_y: i32,
        end_x: i32,
        end_y: i32,
    ) -> Result<String, AdbError> {
        self.check_connection().await?;
        self.input_swipe((start_x, start_y), (end_x, end_y), SWIPE_MS)
            .await?;
        Ok(format!(
            "Dragged from ({start_x}, {start_y}) to ({end_x}, {end_y})"
        ))
    }

    /// Press a key by symbolic name or raw key identifier.
    ///
    /// # Arguments
    /// * `key` - A name such as `enter` (any case), or a raw `KEYCODE_*` id
    ///   which is passed through unchanged.
    pub async fn press_key(&self, key: &str) -> Result<String, AdbError> {
        self.check_connection().await?;
        let code = resolve_key(key);
        self.shell(&["input", "keyevent", &code], SHELL_TIMEOUT)
            .await?;
        Ok(format!("Pressed {key}"))
    }

    /// Go to the home screen.
    pub async fn press_home(&self) -> Result<String, AdbError> {
        self.check_connection().await?;
        self.shell(&["input", "keyevent", "KEYCODE_HOME"], SHELL_TIMEOUT)
            .await?;
        Ok("Pressed Home".to_string())
    }

    /// Press the system back button.
    pub async fn press_back(&self) -> Result<String, AdbError> {
        self.check_connection().await?;
        self.shell(&["input", "keyevent", "KEYCODE_BACK"], SHELL_TIMEOUT)
            .await?;
        Ok("Pressed Back".to_string())
    }

    /// Pull down the notification shade.
    pub async fn open_notifications(&self) -> Result<String, AdbError> {
        self.check_connection().await?;
        self.shell(&["cmd", "statusbar", "expand-notifications"], SHELL_TIMEOUT)
            .await?;
        Ok("Opened notifications".to_string())
    }

    /// Pull down the quick settings panel.
    pub async fn open_quick_settings(&self) -> Result<String, AdbError> {
        self.check_connection().await?;
        self.shell(&["cmd", "statusbar", "expand-settings"], SHELL_TIMEOUT)
            .await?;
        Ok("Opened quick settings".to_string())
    }

    /// Launch an app through its launcher intent.
    ///
    /// # Arguments
    /// * `package` - Package id, e.g. `com.android.chrome`
    ///
    /// # Returns
    /// `AdbError::Launch` when the package has no launcher activity.
    pub async fn launch_app(&self, package: &str) -> Result<String, AdbError> {
        self.check_connection().await?;
        let output = self
            .shell(
                &[
                    "monkey",
                    "-p",
                    package,
                    "-c",
                    "android.intent.category.LAUNCHER",
                    "1",
                ],
                SHELL_TIMEOUT,
            )
            .await?;

        if output.contains("No activities found") {
            return Err(AdbError::Launch {
                package: package.to_string(),
            });
        }
        Ok(format!("Launched {package}"))
    }

    /// The resumed activity line from the activity manager.
    pub async fn get_current_app(&self) -> Result<String, AdbError> {
        self.check_connection().await?;
        let output = self
            .shell(&["dumpsys", "activity", "activities"], ACTIVITY_TIMEOUT)
            .await?;
        parse_resumed_activity(&output)
    }

    /// Third-party package ids, sorted.
    pub async fn list_installed_apps(&self) -> Result<Vec<String>, AdbError> {
        self.check_connection().await?;
        let output = self
            .shell(&["pm", "list", "packages", "-3"], SHELL_TIMEOUT)
            .await?;
        Ok(parse_packages(&output))
    }

    /// Run an arbitrary shell command and return its output verbatim.
    pub async fn shell_command(&self, command: &str) -> Result<String, AdbError> {
        self.check_connection().await?;
        self.shell(&[command], RAW_SHELL_TIMEOUT).await
    }

    /// Screen, OS, model and battery summary.
    ///
    /// A failed screen query is reported inside the result; an unparseable
    /// battery level is an `AdbError::Parse`.
    pub async fn get_device_info(&self) -> Result<DeviceReport, AdbError> {
        self.check_connection().await?;

        let screen = match self.query_screen_size().await {
            Ok(size) => ScreenReport::Size(size),
            Err(e) => ScreenReport::Error {
                error: e.to_string(),
            },
        };
        let android_version = self
            .shell(&["getprop", "ro.build.version.release"], SHELL_TIMEOUT)
            .await?;
        let model = self
            .shell(&["getprop", "ro.product.model"], SHELL_TIMEOUT)
            .await?;
        let manufacturer = self
            .shell(&["getprop", "ro.product.manufacturer"], SHELL_TIMEOUT)
            .await?;
        let battery = parse_battery(&self.shell(&["dumpsys", "battery"], SHELL_TIMEOUT).await?)?;

        Ok(DeviceReport {
            screen,
            android_version,
            model,
            manufacturer,
            battery,
        })
    }
}

/// Screen size assumed when the device does not report one.
pub const DEFAULT_SCREEN_SIZE: ScreenSize = ScreenSize::new(1080, 2400);
