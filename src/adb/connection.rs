//! ADB configuration, error types and device enumeration.

use std::env;
use std::time::Duration;
use thiserror::Error;

use super::bridge::Bridge;

/// Timeout for `adb devices`.
pub const DEVICES_TIMEOUT: Duration = Duration::from_secs(5);

/// Why no usable device could be selected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error(
        "No ADB devices found. Connect a device with USB debugging enabled and run 'adb devices' to verify."
    )]
    NoDevice,
    #[error("Device {0} is offline.")]
    Offline(String),
    #[error("Device with serial '{serial}' not found. Available devices:\n{available}")]
    SerialNotFound { serial: String, available: String },
    #[error("More than one device is attached ({0}). Set ADB_SERIAL to pick one.")]
    MultipleDevices(String),
    #[error("No usable ADB device found. Output:\n{0}")]
    NoUsableDevice(String),
}

/// Errors raised by device commands.
#[derive(Error, Debug)]
pub enum AdbError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Screenshot failed: {0}")]
    Capture(String),
    #[error("Invalid argument: {0}")]
    Validation(String),
    #[error(
        "Could not launch '{package}': no launcher activity found. Check the package name with list_installed_apps."
    )]
    Launch { package: String },
    #[error("Could not parse {what} from: {}", preview(.raw))]
    Parse { what: &'static str, raw: String },
    #[error("adb {command} timed out after {secs}s")]
    Timeout { command: String, secs: u64 },
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

const PREVIEW_CHARS: usize = 400;

fn preview(raw: &str) -> String {
    if raw.chars().count() <= PREVIEW_CHARS {
        return raw.to_string();
    }
    let head: String = raw.chars().take(PREVIEW_CHARS).collect();
    format!("{}... ({} bytes total)", head, raw.len())
}

/// Bridge executable and target device, resolved once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdbConfig {
    pub adb_path: String,
    /// `None` means "any single attached device".
    pub serial: Option<String>,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self::new(default_adb_path(), None)
    }
}

impl AdbConfig {
    pub fn new(adb_path: impl Into<String>, serial: Option<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial: serial.filter(|s| !s.trim().is_empty()),
        }
    }

    /// Resolve from `ADB_PATH` and `ADB_SERIAL`.
    pub fn from_env() -> Self {
        let adb_path = env::var("ADB_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(default_adb_path);
        Self::new(adb_path, env::var("ADB_SERIAL").ok())
    }

    pub fn with_serial(mut self, serial: Option<String>) -> Self {
        self.serial = serial.filter(|s| !s.trim().is_empty());
        self
    }

    /// Full argument list (device selector + subcommand args).
    pub fn command_args(&self, args: &[String]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(serial) = &self.serial {
            full.push("-s".to_string());
            full.push(serial.clone());
        }
        full.extend(args.iter().cloned());
        full
    }
}

/// `adb` from `PATH` if it can be found, otherwise the bare name.
pub fn default_adb_path() -> String {
    which::which("adb")
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "adb".to_string())
}

/// One row of `adb devices`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub serial: String,
    pub state: String,
}

/// Parse `adb devices` output, skipping the header line.
pub fn parse_device_list(output: &str) -> Vec<DeviceEntry> {
    output
        .trim()
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let state = parts.next()?;
            Some(DeviceEntry {
                serial: serial.to_string(),
                state: state.to_string(),
            })
        })
        .collect()
}

/// Pick the single ready device out of an `adb devices` listing.
pub fn select_device(output: &str, serial: Option<&str>) -> Result<String, ConnectionError> {
    let entries = parse_device_list(output);
    if entries.is_empty() {
        return Err(ConnectionError::NoDevice);
    }

    let mut ready = Vec::new();
    for entry in &entries {
        if serial.is_some_and(|s| s != entry.serial) {
            continue;
        }
        match entry.state.as_str() {
            "offline" => return Err(ConnectionError::Offline(entry.serial.clone())),
            "device" => ready.push(entry.serial.clone()),
            _ => {}
        }
    }

    match (ready.len(), serial) {
        (1, _) => Ok(ready.remove(0)),
        (0, Some(serial)) if !entries.iter().any(|e| e.serial == serial) => {
            Err(ConnectionError::SerialNotFound {
                serial: serial.to_string(),
                available: output.trim().to_string(),
            })
        }
        (0, _) => Err(ConnectionError::NoUsableDevice(output.trim().to_string())),
        _ => Err(ConnectionError::MultipleDevices(ready.join(", "))),
    }
}

/// Enumerate devices through the bridge and return the selected serial.
pub async fn check_connection(bridge: &dyn Bridge, serial: Option<&str>) -> Result<String, AdbError> {
    let output = bridge.run(&["devices".to_string()], DEVICES_TIMEOUT).await?;
    let listing = String::from_utf8_lossy(&output.stdout);
    let selected = select_device(&listing, serial)?;
    tracing::debug!(serial = %selected, "device connected");
    Ok(selected)
}
