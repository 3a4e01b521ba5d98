//! Parsers for the text reports printed by device query commands.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::connection::AdbError;

static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*x\s*(\d+)").expect("screen size pattern is valid"));

/// Screen size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Centre point, saturated to the `i32` coordinate range.
    pub fn center(&self) -> (i32, i32) {
        let half = |v: u32| i32::try_from(v / 2).unwrap_or(i32::MAX);
        (half(self.width), half(self.height))
    }
}

impl std::fmt::Display for ScreenSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn parse_dimensions(text: &str) -> Option<ScreenSize> {
    let caps = SIZE_RE.captures(text)?;
    let width = caps.get(1)?.as_str().parse().ok()?;
    let height = caps.get(2)?.as_str().parse().ok()?;
    Some(ScreenSize::new(width, height))
}

/// Parse `wm size` output.
///
/// The `Physical size` line wins; otherwise the last line carrying a `WxH`
/// value (e.g. `Override size`) is used.
pub fn parse_screen_size(output: &str) -> Result<ScreenSize, AdbError> {
    let physical = output
        .lines()
        .find(|line| line.contains("Physical size"))
        .and_then(|line| parse_dimensions(line.rsplit(':').next().unwrap_or(line)));

    physical
        .or_else(|| output.lines().rev().find_map(parse_dimensions))
        .ok_or_else(|| AdbError::Parse {
            what: "screen size",
            raw: output.to_string(),
        })
}

/// First line of `dumpsys activity activities` naming the resumed activity.
pub fn parse_resumed_activity(output: &str) -> Result<String, AdbError> {
    output
        .lines()
        .find(|line| line.contains("ResumedActivity"))
        .map(|line| line.trim().to_string())
        .ok_or_else(|| AdbError::Parse {
            what: "resumed activity",
            raw: output.to_string(),
        })
}

/// Sorted package ids from `pm list packages` output.
pub fn parse_packages(output: &str) -> Vec<String> {
    let mut packages: Vec<String> = output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .map(|pkg| pkg.trim().to_string())
        .filter(|pkg| !pkg.is_empty())
        .collect();
    packages.sort();
    packages
}

/// Battery fields from `dumpsys battery`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatteryInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Name for a `BatteryManager` status code, or the raw code.
pub fn battery_status_name(code: &str) -> String {
    match code.trim().parse::<i64>() {
        Ok(1) => "unknown".to_string(),
        Ok(2) => "charging".to_string(),
        Ok(3) => "discharging".to_string(),
        Ok(4) => "not_charging".to_string(),
        Ok(5) => "full".to_string(),
        _ => code.trim().to_string(),
    }
}

/// Parse `dumpsys battery` output. Missing fields stay `None`; a `level`
/// that is not a number is a parse error.
pub fn parse_battery(output: &str) -> Result<BatteryInfo, AdbError> {
    let mut battery = BatteryInfo::default();
    for line in output.lines().map(str::trim) {
        if let Some(level) = line.strip_prefix("level:") {
            let level = level.trim().parse().map_err(|_| AdbError::Parse {
                what: "battery level",
                raw: output.to_string(),
            })?;
            battery.level = Some(level);
        } else if let Some(status) = line.strip_prefix("status:") {
            battery.status = Some(battery_status_name(status));
        }
    }
    Ok(battery)
}

/// Screen size, or the error that prevented reading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScreenReport {
    Size(ScreenSize),
    Error { error: String },
}

/// Report returned by `get_device_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceReport {
    pub screen: ScreenReport,
    pub android_version: String,
    pub model: String,
    pub manufacturer: String,
    pub battery: BatteryInfo,
}
