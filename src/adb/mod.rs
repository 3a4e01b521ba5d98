//! ADB (Android Debug Bridge) module for device interaction.

mod bridge;
mod connection;
mod device;
pub mod info;
pub mod input;
mod screenshot;

pub use bridge::{AdbBridge, Bridge, BridgeOutput};
pub use connection::{
    check_connection, default_adb_path, parse_device_list, select_device, AdbConfig, AdbError,
    ConnectionError, DeviceEntry,
};
pub use device::{
    swipe_endpoint, AdbDevice, Direction, DEFAULT_SCREEN_SIZE, DEFAULT_SWIPE_DISTANCE,
};
pub use info::{DeviceReport, ScreenSize};
pub use screenshot::{ImageFormat, Screenshot};
