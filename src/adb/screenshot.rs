//! Screenshot capture for the connected Android device.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use std::io::Cursor;
use std::time::Duration;

use super::bridge::BridgeOutput;
use super::connection::AdbError;

/// Timeout for `exec-out screencap`.
pub const SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(15);

/// Anything shorter cannot be a valid image.
pub const MIN_IMAGE_BYTES: usize = 8;

/// Encoding of captured image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn media_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Webp => "webp",
        }
    }

    /// Detect from magic bytes; `screencap -p` always writes PNG.
    fn detect(bytes: &[u8]) -> Self {
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Ok(image::ImageFormat::WebP) => ImageFormat::Webp,
            _ => ImageFormat::Png,
        }
    }
}

/// A captured screen image.
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl Screenshot {
    /// Validate raw `screencap` output.
    ///
    /// `width`/`height` are the known screen dimensions. They are replaced by the
    /// dimensions in the image header when that header can be read.
    pub fn from_capture(output: BridgeOutput, width: u32, height: u32) -> Result<Self, AdbError> {
        if !output.success {
            return Err(AdbError::Capture(format!(
                "screencap failed: {}",
                output.stderr_text()
            )));
        }
        if output.stdout.len() < MIN_IMAGE_BYTES {
            return Err(AdbError::Capture(format!(
                "screencap returned empty data ({} bytes)",
                output.stdout.len()
            )));
        }

        let data = output.stdout;
        let format = ImageFormat::detect(&data);
        let (width, height) = header_dimensions(&data).unwrap_or((width, height));

        Ok(Self {
            data,
            format,
            width,
            height,
        })
    }

    pub fn base64_data(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

fn header_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}
