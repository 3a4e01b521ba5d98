//! Process bridge to the `adb` executable.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use super::connection::{AdbConfig, AdbError};

/// Captured output of one bridge invocation.
#[derive(Debug, Clone, Default)]
pub struct BridgeOutput {
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl BridgeOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Failed output with the given stderr.
    pub fn failed(stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout decoded lossily and trimmed.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }

    /// Stderr decoded lossily and trimmed.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Transport for device commands.
///
/// `args` is everything after the device selector, e.g. `["shell", "input", "tap", "1", "2"]`.
/// Implementations own the executable path and the `-s <serial>` prefix.
#[async_trait]
pub trait Bridge: Send + Sync {
    async fn run(&self, args: &[String], timeout: Duration) -> Result<BridgeOutput, AdbError>;
}

/// [`Bridge`] that spawns the real `adb` binary.
#[derive(Debug, Clone)]
pub struct AdbBridge {
    config: AdbConfig,
}

impl AdbBridge {
    pub fn new(config: AdbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdbConfig {
        &self.config
    }
}

#[async_trait]
impl Bridge for AdbBridge {
    async fn run(&self, args: &[String], timeout: Duration) -> Result<BridgeOutput, AdbError> {
        let full_args = self.config.command_args(args);
        tracing::debug!(adb = %self.config.adb_path, args = ?full_args, "running adb");

        let mut cmd = Command::new(&self.config.adb_path);
        cmd.args(&full_args).kill_on_drop(true);

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| AdbError::Timeout {
                command: args.join(" "),
                secs: timeout.as_secs(),
            })?
            .map_err(|source| AdbError::Spawn {
                program: self.config.adb_path.clone(),
                source,
            })?;

        Ok(BridgeOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_text_is_trimmed() {
        let out = BridgeOutput::ok("  hello\n");
        assert_eq!(out.stdout_text(), "hello");
        assert!(out.success);

        let failed = BridgeOutput::failed("boom\n");
        assert_eq!(failed.stderr_text(), "boom");
        assert!(!failed.success);
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let bridge = AdbBridge::new(AdbConfig::new("/nonexistent/adb-binary-for-tests", None));
        let err = bridge
            .run(&["devices".to_string()], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AdbError::Spawn { .. }));
    }
}
