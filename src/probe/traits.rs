//! Traits and types for archive inspection

use async_trait::async_trait;
use std::path::Path;

/// Exit status of an external command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The command exited successfully (exit code 0)
    Success,
    /// The command exited with a non-zero exit code or was killed
    Failure(Option<i32>),
}

impl ExitStatus {
    /// Returns `true` if the exit status represents success
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        if status.success() {
            Self::Success
        } else {
            Self::Failure(status.code())
        }
    }
}

/// Captured output of one listing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
    /// How the tool exited
    pub status: ExitStatus,
}

/// Trait for tools that can list an archive without extracting it
///
/// The listing must never prompt for a password or for overwrite confirmation;
/// whatever the tool prints about encryption is what detection looks at.
#[async_trait]
pub trait ArchiveInspector: Send + Sync {
    /// List the archive at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the tool could not be started. A tool that starts and
    /// fails is not an error; its status is reported in [`ToolOutput`].
    async fn list(&self, path: &Path) -> crate::Result<ToolOutput>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
