//! unrar-based archive inspector

use super::traits::{ArchiveInspector, ToolOutput};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

#[cfg(windows)]
const UNRAR_EXE: &str = "unrar.exe";
#[cfg(not(windows))]
const UNRAR_EXE: &str = "unrar";

/// Archive inspector running `unrar l -p- -c- <file>`
///
/// `-p-` stops unrar from asking for a password and `-c-` disables comment
/// display, so the run never waits on stdin.
pub struct UnrarInspector {
    binary_path: PathBuf,
}

impl UnrarInspector {
    /// Create an inspector with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Path of the unrar binary in use
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl ArchiveInspector for UnrarInspector {
    async fn list(&self, path: &Path) -> crate::Result<ToolOutput> {
        let output = Command::new(&self.binary_path)
            .arg("l") // List, never extract
            .arg("-p-")
            .arg("-c-")
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                crate::Error::ExternalTool(format!(
                    "Failed to execute {}: {}",
                    self.binary_path.display(),
                    e
                ))
            })?;

        Ok(ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.into(),
        })
    }

    fn name(&self) -> &'static str {
        "unrar"
    }
}

/// Find the unrar executable from NZBGet's `UnrarCmd` option
///
/// `UnrarCmd` may carry extra parameters (`/usr/bin/unrar -ai`), so only the
/// part naming the executable is kept. Resolution order:
/// 1. the whole option, if it is an existing file named unrar
/// 2. the first argument of the option whose name ends in unrar
/// 3. unrar on PATH (when `search_path` is set)
/// 4. the bare executable name, left to the OS to resolve
pub fn locate_unrar(unrar_cmd: Option<&str>, search_path: bool) -> PathBuf {
    if let Some(cmd) = unrar_cmd.map(str::trim).filter(|c| !c.is_empty()) {
        if cmd.to_lowercase().ends_with(UNRAR_EXE) && Path::new(cmd).is_file() {
            return PathBuf::from(cmd);
        }
        match shlex::split(cmd) {
            Some(args) => {
                if let Some(arg) = args
                    .into_iter()
                    .find(|arg| arg.to_lowercase().ends_with(UNRAR_EXE))
                {
                    return PathBuf::from(arg);
                }
            }
            None => warn!(unrar_cmd = cmd, "could not parse UnrarCmd, ignoring it"),
        }
    }

    if search_path && let Ok(found) = which::which(UNRAR_EXE) {
        debug!(path = ?found, "found unrar on PATH");
        return found;
    }

    PathBuf::from(UNRAR_EXE)
}
