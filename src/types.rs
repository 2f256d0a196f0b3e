//! Core types for nzb-password-detector

use serde::Deserialize;

use crate::config::PassAction;

/// NZBGet identifier of a download job (`NZBID`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub i64);

impl JobId {
    /// Create a new JobId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for JobId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// One file of a job as reported by the host (`listfiles`)
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FileEntry {
    /// Host-side file id, used for queue edits
    #[serde(rename = "ID")]
    pub id: i64,
    /// File name inside the job
    #[serde(rename = "Filename")]
    pub filename: String,
}

impl FileEntry {
    /// Create a new file entry
    pub fn new(id: i64, filename: impl Into<String>) -> Self {
        Self {
            id,
            filename: filename.into(),
        }
    }
}

/// Queue event that triggered this invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueueEvent {
    /// `NZB_ADDED`: the job was just added to the queue
    NzbAdded,
    /// `FILE_DOWNLOADED`: one file of the job finished downloading
    FileDownloaded,
    /// `NZB_DOWNLOADED`: all files downloaded, before post-processing
    NzbDownloaded,
    /// Called as post-processing script (no queue event)
    PostProcess,
    /// A queue event this extension does not handle
    Unknown(String),
}

impl QueueEvent {
    /// Parse the value of `NZBNA_EVENT`; `None` means post-processing mode
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            None => QueueEvent::PostProcess,
            Some("NZB_ADDED") => QueueEvent::NzbAdded,
            Some("FILE_DOWNLOADED") => QueueEvent::FileDownloaded,
            Some("NZB_DOWNLOADED") => QueueEvent::NzbDownloaded,
            Some(other) => QueueEvent::Unknown(other.to_string()),
        }
    }

    /// Post-processing is the last invocation for a job
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueEvent::PostProcess)
    }
}

/// Whether detection saw a password
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// No probed file revealed a password
    NoPassword,
    /// A probed file revealed a password
    PasswordFound,
}

/// Result of one detection run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    /// What the probes revealed
    pub verdict: Verdict,
    /// What was asked of the host because of it
    pub action: PassAction,
}

impl Decision {
    /// A clean result; no action is ever taken for it
    pub fn no_password() -> Self {
        Self {
            verdict: Verdict::NoPassword,
            action: PassAction::None,
        }
    }

    /// A password was found and `action` applies
    pub fn password_found(action: PassAction) -> Self {
        Self {
            verdict: Verdict::PasswordFound,
            action,
        }
    }
}

/// Outcome of an invocation as seen by NZBGet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report (deferred or skipped)
    NoOpinion,
    /// The run finished normally, password or not
    Success,
    /// A precondition was violated or an essential host call failed
    Error,
}

impl Outcome {
    /// NZBGet script exit code (`POSTPROCESS_*`)
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 93,
            Outcome::Error => 94,
            Outcome::NoOpinion => 95,
        }
    }
}
