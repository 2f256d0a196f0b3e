//! Invocation context read from NZBGet's environment
//!
//! NZBGet starts the extension either as a queue script (variables prefixed
//! `NZBNA_`, plus `NZBNA_EVENT`) or as a post-processing script (prefix
//! `NZBPP_`). Post-processing parameters of the job, including the flags this
//! extension publishes, arrive as `NZBPR_*`.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::{JobId, QueueEvent};

/// Annotation published once a password was found
pub const HAS_PASSWORD_KEY: &str = "PASSWORDDETECTOR_HASPASSWORD";

/// Annotation published once the files were reordered (shared with FakeDetector)
pub const SORTED_KEY: &str = "FAKEDETECTOR_SORTED";

/// Parameter set when a scan script or the user supplied an unpack password
const PASSWORD_PRESET_KEY: &str = "NZBPR_*Unpack:Password";

/// Status NZBGet reports for jobs marked bad
pub const STATUS_FAILURE_BAD: &str = "FAILURE/BAD";

/// Total status NZBGet reports for failed jobs
pub const TOTAL_STATUS_FAILURE: &str = "FAILURE";

/// Process environment as a map; variables that are not valid UTF-8 are skipped
pub fn env_vars() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}

/// What NZBGet asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Invocation {
    /// A queue event this extension does not process
    Ignored(String),
    /// A job to inspect
    Job(InvocationContext),
}

/// The job and flags of the current invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationContext {
    /// Triggering event
    pub event: QueueEvent,
    /// Job identifier
    pub job_id: JobId,
    /// Display name of the job
    pub name: String,
    /// Category of the job (may be empty)
    pub category: String,
    /// Destination directory of the job
    pub directory: PathBuf,
    /// `NZBPP_STATUS` (post-processing only)
    pub status: Option<String>,
    /// `NZBPP_TOTALSTATUS` (post-processing only)
    pub total_status: Option<String>,
    /// Job was flagged as password protected by an earlier invocation
    pub has_password_flag: bool,
    /// Files were already reordered by an earlier invocation
    pub sorted_flag: bool,
    /// An unpack password is already defined for the job
    pub password_preset: bool,
}

impl InvocationContext {
    /// Read the context from the process environment
    pub fn from_env() -> Result<Invocation> {
        Self::from_vars(&env_vars())
    }

    /// Read the context from a variable map
    ///
    /// Fails when the variables do not look like an NZBGet invocation or when
    /// the job identity is missing.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Invocation> {
        let queue_event = vars.get("NZBNA_EVENT").map(String::as_str);
        if (queue_event.is_none() && !vars.contains_key("NZBPP_DIRECTORY"))
            || !vars.contains_key("NZBOP_ARTICLECACHE")
        {
            return Err(Error::config(
                "this extension is supposed to be called from nzbget (14.0 or later)",
                "NZBNA_EVENT",
            ));
        }

        let event = QueueEvent::from_env_value(queue_event);
        if let QueueEvent::Unknown(name) = &event {
            return Ok(Invocation::Ignored(name.clone()));
        }

        let prefix = if event.is_terminal() { "NZBPP_" } else { "NZBNA_" };
        let required = |key: &str| -> Result<&String> {
            let full = format!("{prefix}{key}");
            vars.get(&full)
                .ok_or_else(|| Error::config(format!("{full} is not set"), full.clone()))
        };

        let job_id = required("NZBID")?;
        let job_id = job_id.parse::<JobId>().map_err(|_| {
            Error::config(
                format!("invalid job id {job_id:?}"),
                format!("{prefix}NZBID"),
            )
        })?;

        let flag = |key: &str| vars.get(&format!("NZBPR_{key}")).is_some_and(|v| v == "yes");

        Ok(Invocation::Job(InvocationContext {
            job_id,
            name: required("NZBNAME")?.clone(),
            category: vars
                .get(&format!("{prefix}CATEGORY"))
                .cloned()
                .unwrap_or_default(),
            directory: PathBuf::from(required("DIRECTORY")?),
            status: vars.get("NZBPP_STATUS").cloned(),
            total_status: vars.get("NZBPP_TOTALSTATUS").cloned(),
            has_password_flag: flag(HAS_PASSWORD_KEY),
            sorted_flag: flag(SORTED_KEY),
            password_preset: vars.contains_key(PASSWORD_PRESET_KEY),
            event,
        }))
    }

    /// Job was marked bad (by this extension or another one)
    pub fn is_marked_bad(&self) -> bool {
        self.status.as_deref() == Some(STATUS_FAILURE_BAD)
    }

    /// Job already failed for any reason
    pub fn has_failed(&self) -> bool {
        self.total_status.as_deref() == Some(TOTAL_STATUS_FAILURE)
    }
}
