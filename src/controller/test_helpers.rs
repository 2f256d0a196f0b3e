//! In-memory host controller for unit tests.

use async_trait::async_trait;
use std::sync::Mutex;

use super::HostController;
use crate::error::{Error, Result};
use crate::types::{FileEntry, JobId};

/// A call received by [`RecordingController`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostCall {
    ListFiles(JobId),
    ListActiveJobs,
    ReorderToTop(i64),
    Pause(JobId),
    MarkBad,
    Annotate(String, String),
}

/// Controller that answers from fixed data and records every call.
#[derive(Default)]
pub(crate) struct RecordingController {
    pub files: Vec<FileEntry>,
    pub active_jobs: Vec<JobId>,
    pub fail_listing: bool,
    pub fail_reorder: bool,
    pub fail_pause: bool,
    pub calls: Mutex<Vec<HostCall>>,
}

impl RecordingController {
    pub(crate) fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, call: &HostCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn push(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn refused(method: &str) -> Error {
    Error::Rpc {
        method: method.to_string(),
        message: "refused by test".to_string(),
    }
}

#[async_trait]
impl HostController for RecordingController {
    async fn list_files_for_job(&self, job: JobId) -> Result<Vec<FileEntry>> {
        self.push(HostCall::ListFiles(job));
        if self.fail_listing {
            return Err(refused("listfiles"));
        }
        Ok(self.files.clone())
    }

    async fn list_active_jobs(&self) -> Result<Vec<JobId>> {
        self.push(HostCall::ListActiveJobs);
        if self.fail_listing {
            return Err(refused("listgroups"));
        }
        Ok(self.active_jobs.clone())
    }

    async fn reorder_file_to_top(&self, file_id: i64) -> Result<()> {
        self.push(HostCall::ReorderToTop(file_id));
        if self.fail_reorder {
            return Err(refused("editqueue"));
        }
        Ok(())
    }

    async fn pause_job(&self, job: JobId) -> Result<()> {
        self.push(HostCall::Pause(job));
        if self.fail_pause {
            return Err(refused("editqueue"));
        }
        Ok(())
    }

    async fn mark_job_permanently_failed(&self) -> Result<()> {
        self.push(HostCall::MarkBad);
        Ok(())
    }

    async fn set_job_annotation(&self, key: &str, value: &str) -> Result<()> {
        self.push(HostCall::Annotate(key.to_string(), value.to_string()));
        Ok(())
    }
}
