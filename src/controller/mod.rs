//! Host controller access
//!
//! Everything the detector asks of NZBGet goes through [`HostController`].
//! [`NzbGetController`] talks JSON-RPC for queue queries and edits, and uses the
//! script output protocol (`[NZB] ...` lines on stdout) for annotations and
//! marking a job bad.

mod rpc;
#[cfg(test)]
pub(crate) mod test_helpers;

pub use rpc::RpcClient;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::io::Write;
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::types::{FileEntry, JobId};

/// Operations the detector needs from the download queue host
///
/// Which failures are tolerated is decided by the caller: reordering and
/// annotations are best-effort, pausing and failing a job are not.
#[async_trait]
pub trait HostController: Send + Sync {
    /// Files of a job, in the host's order
    async fn list_files_for_job(&self, job: JobId) -> Result<Vec<FileEntry>>;

    /// Ids of all jobs currently in the queue
    async fn list_active_jobs(&self) -> Result<Vec<JobId>>;

    /// Move a file to the front of its job's download order
    async fn reorder_file_to_top(&self, file_id: i64) -> Result<()>;

    /// Pause a job
    async fn pause_job(&self, job: JobId) -> Result<()>;

    /// Fail the current job permanently (NZBGet status `FAILURE/BAD`)
    async fn mark_job_permanently_failed(&self) -> Result<()>;

    /// Set a post-processing parameter on the current job
    ///
    /// An empty `value` clears the parameter.
    async fn set_job_annotation(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct GroupEntry {
    #[serde(rename = "NZBID")]
    nzb_id: i64,
}

/// [`HostController`] for a running NZBGet instance
pub struct NzbGetController {
    rpc: RpcClient,
    output: Mutex<Box<dyn Write + Send>>,
}

impl NzbGetController {
    /// Create a controller writing script commands to stdout
    pub fn new(rpc: RpcClient) -> Self {
        Self::with_output(rpc, Box::new(std::io::stdout()))
    }

    /// Create a controller writing script commands to `output`
    pub fn with_output(rpc: RpcClient, output: Box<dyn Write + Send>) -> Self {
        Self {
            rpc,
            output: Mutex::new(output),
        }
    }

    async fn edit_queue(&self, command: &str, ids: &[i64]) -> Result<()> {
        let accepted: bool = self
            .rpc
            .call("editqueue", json!([command, 0, "", ids]))
            .await?;
        if accepted {
            Ok(())
        } else {
            Err(Error::Rpc {
                method: "editqueue".to_string(),
                message: format!("{command} was rejected"),
            })
        }
    }

    fn write_command(&self, command: &str) -> Result<()> {
        let mut output = self
            .output
            .lock()
            .map_err(|_| Error::Io(std::io::Error::other("script output lock poisoned")))?;
        writeln!(output, "[NZB] {command}")?;
        output.flush()?;
        Ok(())
    }
}

#[async_trait]
impl HostController for NzbGetController {
    async fn list_files_for_job(&self, job: JobId) -> Result<Vec<FileEntry>> {
        self.rpc.call("listfiles", json!([0, 0, job.get()])).await
    }

    async fn list_active_jobs(&self) -> Result<Vec<JobId>> {
        let groups: Vec<GroupEntry> = self.rpc.call("listgroups", json!([0])).await?;
        Ok(groups.into_iter().map(|g| JobId(g.nzb_id)).collect())
    }

    async fn reorder_file_to_top(&self, file_id: i64) -> Result<()> {
        self.edit_queue("FileMoveTop", &[file_id]).await
    }

    async fn pause_job(&self, job: JobId) -> Result<()> {
        self.edit_queue("GroupPause", &[job.get()]).await
    }

    async fn mark_job_permanently_failed(&self) -> Result<()> {
        self.write_command("MARK=BAD")
    }

    async fn set_job_annotation(&self, key: &str, value: &str) -> Result<()> {
        self.write_command(&format!("NZBPR_{key}={value}"))
    }
}
