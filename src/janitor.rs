//! Removal of stale tracker records
//!
//! Records of jobs that left the queue are never needed again. When the
//! post-processing invocation of a job finishes, its own record goes, together
//! with the record of every job the host no longer knows about.

use std::collections::HashSet;
use tracing::{debug, error, warn};

use crate::controller::HostController;
use crate::error::Result;
use crate::tracker::TestedFileTracker;
use crate::types::JobId;

/// Deletes tracker records of finished jobs
#[derive(Debug, Clone)]
pub struct TempStoreJanitor {
    tracker: TestedFileTracker,
}

impl TempStoreJanitor {
    /// Create a janitor for the records of `tracker`
    pub fn new(tracker: TestedFileTracker) -> Self {
        Self { tracker }
    }

    /// Remove the record of `current` and every record of an inactive job
    ///
    /// The host is only asked for its active jobs when more than one record is
    /// stored; a lone record is removed without asking. Returns the names of
    /// the removed records. Failing removals are logged and skipped.
    pub async fn cleanup(
        &self,
        current: Option<JobId>,
        controller: &dyn HostController,
    ) -> Result<Vec<String>> {
        let records = self.tracker.list_records().await?;
        let current = current.map(|id| id.to_string());

        let mut stale: Vec<String> = if records.len() > 1 {
            match controller.list_active_jobs().await {
                Ok(active) => {
                    let active: HashSet<String> =
                        active.iter().map(JobId::to_string).collect();
                    records
                        .iter()
                        .filter(|name| !active.contains(name.as_str()))
                        .cloned()
                        .collect()
                }
                Err(e) => {
                    warn!(error = %e, "could not list active jobs, keeping other records");
                    Vec::new()
                }
            }
        } else {
            records.clone()
        };

        if let Some(current) = current
            && records.contains(&current)
            && !stale.contains(&current)
        {
            stale.push(current);
        }

        let mut removed = Vec::with_capacity(stale.len());
        for name in stale {
            let path = self.tracker.root().join(&name);
            debug!("Removing temp file {}", path.display());
            match self.tracker.remove_record(&name).await {
                Ok(()) => removed.push(name),
                Err(e) => error!(error = %e, "Could not remove temp file {}", path.display()),
            }
        }
        Ok(removed)
    }
}
