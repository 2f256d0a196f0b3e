//! Tested-file bookkeeping
//!
//! Every job gets one record file named after its id below the tracker
//! directory. The record lists, one per line, every file name that has already
//! been visited by a scan, so later invocations only probe new files.
//!
//! Records are append-only. There is no locking: NZBGet never runs two
//! invocations of the same script for the same job at once, and the tracker
//! relies on that.

use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::TrackerError;
use crate::types::JobId;

/// Durable per-job record of probed file names
#[derive(Debug, Clone)]
pub struct TestedFileTracker {
    root: PathBuf,
}

impl TestedFileTracker {
    /// Create a tracker storing records below `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the records
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record for `job`
    pub fn record_path(&self, job: JobId) -> PathBuf {
        self.root.join(job.to_string())
    }

    /// Whether a record exists for `job`
    pub async fn has_record(&self, job: JobId) -> bool {
        fs::metadata(self.record_path(job)).await.is_ok()
    }

    /// Names from `listing` that are not in the job's record, in listing order
    ///
    /// Creates the record (and the tracker directory) if the job has none yet.
    /// Names are compared in their lossy UTF-8 form, the form they are
    /// recorded in.
    pub async fn untested<N>(&self, job: JobId, listing: &[N]) -> Result<Vec<N>, TrackerError>
    where
        N: AsRef<OsStr> + Clone,
    {
        let tested = match self.read_record(job).await {
            Ok(tested) => tested,
            Err(TrackerError::NotFound { .. }) => {
                self.create_record(job).await?;
                return Ok(listing.to_vec());
            }
            Err(e) => return Err(e),
        };

        Ok(listing
            .iter()
            .filter(|name| !tested.contains(&*name.as_ref().to_string_lossy()))
            .cloned()
            .collect())
    }

    /// Append `names` to the job's record
    ///
    /// The data is synced to disk before returning.
    pub async fn record_tested<N>(&self, job: JobId, names: &[N]) -> Result<(), TrackerError>
    where
        N: AsRef<OsStr>,
    {
        if names.is_empty() {
            return Ok(());
        }

        let path = self.record_path(job);
        if let Err(e) = fs::create_dir_all(&self.root).await {
            return Err(TrackerError::from_io(&self.root, e));
        }

        let mut data = String::new();
        for name in names {
            data.push_str(&name.as_ref().to_string_lossy());
            data.push('\n');
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| TrackerError::from_io(&path, e))?;
        file.write_all(data.as_bytes())
            .await
            .map_err(|e| TrackerError::from_io(&path, e))?;
        file.sync_data()
            .await
            .map_err(|e| TrackerError::from_io(&path, e))?;

        debug!(job_id = job.get(), count = names.len(), "recorded tested files");
        Ok(())
    }

    /// Names of all stored records
    ///
    /// A missing tracker directory means there are no records.
    pub async fn list_records(&self) -> Result<Vec<String>, TrackerError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                return match TrackerError::from_io(&self.root, e) {
                    TrackerError::NotFound { .. } => Ok(Vec::new()),
                    other => Err(other),
                };
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TrackerError::from_io(&self.root, e))?
        {
            match entry.file_name().into_string() {
                Ok(name) => records.push(name),
                Err(name) => warn!(file = ?name, "ignoring foreign file in tracker directory"),
            }
        }
        records.sort();
        Ok(records)
    }

    /// Delete the record named `name`
    pub async fn remove_record(&self, name: &str) -> Result<(), TrackerError> {
        let path = self.root.join(name);
        fs::remove_file(&path)
            .await
            .map_err(|e| TrackerError::from_io(&path, e))
    }

    async fn read_record(&self, job: JobId) -> Result<HashSet<String>, TrackerError> {
        let path = self.record_path(job);
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| TrackerError::from_io(&path, e))?;
        Ok(content.lines().map(str::to_string).collect())
    }

    async fn create_record(&self, job: JobId) -> Result<(), TrackerError> {
        if fs::metadata(&self.root).await.is_err() {
            fs::create_dir_all(&self.root)
                .await
                .map_err(|e| TrackerError::from_io(&self.root, e))?;
            debug!(folder = ?self.root, "Created folder");
        }

        let path = self.record_path(job);
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| TrackerError::from_io(&path, e))?;
        debug!(file = ?path, "Created temp file");
        Ok(())
    }
}

/// Regular files in a job directory, sorted by name
///
/// This order is the listing order used for probing. Names are kept as the OS
/// returns them, so files whose names are not valid UTF-8 are probed too.
pub async fn list_job_directory(dir: &Path) -> std::io::Result<Vec<OsString>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file {
            names.push(entry.file_name());
        }
    }
    names.sort();
    Ok(names)
}
