//! Per-invocation state machine
//!
//! One [`Orchestrator::run`] handles one NZBGet invocation: it decides from the
//! event and the flags of earlier invocations whether to skip, reorder or
//! detect, performs the resulting action on the host and, on the terminal
//! post-processing invocation, clears out tracker records.
//!
//! Runs are strictly sequential. The only suspension points are the unrar
//! child process and calls to the host.

use std::ffi::OsString;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::{Config, DetectorConfig, PassAction};
use crate::context::{HAS_PASSWORD_KEY, InvocationContext, SORTED_KEY};
use crate::controller::{HostController, NzbGetController, RpcClient};
use crate::error::Result;
use crate::janitor::TempStoreJanitor;
use crate::probe::{Classification, MarkerSet, PasswordProbe, UnrarInspector, locate_unrar};
use crate::selector::select_top_part;
use crate::tracker::{TestedFileTracker, list_job_directory};
use crate::types::{Decision, Outcome, QueueEvent};

/// Where a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Job already marked bad; nothing probed
    SkipAlreadyMarked,
    /// Password found by an earlier invocation and the job was resumed
    SkipPreviouslyFound,
    /// An unpack password is already defined
    SkipPasswordPreset,
    /// The job directory is gone
    SkipMissingDirectory,
    /// The job already failed for other reasons
    SkipAlreadyFailed,
    /// Files were reordered, detection deferred
    ReorderOnly,
    /// Detection ran and produced a decision
    Decided,
}

/// What a run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Final state
    pub state: RunState,
    /// Decision, when one was made or re-emitted
    pub decision: Option<Decision>,
    /// Whether stale tracker records were cleaned up
    pub cleaned: bool,
}

impl RunReport {
    /// Outcome reported to NZBGet
    pub fn outcome(&self) -> Outcome {
        match self.state {
            RunState::SkipAlreadyMarked
            | RunState::SkipPreviouslyFound
            | RunState::SkipPasswordPreset
            | RunState::Decided => Outcome::Success,
            RunState::SkipMissingDirectory | RunState::SkipAlreadyFailed | RunState::ReorderOnly => {
                Outcome::NoOpinion
            }
        }
    }
}

/// Files visited by a scan and whether one of them revealed a password
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// A probe was positive
    pub found: bool,
    /// Every visited file, in order, including the positive one
    pub visited: Vec<OsString>,
}

impl ScanOutcome {
    /// Fold one visited file into the outcome; breaks on a positive probe
    pub fn visit(
        &mut self,
        name: OsString,
        classification: Option<Classification>,
    ) -> ControlFlow<()> {
        self.visited.push(name);
        if classification.is_some_and(Classification::is_positive) {
            self.found = true;
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// Sequences skip checks, reordering, detection and cleanup
pub struct Orchestrator {
    config: DetectorConfig,
    tracker: TestedFileTracker,
    probe: PasswordProbe,
    janitor: TempStoreJanitor,
    controller: Arc<dyn HostController>,
}

impl Orchestrator {
    /// Create an orchestrator from its parts
    pub fn new(
        config: DetectorConfig,
        tracker: TestedFileTracker,
        probe: PasswordProbe,
        controller: Arc<dyn HostController>,
    ) -> Self {
        Self {
            config,
            janitor: TempStoreJanitor::new(tracker.clone()),
            tracker,
            probe,
            controller,
        }
    }

    /// Wire the unrar probe and the NZBGet controller from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let unrar = locate_unrar(config.tools.unrar_cmd.as_deref(), config.tools.search_path);
        debug!(path = ?unrar, "using unrar");
        let probe = PasswordProbe::new(
            Arc::new(UnrarInspector::new(unrar)),
            MarkerSet::parse(&config.detector.password_strings),
            config.detector.verbose,
        );
        let controller = NzbGetController::new(RpcClient::new(&config.controller)?);

        Ok(Self::new(
            config.detector.clone(),
            TestedFileTracker::new(config.persistence.tracker_dir()),
            probe,
            Arc::new(controller),
        ))
    }

    /// Handle one invocation
    ///
    /// # Errors
    ///
    /// Fails when the job directory or the tracker record cannot be read or
    /// written, or when pausing or failing the job on the host fails.
    pub async fn run(&self, ctx: &InvocationContext) -> Result<RunReport> {
        let (state, decision) = self.evaluate(ctx).await?;

        let cleaned = ctx.event.is_terminal() && self.clean_up(ctx).await;

        Ok(RunReport {
            state,
            decision,
            cleaned,
        })
    }

    async fn evaluate(&self, ctx: &InvocationContext) -> Result<(RunState, Option<Decision>)> {
        if ctx.is_marked_bad() {
            if ctx.has_password_flag {
                // Repeated so that it lands in the post-processing log
                warn!("Download is password protected");
                return Ok((
                    RunState::SkipAlreadyMarked,
                    Some(Decision::password_found(self.config.pass_action)),
                ));
            }
            return Ok((RunState::SkipAlreadyMarked, None));
        }

        // The job was paused on an earlier hit and the user resumed it. A
        // redownload has no record left, because post-processing removed it.
        if ctx.has_password_flag && self.tracker.has_record(ctx.job_id).await {
            debug!("Password previously found, skipping detection");
            return Ok((RunState::SkipPreviouslyFound, None));
        }

        if ctx.password_preset {
            debug!("Password previously defined, skipping detection");
            return Ok((RunState::SkipPasswordPreset, None));
        }

        // NZBGet creates the directory with the first downloaded file
        if ctx.event != QueueEvent::NzbAdded && !is_dir(&ctx.directory).await {
            info!("Destination directory doesn't exist, exiting");
            return Ok((RunState::SkipMissingDirectory, None));
        }

        if ctx.has_failed() {
            debug!(job_id = ctx.job_id.get(), "download already failed, skipping detection");
            return Ok((RunState::SkipAlreadyFailed, None));
        }

        let wants_sorting = ctx.event == QueueEvent::NzbAdded
            || (ctx.event == QueueEvent::FileDownloaded && !ctx.sorted_flag);
        if wants_sorting {
            if !ctx.sorted_flag {
                info!("Sorting inner files for earlier fake detection for {}", ctx.name);
                self.sort_inner_files(ctx).await;
                self.annotate(SORTED_KEY, "yes").await;
            }
            if ctx.event == QueueEvent::NzbAdded {
                return Ok((RunState::ReorderOnly, None));
            }
        }

        let decision = self.detect(ctx).await?;
        Ok((RunState::Decided, Some(decision)))
    }

    async fn sort_inner_files(&self, ctx: &InvocationContext) {
        let files = match self.controller.list_files_for_job(ctx.job_id).await {
            Ok(files) => files,
            Err(e) => {
                warn!(error = %e, "could not list files of the download, skipping sorting");
                return;
            }
        };

        match select_top_part(&files) {
            Some(part) => {
                info!("Moving last rar-file to the top: {}", part.filename);
                if let Err(e) = self.controller.reorder_file_to_top(part.file_id).await {
                    warn!(file_id = part.file_id, error = %e, "could not move file to the top");
                }
            }
            None => info!("Skipping sorting since could not find any rar-files"),
        }
    }

    async fn detect(&self, ctx: &InvocationContext) -> Result<Decision> {
        debug!("Detecting password for {}", ctx.name);

        let listing = list_job_directory(&ctx.directory).await?;
        let untested = self.tracker.untested(ctx.job_id, &listing).await?;
        let scan = self.scan(&ctx.directory, untested).await;
        self.tracker
            .record_tested(ctx.job_id, &scan.visited)
            .await?;

        let decision = if scan.found {
            warn!("Password found in {}", ctx.name);
            self.annotate(HAS_PASSWORD_KEY, "yes").await;

            match self.config.pass_action {
                PassAction::Pause => {
                    self.controller.pause_job(ctx.job_id).await?;
                    debug!("Paused {}", ctx.name);
                }
                PassAction::MarkBad => {
                    self.controller.mark_job_permanently_failed().await?;
                    debug!("Marked bad {}", ctx.name);
                }
                PassAction::None => {}
            }
            Decision::password_found(self.config.pass_action)
        } else {
            // A redownload may have replaced protected files with clean ones
            if ctx.has_password_flag {
                self.annotate(HAS_PASSWORD_KEY, "").await;
            }
            Decision::no_password()
        };

        debug!("Detecting completed for {}", ctx.name);
        Ok(decision)
    }

    /// Probe `files` in order until one is positive
    ///
    /// Files whose name contains `tmp` are incomplete downloads; they count as
    /// visited but are not probed.
    async fn scan(&self, directory: &Path, files: Vec<OsString>) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        for name in files {
            let classification = if name.to_string_lossy().contains("tmp") {
                None
            } else {
                Some(self.probe.probe(&directory.join(&name)).await)
            };
            if outcome.visit(name, classification).is_break() {
                break;
            }
        }
        outcome
    }

    async fn annotate(&self, key: &str, value: &str) {
        if let Err(e) = self.controller.set_job_annotation(key, value).await {
            warn!(key, error = %e, "could not publish job parameter");
        }
    }

    async fn clean_up(&self, ctx: &InvocationContext) -> bool {
        match self
            .janitor
            .cleanup(Some(ctx.job_id), self.controller.as_ref())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "could not clean up temp files");
                false
            }
        }
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
