//! # nzb-password-detector
//!
//! NZBGet extension that detects downloads containing password protected RAR
//! archives, without unpacking them.
//!
//! ## How it works
//!
//! NZBGet calls the extension as a queue script (`NZB_ADDED`, `FILE_DOWNLOADED`,
//! `NZB_DOWNLOADED`) and as a post-processing script. On every call the
//! [`Orchestrator`]:
//! - moves the last RAR volume to the top of the queue when the job is added,
//!   so a second volume is on disk early
//! - lists every downloaded file not probed before with `unrar l -p-` and looks
//!   for password markers in the output, stopping at the first hit
//! - pauses the job or marks it bad when a password is found
//! - forgets the per-job bookkeeping once post-processing is done
//!
//! The host must not run two invocations for the same job concurrently; the
//! tested-file records are not locked.
//!
//! ## Example
//!
//! ```no_run
//! use nzb_password_detector::context::env_vars;
//! use nzb_password_detector::{Config, Invocation, InvocationContext, Orchestrator};
//!
//! # async fn example() -> nzb_password_detector::Result<()> {
//! let vars = env_vars();
//! if let Invocation::Job(ctx) = InvocationContext::from_vars(&vars)? {
//!     let orchestrator = Orchestrator::from_config(&Config::from_vars(&vars)?)?;
//!     let report = orchestrator.run(&ctx).await?;
//!     println!("outcome: {:?}", report.outcome());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Invocation context from the environment
pub mod context;
/// Host controller access (JSON-RPC and script commands)
pub mod controller;
/// Error types
pub mod error;
/// Removal of stale tracker records
pub mod janitor;
/// NZBGet log formatting
pub mod logging;
/// Per-invocation state machine
pub mod orchestrator;
/// Password probing with unrar
pub mod probe;
/// Archive part selection
pub mod selector;
/// Tested-file bookkeeping
pub mod tracker;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, DetectorConfig, PassAction};
pub use context::{Invocation, InvocationContext};
pub use controller::{HostController, NzbGetController, RpcClient};
pub use error::{Error, Result, ToExitCode, TrackerError};
pub use janitor::TempStoreJanitor;
pub use orchestrator::{Orchestrator, RunReport, RunState, ScanOutcome};
pub use probe::{
    ArchiveInspector, Classification, ExitStatus, MarkerSet, PasswordProbe, ToolOutput,
    UnrarInspector,
};
pub use selector::{ArchivePart, select_top_part};
pub use tracker::TestedFileTracker;
pub use types::{Decision, FileEntry, JobId, Outcome, QueueEvent, Verdict};
