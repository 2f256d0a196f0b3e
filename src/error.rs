//! Error types for nzb-password-detector
//!
//! This module provides:
//! - The crate-wide [`Error`] type and [`Result`] alias
//! - [`TrackerError`], which separates a missing tracker record from real storage failures
//! - [`ToExitCode`], mapping errors onto NZBGet's script exit codes

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Outcome;

/// Result type alias for nzb-password-detector operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for nzb-password-detector
///
/// Each variant includes enough context to explain the failure in the NZBGet log.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration or invocation context is missing or invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The environment variable or option that caused the error (e.g., "NZBPO_PASSACTION")
        key: Option<String>,
    },

    /// Tested-file bookkeeping failed
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error while talking to the host
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Malformed JSON payload
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The host answered a JSON-RPC call with an error or an unexpected result
    #[error("RPC call {method} failed: {message}")]
    Rpc {
        /// The JSON-RPC method that was called (e.g., "editqueue")
        method: String,
        /// What went wrong
        message: String,
    },

    /// External tool execution failed (unrar)
    #[error("external tool error: {0}")]
    ExternalTool(String),
}

impl Error {
    /// Shorthand for a [`Error::Config`] naming the offending key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Tested-file record errors
///
/// `NotFound` is the normal state of a job that has never been scanned and is
/// handled by creating the record; every other failure is reported as `Io`.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The record for this job does not exist yet
    #[error("tracker record {path} does not exist")]
    NotFound {
        /// Path of the missing record
        path: PathBuf,
    },

    /// Reading, creating or appending the record failed
    #[error("tracker record {path}: {source}")]
    Io {
        /// Path of the record or record directory
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl TrackerError {
    /// Classify an I/O error on `path`, keeping `NotFound` distinct
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            TrackerError::NotFound { path }
        } else {
            TrackerError::Io { path, source }
        }
    }
}

/// Convert errors to the outcome reported back to NZBGet
pub trait ToExitCode {
    /// The outcome this error produces
    fn outcome(&self) -> Outcome;

    /// Process exit code for this error
    fn exit_code(&self) -> u8 {
        self.outcome().exit_code()
    }
}

impl ToExitCode for Error {
    fn outcome(&self) -> Outcome {
        // Anything that escapes the orchestrator is a broken precondition or a
        // failed essential host call.
        Outcome::Error
    }
}
