//! Password probing of single archive files
//!
//! A probe lists one file with the inspection tool and looks for marker
//! strings in everything the tool printed. A probe that cannot run, or whose
//! tool fails without printing a marker, is inconclusive and never counts as
//! a password.

mod traits;
mod unrar;

pub use traits::{ArchiveInspector, ExitStatus, ToolOutput};
pub use unrar::{UnrarInspector, locate_unrar};

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

/// Result of probing one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Tool output contained a password marker
    Positive,
    /// Tool ran and printed no marker
    Negative,
    /// Tool could not run, or failed without printing a marker
    Inconclusive,
}

impl Classification {
    /// Whether this classification means a password was seen
    pub fn is_positive(self) -> bool {
        matches!(self, Self::Positive)
    }
}

/// Case-insensitive set of marker strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerSet {
    markers: Vec<String>,
}

impl MarkerSet {
    /// Parse a comma separated list; blank entries are dropped
    pub fn parse(list: &str) -> Self {
        let markers = list
            .split(',')
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        Self { markers }
    }

    /// Whether any marker occurs in `text`
    ///
    /// An empty set never matches.
    pub fn classify(&self, text: &str) -> bool {
        if self.markers.is_empty() {
            return false;
        }
        let haystack = text.to_lowercase();
        self.markers.iter().any(|m| haystack.contains(m.as_str()))
    }

    /// Number of usable markers
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the set has no usable markers
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

/// Runs the inspector on a file and classifies the output
#[derive(Clone)]
pub struct PasswordProbe {
    inspector: Arc<dyn ArchiveInspector>,
    markers: MarkerSet,
    verbose: bool,
}

impl PasswordProbe {
    /// Create a probe
    pub fn new(inspector: Arc<dyn ArchiveInspector>, markers: MarkerSet, verbose: bool) -> Self {
        Self {
            inspector,
            markers,
            verbose,
        }
    }

    /// Probe one file
    pub async fn probe(&self, path: &Path) -> Classification {
        if self.verbose {
            debug!(tool = self.inspector.name(), file = ?path, "probing archive");
        }

        let output = match self.inspector.list(path).await {
            Ok(output) => output,
            Err(e) => {
                error!(file = ?path, error = %e, "Failed to probe file");
                return Classification::Inconclusive;
            }
        };

        if self.verbose {
            if !output.stdout.is_empty() {
                debug!("out: {}", strip_newlines(&output.stdout));
            }
            if !output.stderr.is_empty() {
                debug!("error: {}", strip_newlines(&output.stderr));
            }
        }

        if self.markers.classify(&output.stdout) || self.markers.classify(&output.stderr) {
            return Classification::Positive;
        }

        match output.status {
            ExitStatus::Success => Classification::Negative,
            ExitStatus::Failure(code) => {
                debug!(file = ?path, ?code, "inspection tool failed, result inconclusive");
                Classification::Inconclusive
            }
        }
    }
}

fn strip_newlines(text: &str) -> String {
    text.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}
