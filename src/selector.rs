//! Archive part selection for earlier password detection
//!
//! NZBGet downloads the files of a job roughly in order, so the first RAR
//! volume usually arrives early and the last one arrives late. Moving the last
//! volume to the top gives the detector a second volume to probe as soon as
//! possible, which matters for very large archives.
//!
//! Recognizes these naming conventions:
//! - `archive.part01.rar`, `archive.part001.rar` (new-style multi-volume)
//! - `archive.r00`, `archive.r01` (old-style split)

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::types::FileEntry;

const PART_RAR_PATTERN: &str = r"(?i)^.*\.part(\d+)\.rar";
const OLD_STYLE_PATTERN: &str = r"(?i)^.*\.r(\d+)";

static PART_RAR: LazyLock<Option<Regex>> = LazyLock::new(|| compile_pattern(PART_RAR_PATTERN));
static OLD_STYLE: LazyLock<Option<Regex>> = LazyLock::new(|| compile_pattern(OLD_STYLE_PATTERN));

/// Compile a volume pattern; a broken pattern is logged and disables only itself
fn compile_pattern(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|e| {
            warn!("Invalid volume regex pattern '{}': {}", pattern, e);
        })
        .ok()
}

/// A file of the job with the volume number parsed from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePart {
    /// Host-side file id
    pub file_id: i64,
    /// File name
    pub filename: String,
    /// Volume number, if the name follows one of the RAR conventions
    pub index: Option<u64>,
}

impl ArchivePart {
    /// Parse the volume number of `entry`
    pub fn from_entry(entry: &FileEntry) -> Self {
        Self {
            file_id: entry.id,
            filename: entry.filename.clone(),
            index: volume_index(&entry.filename),
        }
    }
}

/// Volume number of a RAR file name
///
/// `.partNN.rar` is tried before `.rNN`; a name yields at most one number.
/// Both patterns only anchor at the start, as NZBGet's own fake detector does.
pub fn volume_index(filename: &str) -> Option<u64> {
    [&*PART_RAR, &*OLD_STYLE]
        .into_iter()
        .flatten()
        .find_map(|re| re.captures(filename))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Pick the volume with the highest number
///
/// On ties the first file in listing order wins. Returns `None` if no file
/// follows a RAR volume convention.
pub fn select_top_part(listing: &[FileEntry]) -> Option<ArchivePart> {
    listing
        .iter()
        .map(ArchivePart::from_entry)
        .fold(None, |best: Option<ArchivePart>, part| {
            let Some(index) = part.index else {
                return best;
            };
            let best_index = best.as_ref().and_then(|b| b.index);
            if best_index.is_some_and(|current| current >= index) {
                best
            } else {
                Some(part)
            }
        })
}
