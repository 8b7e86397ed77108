use std::path::PathBuf;

use merge_core::MergeOutcome;

/// Result of one `merge` command.
#[derive(Debug)]
pub struct MergeRunResult {
    /// Requested output path.
    pub out: PathBuf,
    /// False for dry runs.
    pub written: bool,
    pub outcome: MergeOutcome,
}
