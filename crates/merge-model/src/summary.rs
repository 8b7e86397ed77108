use serde::{Deserialize, Serialize};

/// Match statistics for one merge run.
///
/// Displayed to the operator; never written into the output table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Primary rows in, merged rows out.
    pub total_rows: usize,
    /// Rows whose resolved key found a metrics row.
    pub matched: usize,
    /// Rows with no key or no metrics row for their key.
    pub unmatched: usize,
    /// Keys taken from the primary table itself.
    pub resolved_direct: usize,
    /// Keys found through the mapping table.
    pub resolved_via_map: usize,
    /// Rows with no key at all.
    pub unresolved: usize,
    /// Metrics rows skipped because an earlier row had the same key.
    pub duplicate_metric_keys: usize,
    /// True when at least one key came from the mapping table.
    pub map_used: bool,
    /// Primary header that supplied direct keys.
    pub key_header: Option<String>,
}

impl MergeSummary {
    /// Share of primary rows that matched, 0.0 for an empty table.
    pub fn match_rate(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.matched as f64 / self.total_rows as f64
        }
    }
}
