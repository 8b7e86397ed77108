//! Left join of the primary table against the metrics table.
//!
//! Every primary row produces exactly one output row: its own cells in their
//! original order, then an optional resolved-key column, then one cell per
//! metric field. Rows without a key or without a metrics match get blanks.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use merge_model::{BoundColumn, FieldBinding, JoinKey, MergeSummary, Table, TableRole};

use crate::keys::{KeyResolution, KeySource};

const COLLISION_SUFFIX: &str = "_metrics";

/// Metrics rows by join key. The first row for a key wins.
#[derive(Debug, Clone, Default)]
pub struct MetricsIndex {
    rows: HashMap<JoinKey, usize>,
    duplicates: usize,
}

impl MetricsIndex {
    pub fn build(table: &Table, binding: &FieldBinding, key_field: &str) -> Self {
        let mut index = Self::default();
        let Some(key_idx) = binding.index_of(key_field) else {
            return index;
        };
        for row in 0..table.len() {
            let Some(key) = JoinKey::parse(table.cell(row, key_idx)) else {
                continue;
            };
            match index.rows.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(row);
                }
                Entry::Occupied(_) => index.duplicates += 1,
            }
        }
        if index.duplicates > 0 {
            warn!(
                duplicates = index.duplicates,
                "metrics table repeats join keys; keeping the first row for each"
            );
        }
        index
    }

    pub fn get(&self, key: &JoinKey) -> Option<usize> {
        self.rows.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Metrics rows ignored because their key was already indexed.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Output shaping for [`join`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOptions {
    /// Label of the resolved-key column.
    pub key_field: String,
    /// Insert the resolved key before the metric columns.
    pub include_resolved_key: bool,
}

/// Result of a merge run.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// One row per primary row, in primary order.
    pub table: Table,
    pub summary: MergeSummary,
    /// Raw keys that resolved but had no metrics row, in row order.
    pub unmatched_keys: Vec<String>,
}

/// Builds output labels: primary headers, then `extra` with a suffix added
/// until each label is unique.
pub fn output_headers(primary: &[String], extra: &[&str]) -> Vec<String> {
    let mut used: HashSet<String> = primary.iter().cloned().collect();
    let mut headers = primary.to_vec();
    for label in extra {
        let mut candidate = (*label).to_string();
        while used.contains(&candidate) {
            candidate.push_str(COLLISION_SUFFIX);
        }
        if candidate != *label {
            warn!(
                field = %label,
                output_column = %candidate,
                "output column name already taken; renamed"
            );
        }
        used.insert(candidate.clone());
        headers.push(candidate);
    }
    headers
}

/// Joins primary rows to metrics rows on the resolved keys.
pub fn join(
    primary: &Table,
    keys: &KeyResolution,
    metrics: &Table,
    index: &MetricsIndex,
    metric_columns: &[BoundColumn],
    options: &JoinOptions,
) -> MergeOutcome {
    let mut extra: Vec<&str> = Vec::with_capacity(metric_columns.len() + 1);
    if options.include_resolved_key {
        extra.push(options.key_field.as_str());
    }
    extra.extend(metric_columns.iter().map(|c| c.field.as_str()));
    let headers = output_headers(&primary.headers, &extra);

    let mut summary = MergeSummary {
        total_rows: primary.len(),
        resolved_direct: keys.count(KeySource::Direct),
        resolved_via_map: keys.count(KeySource::ViaMap),
        unresolved: keys.unresolved(),
        duplicate_metric_keys: index.duplicates(),
        map_used: keys.map_used(),
        key_header: keys.key_header.clone(),
        ..MergeSummary::default()
    };
    let mut unmatched_keys = Vec::new();
    let mut rows = Vec::with_capacity(primary.len());

    for (row_idx, source_row) in primary.rows.iter().enumerate() {
        let resolved = keys.keys.get(row_idx).and_then(Option::as_ref);
        let hit = resolved.and_then(|key| index.get(&key.key));
        match (resolved, hit) {
            (_, Some(_)) => summary.matched += 1,
            (Some(key), None) => {
                summary.unmatched += 1;
                unmatched_keys.push(key.raw.clone());
            }
            (None, None) => summary.unmatched += 1,
        }

        let mut row = Vec::with_capacity(headers.len());
        row.extend(source_row.iter().cloned());
        if options.include_resolved_key {
            row.push(resolved.map(|key| key.raw.clone()).unwrap_or_default());
        }
        for column in metric_columns {
            let value = match (hit, column.index) {
                (Some(metrics_row), Some(col)) => metrics.cell(metrics_row, col).to_string(),
                _ => String::new(),
            };
            row.push(value);
        }
        rows.push(row);
    }

    debug!(
        total = summary.total_rows,
        matched = summary.matched,
        unmatched = summary.unmatched,
        "joined metrics"
    );

    MergeOutcome {
        table: Table::new(TableRole::Primary, headers, rows),
        summary,
        unmatched_keys,
    }
}
