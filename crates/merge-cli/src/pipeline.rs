//! Merge run with explicit stages.
//!
//! 1. **Configure**: parse overrides into a [`MergeConfig`] (no file read yet)
//! 2. **Ingest**: read the primary, metrics and optional mapping CSVs
//! 3. **Merge**: resolve bindings and keys, join ([`merge_core::merge_tables`])
//! 4. **Output**: write the merged CSV atomically, unless dry-run
//!
//! Any error in stages 1-3 returns before stage 4, so no output file is
//! created or touched.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, info_span};

use merge_core::{HeaderOverrides, MergeConfig, merge_tables, parse_field_list};
use merge_ingest::{CsvOptions, read_csv_table, write_csv_table};
use merge_model::{MergeError, Table, TableRole};

use crate::logging::redact_value;
use crate::types::MergeRunResult;

/// How many unmatched keys to show in debug logs.
const UNMATCHED_SAMPLE: usize = 5;

// ============================================================================
// Stage 1: Configure
// ============================================================================

/// Header and field settings collected from the command line.
///
/// Each `Some` replaces the corresponding [`MergeConfig`] value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `logical:header[,logical:header...]` metric header overrides.
    pub metrics_cols: Option<String>,
    /// Comma-separated metric field list.
    pub fields: Option<String>,
    pub opps_key: Option<String>,
    pub opps_lookup: Option<String>,
    pub metrics_key: Option<String>,
    pub map_key: Option<String>,
    pub map_lookup: Option<String>,
    pub include_resolved_key: Option<bool>,
}

/// Loads a JSON [`MergeConfig`]. Missing keys take their defaults.
pub fn load_config_file(path: &Path) -> Result<MergeConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse config: {}", path.display()))
}

/// Applies command-line settings on top of `base`.
///
/// Order: field list, then header overrides, then per-table header flags.
pub fn build_config(base: MergeConfig, overrides: &ConfigOverrides) -> Result<MergeConfig> {
    let mut config = base;
    if let Some(spec) = &overrides.fields {
        let fields = parse_field_list(spec).context("parse --fields")?;
        config.select_metric_fields(&fields);
    }
    if let Some(spec) = &overrides.metrics_cols {
        let parsed = HeaderOverrides::parse(spec).context("parse --metrics-cols")?;
        config.apply_overrides(&parsed);
    }
    if let Some(header) = &overrides.opps_key {
        config = config.with_primary_key_header(header.clone());
    }
    if let Some(header) = &overrides.opps_lookup {
        config = config.with_primary_lookup_header(header.clone());
    }
    if let Some(header) = &overrides.metrics_key {
        config = config.with_metrics_key_header(header.clone());
    }
    config = config.with_mapping_headers(overrides.map_lookup.clone(), overrides.map_key.clone());
    if overrides.include_resolved_key.is_some() {
        config = config.with_include_resolved_key(overrides.include_resolved_key);
    }
    Ok(config)
}

// ============================================================================
// Stage 2: Ingest
// ============================================================================

/// Input tables for one run.
#[derive(Debug)]
pub struct IngestResult {
    pub primary: Table,
    pub metrics: Table,
    pub mapping: Option<Table>,
}

/// Everything needed to run a merge.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub opps: PathBuf,
    pub metrics: PathBuf,
    pub map: Option<PathBuf>,
    pub out: PathBuf,
    pub config: MergeConfig,
    pub csv: CsvOptions,
    /// Merge and report without writing `out`.
    pub dry_run: bool,
}

impl MergeRequest {
    /// Input file for a table role; mapping falls back to the primary path
    /// when no map is set.
    pub fn path_for(&self, role: TableRole) -> &Path {
        match role {
            TableRole::Primary => &self.opps,
            TableRole::Metrics => &self.metrics,
            TableRole::Mapping => self.map.as_deref().unwrap_or(&self.opps),
        }
    }
}

/// Reads all input tables.
pub fn ingest(request: &MergeRequest) -> Result<IngestResult> {
    let read = |path: &Path, role: TableRole| {
        read_csv_table(path, role, request.csv).with_context(|| format!("load {role} table"))
    };
    let primary = read(&request.opps, TableRole::Primary)?;
    let metrics = read(&request.metrics, TableRole::Metrics)?;
    let mapping = match &request.map {
        Some(path) => Some(read(path, TableRole::Mapping)?),
        None => None,
    };
    Ok(IngestResult {
        primary,
        metrics,
        mapping,
    })
}

// ============================================================================
// Stages 2-4
// ============================================================================

/// Runs ingest, merge and output for a request.
pub fn run_merge(request: &MergeRequest) -> Result<MergeRunResult> {
    let ingest_span = info_span!("ingest", opps = %request.opps.display());
    let ingest_start = Instant::now();
    let inputs = ingest_span.in_scope(|| ingest(request))?;
    info!(
        primary_rows = inputs.primary.len(),
        metrics_rows = inputs.metrics.len(),
        mapping_rows = inputs.mapping.as_ref().map(Table::len),
        duration_ms = ingest_start.elapsed().as_millis(),
        "ingest complete"
    );

    let outcome = merge_tables(
        &request.config,
        &inputs.primary,
        &inputs.metrics,
        inputs.mapping.as_ref(),
    )
    .map_err(|err| {
        let path = match &err {
            MergeError::MissingColumn { table, .. } => Some(request.path_for(*table)),
            _ => None,
        };
        let err = anyhow::Error::new(err);
        match path {
            Some(path) => err.context(format!("resolve columns in {}", path.display())),
            None => err.context("merge tables"),
        }
    })?;

    for key in outcome.unmatched_keys.iter().take(UNMATCHED_SAMPLE) {
        debug!(key = redact_value(key), "no metrics row for key");
    }

    let written = if request.dry_run {
        info!("dry run; output not written");
        false
    } else {
        let output_span = info_span!("output", out = %request.out.display());
        output_span.in_scope(|| write_csv_table(&request.out, &outcome.table, request.csv))
            .with_context(|| format!("write output: {}", request.out.display()))?;
        info!(rows = outcome.table.len(), "output written");
        true
    };

    Ok(MergeRunResult {
        out: request.out.clone(),
        written,
        outcome,
    })
}

/// Reads a CSV for display, keeping at most `rows` data rows.
pub fn preview_file(path: &Path, rows: usize, csv: CsvOptions) -> Result<(Table, usize)> {
    let mut table = read_csv_table(path, TableRole::Primary, csv)
        .with_context(|| format!("preview {}", path.display()))?;
    let total = table.len();
    table.rows.truncate(rows);
    Ok((table, total))
}
