//! Merge engine: schema resolution, key resolution, then a left join.
//!
//! The stages run in that order on fully loaded tables:
//! 1. **Schema**: bind logical fields to headers in each table ([`schema`])
//! 2. **Keys**: resolve one join key per primary row ([`keys`])
//! 3. **Join**: attach metric columns and count matches ([`join`])
//!
//! Schema problems abort the run. Key gaps only affect their own rows.

pub mod config;
pub mod join;
pub mod keys;
pub mod schema;

use std::time::Instant;

use tracing::{info, info_span};

use merge_model::{Result, Table};

pub use config::{
    DEFAULT_KEY_FIELD, DEFAULT_METRIC_FIELDS, HeaderOverrides, LOOKUP_FIELD, MergeConfig,
    MetricField, parse_field_list,
};
pub use join::{JoinOptions, MergeOutcome, MetricsIndex, join, output_headers};
pub use keys::{KeyResolution, KeySource, MappingIndex, ResolvedKey, resolve_keys};
pub use schema::{ResolvedSchema, bind_field, find_header, resolve_schema};

/// Runs all merge stages over loaded tables.
///
/// Fails only on schema errors; nothing is produced in that case.
pub fn merge_tables(
    config: &MergeConfig,
    primary: &Table,
    metrics: &Table,
    mapping: Option<&Table>,
) -> Result<MergeOutcome> {
    let span = info_span!(
        "merge",
        primary_rows = primary.len(),
        metrics_rows = metrics.len(),
        mapping_rows = mapping.map(Table::len)
    );
    let _guard = span.enter();
    let start = Instant::now();
    let key_field = config.key_field.as_str();

    let schema = resolve_schema(config, primary, metrics, mapping)?;

    let mapping_index = match (mapping, schema.mapping.as_ref()) {
        (Some(table), Some(binding)) => Some(MappingIndex::build(table, binding, key_field)),
        _ => None,
    };
    let keys = resolve_keys(primary, &schema.primary, key_field, mapping_index.as_ref());

    let include_resolved_key = config
        .include_resolved_key
        .unwrap_or(mapping.is_some() && schema.primary.index_of(key_field).is_none())
        && !primary.has_column(key_field);

    let metrics_index = MetricsIndex::build(metrics, &schema.metrics, key_field);
    let outcome = join(
        primary,
        &keys,
        metrics,
        &metrics_index,
        schema.metric_columns(),
        &JoinOptions {
            key_field: key_field.to_string(),
            include_resolved_key,
        },
    );

    info!(
        total = outcome.summary.total_rows,
        matched = outcome.summary.matched,
        unmatched = outcome.summary.unmatched,
        via_map = outcome.summary.resolved_via_map,
        duration_ms = start.elapsed().as_millis(),
        "merge complete"
    );
    Ok(outcome)
}
