use anyhow::Result;
use tracing::info_span;

use merge_cli::pipeline::{
    ConfigOverrides, MergeRequest, build_config, load_config_file, preview_file, run_merge,
};
use merge_cli::types::MergeRunResult;
use merge_core::MergeConfig;
use merge_ingest::CsvOptions;

use crate::cli::{FieldsArgs, MergeArgs, PreviewArgs};
use crate::summary::{print_fields, print_preview};

pub fn run_merge_command(args: &MergeArgs) -> Result<MergeRunResult> {
    let span = info_span!("merge_command", out = %args.out.display());
    let _guard = span.enter();

    // Configuration is fully parsed before any input file is opened.
    let base = match &args.config {
        Some(path) => load_config_file(path)?,
        None => MergeConfig::default(),
    };
    let config = build_config(base, &config_overrides(args))?;
    let request = MergeRequest {
        opps: args.opps.clone(),
        metrics: args.metrics.clone(),
        map: args.map.clone(),
        out: args.out.clone(),
        config,
        csv: CsvOptions::default().with_delimiter(args.delimiter),
        dry_run: args.dry_run,
    };
    let result = run_merge(&request)?;
    if let Some(rows) = args.preview {
        let mut shown = result.outcome.table.clone();
        shown.rows.truncate(rows);
        print_preview("Merged preview", &shown, result.outcome.table.len());
    }
    Ok(result)
}

pub fn run_preview(args: &PreviewArgs) -> Result<()> {
    let options = CsvOptions::default().with_delimiter(args.delimiter);
    let (table, total) = preview_file(&args.file, args.rows, options)?;
    print_preview(&args.file.display().to_string(), &table, total);
    Ok(())
}

pub fn run_fields(args: &FieldsArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => MergeConfig::default(),
    };
    print_fields(&config);
    Ok(())
}

fn config_overrides(args: &MergeArgs) -> ConfigOverrides {
    let include_resolved_key = if args.include_resolved_key {
        Some(true)
    } else if args.no_resolved_key {
        Some(false)
    } else {
        None
    };
    ConfigOverrides {
        metrics_cols: args.metrics_cols.clone(),
        fields: args.fields.clone(),
        opps_key: args.opps_key.clone(),
        opps_lookup: args.opps_lookup.clone(),
        metrics_key: args.metrics_key.clone(),
        map_key: args.map_key.clone(),
        map_lookup: args.map_lookup.clone(),
        include_resolved_key,
    }
}
