//! CLI argument definitions for opps-merge.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "opps-merge",
    version,
    about = "Merge CRM opportunity exports with channel metrics exports",
    long_about = "Left-join a CRM opportunity CSV with a channel metrics CSV on channel id.\n\n\
                  When opportunities carry no channel id, an optional account map CSV\n\
                  (account_name,channel_id) resolves it by account name. Every opportunity\n\
                  row is kept; unmatched rows get blank metric columns."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow cell values (account names, channel ids) in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge opportunities with channel metrics.
    Merge(MergeArgs),

    /// Show the header and first rows of a CSV file.
    Preview(PreviewArgs),

    /// List the logical fields and the headers they bind to.
    Fields(FieldsArgs),
}

#[derive(Args)]
pub struct MergeArgs {
    /// CRM opportunity export (primary table; every row is kept).
    #[arg(long = "opps", value_name = "PATH")]
    pub opps: PathBuf,

    /// Channel metrics export.
    #[arg(long = "metrics", value_name = "PATH")]
    pub metrics: PathBuf,

    /// Account-to-channel map used when opportunities lack a channel id.
    #[arg(long = "map", value_name = "PATH")]
    pub map: Option<PathBuf>,

    /// Output CSV path.
    #[arg(long = "out", value_name = "PATH")]
    pub out: PathBuf,

    /// Metrics header mapping, e.g. "channel_id:Channel ID,views_30d:Views (30d)".
    ///
    /// Every field named here must exist in the metrics file.
    #[arg(long = "metrics-cols", value_name = "SPEC")]
    pub metrics_cols: Option<String>,

    /// Metric fields to attach, in order (default: channel_name, views_30d,
    /// audience_size, category, growth_30d_pct). Listed fields are required.
    #[arg(long = "fields", value_name = "LIST")]
    pub fields: Option<String>,

    /// Channel id header in the opportunity file.
    #[arg(long = "opps-key", value_name = "HEADER")]
    pub opps_key: Option<String>,

    /// Account name header in the opportunity file (used with --map).
    #[arg(long = "opps-lookup", value_name = "HEADER")]
    pub opps_lookup: Option<String>,

    /// Channel id header in the metrics file (default: channel_id).
    #[arg(long = "metrics-key", value_name = "HEADER")]
    pub metrics_key: Option<String>,

    /// Channel id header in the map file (default: channel_id).
    #[arg(long = "map-key", value_name = "HEADER")]
    pub map_key: Option<String>,

    /// Account name header in the map file (default: account_name).
    #[arg(long = "map-lookup", value_name = "HEADER")]
    pub map_lookup: Option<String>,

    /// Always add the resolved channel id as an output column.
    #[arg(long = "include-resolved-key", conflicts_with = "no_resolved_key")]
    pub include_resolved_key: bool,

    /// Never add the resolved channel id column.
    #[arg(long = "no-resolved-key")]
    pub no_resolved_key: bool,

    /// JSON merge configuration; flags override its values.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Field delimiter for all input and output files.
    #[arg(long = "delimiter", value_name = "CHAR", default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Merge and report without writing the output file.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Print the first N merged rows.
    #[arg(long = "preview", value_name = "N")]
    pub preview: Option<usize>,
}

#[derive(Args)]
pub struct PreviewArgs {
    /// CSV file to show.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Number of data rows to show.
    #[arg(long = "rows", default_value_t = 5)]
    pub rows: usize,

    /// Field delimiter.
    #[arg(long = "delimiter", value_name = "CHAR", default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,
}

#[derive(Args)]
pub struct FieldsArgs {
    /// JSON merge configuration to list instead of the defaults.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

/// Accepts a single ASCII character, or `tab` / `\t`.
pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if ch.is_ascii() => Ok(ch as u8),
        _ => Err(format!("delimiter must be a single ASCII character, got '{value}'")),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn merge_requires_paths() {
        let result = Cli::try_parse_from(["opps-merge", "merge", "--opps", "a.csv"]);
        assert!(result.is_err());
    }

    #[test]
    fn merge_parses_overrides() {
        let cli = Cli::try_parse_from([
            "opps-merge",
            "merge",
            "--opps",
            "opps.csv",
            "--metrics",
            "tubular.csv",
            "--out",
            "merged.csv",
            "--metrics-cols",
            "views_30d:Views (30d)",
            "--delimiter",
            ";",
        ])
        .unwrap();
        let Command::Merge(args) = cli.command else {
            panic!("expected merge command");
        };
        assert_eq!(args.metrics_cols.as_deref(), Some("views_30d:Views (30d)"));
        assert_eq!(args.delimiter, b';');
        assert!(args.map.is_none());
    }

    #[test]
    fn fields_accepts_config() {
        let cli = Cli::try_parse_from(["opps-merge", "fields", "--config", "merge.json"]).unwrap();
        let Command::Fields(args) = cli.command else {
            panic!("expected fields command");
        };
        assert_eq!(args.config, Some(PathBuf::from("merge.json")));
    }

    #[test]
    fn delimiter_parsing() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("|"), Ok(b'|'));
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("é").is_err());
    }
}
