//! Merge configuration.
//!
//! All header defaults live on [`MergeConfig::default`]. Callers adjust a
//! config explicitly (CLI flags, a JSON file, tests) and pass it to the
//! schema resolver; nothing is read from ambient state.

use serde::{Deserialize, Serialize};

use merge_model::{LogicalField, MergeError, Result};

/// Logical name of the join key in every table.
pub const DEFAULT_KEY_FIELD: &str = "channel_id";

/// Logical name of the account column used for mapping-table lookups.
pub const LOOKUP_FIELD: &str = "account_name";

/// Primary-table key headers, tried in order.
pub const DEFAULT_PRIMARY_KEY_HEADERS: &[&str] = &[
    "Account.YouTube_Channel_ID__c",
    "YouTube_Channel_ID__c",
    "channel_id",
    "Channel_ID__c",
];

/// Primary-table account headers, tried in order.
pub const DEFAULT_PRIMARY_LOOKUP_HEADERS: &[&str] = &["Account.Name", "account_name", "Account"];

pub const DEFAULT_METRICS_KEY_HEADER: &str = "channel_id";
pub const DEFAULT_MAPPING_LOOKUP_HEADER: &str = "account_name";
pub const DEFAULT_MAPPING_KEY_HEADER: &str = "channel_id";

/// Metric fields attached by default, in output order.
pub const DEFAULT_METRIC_FIELDS: &[&str] = &[
    "channel_name",
    "views_30d",
    "audience_size",
    "category",
    "growth_30d_pct",
];

/// A metric column taken from the metrics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricField {
    /// Logical name; also the output column label.
    pub name: LogicalField,
    /// Header expected in the metrics table.
    pub header: String,
    /// Requested explicitly; a missing column is then a fatal error.
    #[serde(default)]
    pub required: bool,
}

impl MetricField {
    /// Optional field whose header equals its logical name.
    pub fn optional(name: LogicalField) -> Self {
        let header = name.as_str().to_string();
        Self {
            name,
            header,
            required: false,
        }
    }
}

/// Header names and metric selection for one merge run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Logical join key name; labels the resolved key column.
    pub key_field: LogicalField,
    /// Primary key headers, first present wins.
    pub primary_key_headers: Vec<String>,
    /// Primary account headers, first present wins.
    pub primary_lookup_headers: Vec<String>,
    pub metrics_key_header: String,
    pub mapping_lookup_header: String,
    pub mapping_key_header: String,
    /// Metric columns in output order.
    pub metric_fields: Vec<MetricField>,
    /// Add the resolved key as an output column. `None` adds it only when
    /// keys come from a mapping table and the primary table has no key column.
    pub include_resolved_key: Option<bool>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            key_field: builtin_field(DEFAULT_KEY_FIELD),
            primary_key_headers: to_strings(DEFAULT_PRIMARY_KEY_HEADERS),
            primary_lookup_headers: to_strings(DEFAULT_PRIMARY_LOOKUP_HEADERS),
            metrics_key_header: DEFAULT_METRICS_KEY_HEADER.to_string(),
            mapping_lookup_header: DEFAULT_MAPPING_LOOKUP_HEADER.to_string(),
            mapping_key_header: DEFAULT_MAPPING_KEY_HEADER.to_string(),
            metric_fields: DEFAULT_METRIC_FIELDS
                .iter()
                .map(|name| MetricField::optional(builtin_field(name)))
                .collect(),
            include_resolved_key: None,
        }
    }
}

impl MergeConfig {
    /// Replaces the primary key candidates with a single header.
    #[must_use]
    pub fn with_primary_key_header(mut self, header: impl Into<String>) -> Self {
        self.primary_key_headers = vec![header.into()];
        self
    }

    /// Replaces the primary account candidates with a single header.
    #[must_use]
    pub fn with_primary_lookup_header(mut self, header: impl Into<String>) -> Self {
        self.primary_lookup_headers = vec![header.into()];
        self
    }

    #[must_use]
    pub fn with_metrics_key_header(mut self, header: impl Into<String>) -> Self {
        self.metrics_key_header = header.into();
        self
    }

    #[must_use]
    pub fn with_mapping_headers(
        mut self,
        lookup: Option<String>,
        key: Option<String>,
    ) -> Self {
        if let Some(lookup) = lookup {
            self.mapping_lookup_header = lookup;
        }
        if let Some(key) = key {
            self.mapping_key_header = key;
        }
        self
    }

    #[must_use]
    pub fn with_include_resolved_key(mut self, include: Option<bool>) -> Self {
        self.include_resolved_key = include;
        self
    }

    /// Restricts output to `fields`, in that order. Every listed field is
    /// requested, so its column must exist.
    pub fn select_metric_fields(&mut self, fields: &[LogicalField]) {
        let mut selected = Vec::with_capacity(fields.len());
        for field in fields {
            if selected.iter().any(|m: &MetricField| &m.name == field) {
                continue;
            }
            let mut metric = self
                .metric_fields
                .iter()
                .find(|m| &m.name == field)
                .cloned()
                .unwrap_or_else(|| MetricField::optional(field.clone()));
            metric.required = true;
            selected.push(metric);
        }
        self.metric_fields = selected;
    }

    /// Applies parsed `logical:header` overrides.
    ///
    /// An override for the key field rebinds the metrics key header. Other
    /// overrides rebind an existing metric field or append a new one; either
    /// way the field becomes required.
    pub fn apply_overrides(&mut self, overrides: &HeaderOverrides) {
        for (field, header) in overrides.iter() {
            if field == &self.key_field {
                self.metrics_key_header = header.to_string();
                continue;
            }
            match self.metric_fields.iter_mut().find(|m| &m.name == field) {
                Some(metric) => {
                    metric.header = header.to_string();
                    metric.required = true;
                }
                None => self.metric_fields.push(MetricField {
                    name: field.clone(),
                    header: header.to_string(),
                    required: true,
                }),
            }
        }
    }
}

/// Ordered `logical -> header` pairs parsed from an override string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOverrides {
    entries: Vec<(LogicalField, String)>,
}

impl HeaderOverrides {
    /// Parses `logical:header[,logical:header...]`.
    ///
    /// Segments are trimmed and empty segments ignored. The first `:` splits
    /// a segment, so headers may contain colons but not commas.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut entries: Vec<(LogicalField, String)> = Vec::new();
        for segment in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let Some((logical, header)) = segment.split_once(':') else {
                return Err(MergeError::InvalidOverride {
                    entry: segment.to_string(),
                    reason: "expected logical:header".to_string(),
                });
            };
            let (logical, header) = (logical.trim(), header.trim());
            if logical.is_empty() {
                return Err(MergeError::InvalidOverride {
                    entry: segment.to_string(),
                    reason: "logical name is empty".to_string(),
                });
            }
            if header.is_empty() {
                return Err(MergeError::InvalidOverride {
                    entry: segment.to_string(),
                    reason: "header is empty".to_string(),
                });
            }
            let field = LogicalField::new(logical)?;
            if entries.iter().any(|(existing, _)| existing == &field) {
                return Err(MergeError::DuplicateOverride {
                    field: field.to_string(),
                });
            }
            entries.push((field, header.to_string()));
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LogicalField, &str)> {
        self.entries.iter().map(|(field, header)| (field, header.as_str()))
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(f, _)| f.as_str() == field)
            .map(|(_, header)| header.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses a comma-separated list of logical field names.
pub fn parse_field_list(spec: &str) -> Result<Vec<LogicalField>> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(LogicalField::new)
        .collect()
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn builtin_field(name: &str) -> LogicalField {
    // Built-in names are non-empty literals.
    LogicalField::new(name).unwrap_or_else(|_| unreachable!("built-in field name {name:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> LogicalField {
        LogicalField::new(name).unwrap()
    }

    #[test]
    fn parses_pairs_in_order() {
        let overrides =
            HeaderOverrides::parse("channel_id:Channel ID, views_30d : Views (30d) ,").unwrap();
        let pairs: Vec<_> = overrides.iter().map(|(f, h)| (f.as_str(), h)).collect();
        assert_eq!(
            pairs,
            vec![("channel_id", "Channel ID"), ("views_30d", "Views (30d)")]
        );
    }

    #[test]
    fn header_may_contain_colon() {
        let overrides = HeaderOverrides::parse("growth_30d_pct:Growth: 30d %").unwrap();
        assert_eq!(overrides.get("growth_30d_pct"), Some("Growth: 30d %"));
    }

    #[test]
    fn empty_spec_is_empty() {
        assert!(HeaderOverrides::parse("").unwrap().is_empty());
        assert!(HeaderOverrides::parse(" , ,").unwrap().is_empty());
    }

    #[test]
    fn rejects_missing_delimiter() {
        let err = HeaderOverrides::parse("views_30d").unwrap_err();
        assert!(matches!(err, MergeError::InvalidOverride { ref entry, .. } if entry == "views_30d"));
    }

    #[test]
    fn rejects_empty_logical_name() {
        let err = HeaderOverrides::parse(":Views").unwrap_err();
        assert!(matches!(err, MergeError::InvalidOverride { .. }));
    }

    #[test]
    fn rejects_empty_header() {
        let err = HeaderOverrides::parse("views_30d: ").unwrap_err();
        assert!(matches!(err, MergeError::InvalidOverride { .. }));
    }

    #[test]
    fn rejects_duplicate_field() {
        let err = HeaderOverrides::parse("views_30d:A,views_30d:B").unwrap_err();
        assert_eq!(
            err,
            MergeError::DuplicateOverride {
                field: "views_30d".to_string()
            }
        );
    }

    #[test]
    fn key_override_rebinds_metrics_key() {
        let mut config = MergeConfig::default();
        config.apply_overrides(&HeaderOverrides::parse("channel_id:Channel ID").unwrap());
        assert_eq!(config.metrics_key_header, "Channel ID");
        assert!(config.metric_fields.iter().all(|m| !m.required));
    }

    #[test]
    fn metric_override_marks_required_and_appends_new() {
        let mut config = MergeConfig::default();
        config.apply_overrides(
            &HeaderOverrides::parse("views_30d:Views (30d),engagement:Engagement").unwrap(),
        );
        let views = config
            .metric_fields
            .iter()
            .find(|m| m.name.as_str() == "views_30d")
            .unwrap();
        assert_eq!(views.header, "Views (30d)");
        assert!(views.required);
        let last = config.metric_fields.last().unwrap();
        assert_eq!(last.name.as_str(), "engagement");
        assert!(last.required);
        assert_eq!(config.metric_fields.len(), DEFAULT_METRIC_FIELDS.len() + 1);
    }

    #[test]
    fn select_keeps_given_order_and_requires() {
        let mut config = MergeConfig::default();
        config.select_metric_fields(&[field("views_30d"), field("channel_name"), field("views_30d")]);
        let names: Vec<_> = config.metric_fields.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["views_30d", "channel_name"]);
        assert!(config.metric_fields.iter().all(|m| m.required));
    }

    #[test]
    fn parse_field_list_skips_blanks() {
        let fields = parse_field_list("views_30d, ,category").unwrap();
        assert_eq!(fields, vec![field("views_30d"), field("category")]);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = MergeConfig::default().with_primary_key_header("Channel");
        let json = serde_json::to_string(&config).unwrap();
        let back: MergeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: MergeConfig =
            serde_json::from_str(r#"{"metrics_key_header": "Channel ID"}"#).unwrap();
        assert_eq!(config.metrics_key_header, "Channel ID");
        assert_eq!(config.primary_lookup_headers, MergeConfig::default().primary_lookup_headers);
    }
}
