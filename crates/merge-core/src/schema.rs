//! Schema resolution: binds logical fields to the headers of each table.
//!
//! Resolution is pure. Given the same header and the same [`MergeConfig`] it
//! always yields the same [`FieldBinding`]. Any required field without a
//! matching header fails the whole run before a single row is looked at.

use tracing::{debug, warn};

use merge_model::{BoundColumn, FieldBinding, LogicalField, MergeError, Result, Table, TableRole};

use crate::config::{LOOKUP_FIELD, MergeConfig};

/// Bindings for every table in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    /// Key (absent when keys come only from the mapping table) and, with a
    /// mapping table, the account lookup column.
    pub primary: FieldBinding,
    /// Key followed by the metric fields in configuration order.
    pub metrics: FieldBinding,
    /// Lookup and key columns of the mapping table.
    pub mapping: Option<FieldBinding>,
}

impl ResolvedSchema {
    /// Metric columns of the metrics table, without its key.
    pub fn metric_columns(&self) -> &[BoundColumn] {
        self.metrics.columns().get(1..).unwrap_or_default()
    }
}

/// Finds the column for `wanted`: exact match first, then a
/// case-insensitive match on [`header_key`].
pub fn find_header(headers: &[String], wanted: &str) -> Option<usize> {
    if let Some(idx) = headers.iter().position(|h| h == wanted) {
        return Some(idx);
    }
    let wanted = header_key(wanted);
    if wanted.is_empty() {
        return None;
    }
    headers.iter().position(|h| header_key(h) == wanted)
}

/// Lookup form of a header: trimmed, inner whitespace collapsed to one
/// space, lowercased. Table headers themselves are never rewritten.
pub fn header_key(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Binds one field to the first candidate header present in `table`.
pub fn bind_field(
    table: &Table,
    field: &LogicalField,
    candidates: &[String],
    required: bool,
) -> Result<BoundColumn> {
    for candidate in candidates {
        if let Some(idx) = find_header(&table.headers, candidate) {
            return Ok(BoundColumn::present(
                field.clone(),
                table.headers[idx].clone(),
                idx,
            ));
        }
    }
    if required {
        return Err(MergeError::MissingColumn {
            table: table.role,
            field: field.to_string(),
            tried: candidates.to_vec(),
        });
    }
    Ok(BoundColumn::absent(field.clone()))
}

/// Resolves bindings for the primary, metrics and optional mapping tables.
pub fn resolve_schema(
    config: &MergeConfig,
    primary: &Table,
    metrics: &Table,
    mapping: Option<&Table>,
) -> Result<ResolvedSchema> {
    let lookup_field = LogicalField::new(LOOKUP_FIELD)?;
    let has_mapping = mapping.is_some();

    let key_column = bind_field(
        primary,
        &config.key_field,
        &config.primary_key_headers,
        !has_mapping,
    )?;
    // The account column only matters as a fallback for rows without a key.
    let lookup_required = has_mapping && !key_column.is_present();
    let mut primary_columns = vec![key_column];
    if has_mapping {
        primary_columns.push(bind_field(
            primary,
            &lookup_field,
            &config.primary_lookup_headers,
            lookup_required,
        )?);
    }
    let primary_binding = FieldBinding::new(TableRole::Primary, primary_columns);

    let mut metric_columns = Vec::with_capacity(config.metric_fields.len() + 1);
    metric_columns.push(bind_field(
        metrics,
        &config.key_field,
        std::slice::from_ref(&config.metrics_key_header),
        true,
    )?);
    for metric in &config.metric_fields {
        let column = bind_field(
            metrics,
            &metric.name,
            std::slice::from_ref(&metric.header),
            metric.required,
        )?;
        if !column.is_present() {
            warn!(
                field = %metric.name,
                header = %metric.header,
                "metrics table has no column for optional field; output will be blank"
            );
        }
        metric_columns.push(column);
    }
    let metrics_binding = FieldBinding::new(TableRole::Metrics, metric_columns);

    let mapping_binding = match mapping {
        Some(table) => Some(FieldBinding::new(
            TableRole::Mapping,
            vec![
                bind_field(
                    table,
                    &lookup_field,
                    std::slice::from_ref(&config.mapping_lookup_header),
                    true,
                )?,
                bind_field(
                    table,
                    &config.key_field,
                    std::slice::from_ref(&config.mapping_key_header),
                    true,
                )?,
            ],
        )),
        None => None,
    };

    for binding in [Some(&primary_binding), Some(&metrics_binding), mapping_binding.as_ref()]
        .into_iter()
        .flatten()
    {
        for column in binding.columns() {
            debug!(
                table = %binding.role,
                field = %column.field,
                header = column.header.as_deref().unwrap_or("-"),
                "bound field"
            );
        }
    }

    Ok(ResolvedSchema {
        primary: primary_binding,
        metrics: metrics_binding,
        mapping: mapping_binding,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeaderOverrides;

    fn table(role: TableRole, headers: &[&str]) -> Table {
        Table::empty(role, headers.iter().map(|h| (*h).to_string()).collect())
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn find_header_prefers_exact() {
        let headers = strings(&["CHANNEL_ID", "channel_id"]);
        assert_eq!(find_header(&headers, "channel_id"), Some(1));
        assert_eq!(find_header(&headers, "Channel_Id"), Some(0));
        assert_eq!(find_header(&headers, "views"), None);
        assert_eq!(find_header(&headers, ""), None);
    }

    #[test]
    fn find_header_ignores_spacing_differences() {
        let headers = strings(&["Account Name", " Views   (30d) "]);
        assert_eq!(find_header(&headers, "views (30d)"), Some(1));
        assert_eq!(find_header(&headers, "  account   name"), Some(0));
        assert_eq!(header_key("\tViews \n (30d)"), "views (30d)");
    }

    #[test]
    fn bind_field_uses_first_present_candidate() {
        let primary = table(TableRole::Primary, &["Name", "channel_id", "YouTube_Channel_ID__c"]);
        let field = LogicalField::new("channel_id").unwrap();
        let column = bind_field(
            &primary,
            &field,
            &strings(&["Account.YouTube_Channel_ID__c", "YouTube_Channel_ID__c", "channel_id"]),
            true,
        )
        .unwrap();
        assert_eq!(column.header.as_deref(), Some("YouTube_Channel_ID__c"));
        assert_eq!(column.index, Some(2));
    }

    #[test]
    fn optional_missing_field_is_absent() {
        let metrics = table(TableRole::Metrics, &["channel_id"]);
        let field = LogicalField::new("category").unwrap();
        let column = bind_field(&metrics, &field, &strings(&["category"]), false).unwrap();
        assert!(!column.is_present());
    }

    #[test]
    fn metrics_without_key_fails() {
        let primary = table(TableRole::Primary, &["channel_id"]);
        let metrics = table(TableRole::Metrics, &["Channel", "views_30d"]);
        let err = resolve_schema(&MergeConfig::default(), &primary, &metrics, None).unwrap_err();
        assert_eq!(
            err,
            MergeError::MissingColumn {
                table: TableRole::Metrics,
                field: "channel_id".to_string(),
                tried: strings(&["channel_id"]),
            }
        );
    }

    #[test]
    fn primary_key_required_without_mapping() {
        let primary = table(TableRole::Primary, &["Account.Name"]);
        let metrics = table(TableRole::Metrics, &["channel_id"]);
        let err = resolve_schema(&MergeConfig::default(), &primary, &metrics, None).unwrap_err();
        assert!(matches!(
            err,
            MergeError::MissingColumn { table: TableRole::Primary, .. }
        ));
    }

    #[test]
    fn primary_key_optional_with_mapping() {
        let primary = table(TableRole::Primary, &["Account.Name"]);
        let metrics = table(TableRole::Metrics, &["channel_id"]);
        let mapping = table(TableRole::Mapping, &["account_name", "channel_id"]);
        let schema =
            resolve_schema(&MergeConfig::default(), &primary, &metrics, Some(&mapping)).unwrap();
        assert_eq!(schema.primary.index_of("channel_id"), None);
        assert_eq!(schema.primary.header_of("account_name"), Some("Account.Name"));
        let mapping = schema.mapping.unwrap();
        assert_eq!(mapping.index_of("account_name"), Some(0));
        assert_eq!(mapping.index_of("channel_id"), Some(1));
    }

    #[test]
    fn primary_lookup_optional_when_key_column_present() {
        let primary = table(TableRole::Primary, &["channel_id", "Amount"]);
        let metrics = table(TableRole::Metrics, &["channel_id"]);
        let mapping = table(TableRole::Mapping, &["account_name", "channel_id"]);
        let schema =
            resolve_schema(&MergeConfig::default(), &primary, &metrics, Some(&mapping)).unwrap();
        assert_eq!(schema.primary.index_of("channel_id"), Some(0));
        assert_eq!(schema.primary.index_of("account_name"), None);
    }

    #[test]
    fn primary_lookup_required_without_key_column() {
        let primary = table(TableRole::Primary, &["Amount"]);
        let metrics = table(TableRole::Metrics, &["channel_id"]);
        let mapping = table(TableRole::Mapping, &["account_name", "channel_id"]);
        let err = resolve_schema(&MergeConfig::default(), &primary, &metrics, Some(&mapping))
            .unwrap_err();
        assert!(matches!(
            err,
            MergeError::MissingColumn { table: TableRole::Primary, ref field, .. } if field == "account_name"
        ));
    }

    #[test]
    fn mapping_requires_its_columns() {
        let primary = table(TableRole::Primary, &["Account.Name"]);
        let metrics = table(TableRole::Metrics, &["channel_id"]);
        let mapping = table(TableRole::Mapping, &["account", "channel_id"]);
        let err = resolve_schema(&MergeConfig::default(), &primary, &metrics, Some(&mapping))
            .unwrap_err();
        assert!(matches!(
            err,
            MergeError::MissingColumn { table: TableRole::Mapping, ref field, .. } if field == "account_name"
        ));
    }

    #[test]
    fn requested_metric_missing_fails() {
        let primary = table(TableRole::Primary, &["channel_id"]);
        let metrics = table(TableRole::Metrics, &["channel_id", "views_30d"]);
        let mut config = MergeConfig::default();
        config.apply_overrides(&HeaderOverrides::parse("audience_size:Subscribers").unwrap());
        let err = resolve_schema(&config, &primary, &metrics, None).unwrap_err();
        assert!(matches!(
            err,
            MergeError::MissingColumn { table: TableRole::Metrics, ref field, .. } if field == "audience_size"
        ));
    }

    #[test]
    fn metric_binding_follows_config_order() {
        let primary = table(TableRole::Primary, &["channel_id"]);
        let metrics = table(TableRole::Metrics, &["views_30d", "channel_id", "channel_name"]);
        let schema = resolve_schema(&MergeConfig::default(), &primary, &metrics, None).unwrap();
        let fields: Vec<_> = schema
            .metrics
            .columns()
            .iter()
            .map(|c| c.field.as_str())
            .collect();
        assert_eq!(
            fields,
            vec!["channel_id", "channel_name", "views_30d", "audience_size", "category", "growth_30d_pct"]
        );
        assert_eq!(schema.metrics.index_of("channel_id"), Some(1));
        assert_eq!(schema.metrics.index_of("views_30d"), Some(0));
        assert_eq!(schema.metrics.index_of("category"), None);
    }
}
