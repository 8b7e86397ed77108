//! Field bindings: logical field name to actual column header.
//!
//! A binding is built once per table per run by the schema resolver and is
//! read-only afterwards. Rows are looked up through the stored column index,
//! so a binding is only meaningful for the table it was resolved against.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};
use crate::table::TableRole;

/// A logical field name such as `channel_id` or `views_30d`.
///
/// Names are trimmed and must be non-empty. Logical names label output
/// columns, so they are kept verbatim otherwise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalField(String);

impl LogicalField {
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MergeError::InvalidField {
                name: name.as_ref().to_string(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LogicalField {
    type Error = MergeError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<LogicalField> for String {
    fn from(value: LogicalField) -> Self {
        value.0
    }
}

/// One logical field resolved against a table header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundColumn {
    pub field: LogicalField,
    /// Header actually present in the table, `None` for an absent optional field.
    pub header: Option<String>,
    /// Column position of `header`.
    pub index: Option<usize>,
}

impl BoundColumn {
    pub fn present(field: LogicalField, header: String, index: usize) -> Self {
        Self {
            field,
            header: Some(header),
            index: Some(index),
        }
    }

    pub fn absent(field: LogicalField) -> Self {
        Self {
            field,
            header: None,
            index: None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.index.is_some()
    }
}

/// Logical fields of one table bound to that table's headers, in
/// configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub role: TableRole,
    columns: Vec<BoundColumn>,
}

impl FieldBinding {
    pub fn new(role: TableRole, columns: Vec<BoundColumn>) -> Self {
        Self { role, columns }
    }

    pub fn columns(&self) -> &[BoundColumn] {
        &self.columns
    }

    pub fn get(&self, field: &str) -> Option<&BoundColumn> {
        self.columns.iter().find(|c| c.field.as_str() == field)
    }

    /// Column index for a bound field, `None` when unbound or absent.
    pub fn index_of(&self, field: &str) -> Option<usize> {
        self.get(field).and_then(|c| c.index)
    }

    pub fn header_of(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(|c| c.header.as_deref())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_field_trims_and_rejects_empty() {
        assert_eq!(LogicalField::new(" views_30d ").unwrap().as_str(), "views_30d");
        assert!(matches!(
            LogicalField::new("  "),
            Err(MergeError::InvalidField { .. })
        ));
    }

    #[test]
    fn binding_lookup() {
        let field = LogicalField::new("views_30d").unwrap();
        let other = LogicalField::new("category").unwrap();
        let binding = FieldBinding::new(
            TableRole::Metrics,
            vec![
                BoundColumn::present(field, "Views (30d)".to_string(), 2),
                BoundColumn::absent(other),
            ],
        );
        assert_eq!(binding.index_of("views_30d"), Some(2));
        assert_eq!(binding.header_of("views_30d"), Some("Views (30d)"));
        assert_eq!(binding.index_of("category"), None);
        assert!(binding.get("category").is_some());
        assert!(binding.get("missing").is_none());
    }
}
