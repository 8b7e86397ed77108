//! Error types for merge configuration and schema resolution.

use thiserror::Error;

use crate::table::TableRole;

/// Errors that abort a merge run before any row is processed.
///
/// Rows whose join key cannot be resolved are not errors; they are counted
/// in [`crate::MergeSummary`] instead. File errors live in `merge-ingest`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    // === Configuration Errors ===
    /// An override entry could not be parsed.
    #[error("invalid header override '{entry}': {reason}")]
    InvalidOverride { entry: String, reason: String },

    /// The same logical field was overridden twice.
    #[error("header override for '{field}' given more than once")]
    DuplicateOverride { field: String },

    /// A logical field name is empty or otherwise unusable.
    #[error("invalid logical field name '{name}'")]
    InvalidField { name: String },

    // === Schema Errors ===
    /// A required logical field could not be bound to any header.
    #[error("{table} table has no column for '{field}' (tried: {})", tried.join(", "))]
    MissingColumn {
        table: TableRole,
        field: String,
        tried: Vec<String>,
    },
}

impl MergeError {
    /// True for malformed configuration, false for schema mismatches.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::MissingColumn { .. })
    }
}

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_names_table_and_field() {
        let err = MergeError::MissingColumn {
            table: TableRole::Metrics,
            field: "channel_id".to_string(),
            tried: vec!["channel_id".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "metrics table has no column for 'channel_id' (tried: channel_id)"
        );
        assert!(!err.is_configuration());
    }

    #[test]
    fn override_errors_are_configuration() {
        let err = MergeError::InvalidOverride {
            entry: "views".to_string(),
            reason: "expected logical:header".to_string(),
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("'views'"));
    }
}
