#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which input a table came from. Used to attribute errors and log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRole {
    /// CRM opportunity export; every row survives into the output.
    Primary,
    /// Channel metrics export joined onto the primary rows.
    Metrics,
    /// Optional account-to-channel map.
    Mapping,
}

impl TableRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Metrics => "metrics",
            Self::Mapping => "mapping",
        }
    }
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-memory table with an ordered header.
///
/// Every row has exactly `headers.len()` cells; [`Table::new`] pads short rows
/// with blanks and drops cells past the header width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub role: TableRole,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(role: TableRole, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            role,
            headers,
            rows,
        }
    }

    /// Creates a table with a header and no rows.
    pub fn empty(role: TableRole, headers: Vec<String>) -> Self {
        Self {
            role,
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a header, exact match.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn has_column(&self, header: &str) -> bool {
        self.column_index(header).is_some()
    }

    /// Cell at (row, column); blank when either index is out of range.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}
