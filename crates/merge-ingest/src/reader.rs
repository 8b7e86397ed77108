//! CSV reading.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, warn};

use merge_model::{Table, TableRole};

use crate::error::{IngestError, Result};

const BOM: char = '\u{feff}';

/// Options shared by reading and writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvOptions {
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

fn strip_bom(raw: &str) -> String {
    raw.trim_start_matches(BOM).to_string()
}

/// Reads a CSV file into a [`Table`] tagged with `role`.
pub fn read_csv_table(path: &Path, role: TableRole, options: CsvOptions) -> Result<Table> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    read_csv_reader(file, path, role, options)
}

/// Reads CSV data from any reader. `source` is only used in errors and logs.
///
/// The first record with any non-blank cell is the header; blank records
/// before it are skipped. Every record after it is a row, blank or not.
/// Header and cell text is kept as-is apart from a leading byte-order mark.
pub fn read_csv_reader<R: Read>(
    reader: R,
    source: &Path,
    role: TableRole,
    options: CsvOptions,
) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(options.delimiter)
        .from_reader(reader);

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut ragged = 0usize;
    for record in reader.records() {
        let record = record.map_err(|source_err| IngestError::CsvParse {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        match &headers {
            None => {
                if record.iter().any(|value| !strip_bom(value).trim().is_empty()) {
                    headers = Some(record.iter().map(strip_bom).collect());
                }
            }
            Some(header) => {
                if record.len() != header.len() {
                    ragged += 1;
                }
                rows.push(record.iter().map(strip_bom).collect::<Vec<_>>());
            }
        }
    }

    let Some(headers) = headers else {
        return Err(IngestError::EmptyCsv {
            path: source.to_path_buf(),
        });
    };
    if ragged > 0 {
        warn!(
            table = %role,
            source = %source.display(),
            ragged_rows = ragged,
            "rows do not match header width; padded or truncated"
        );
    }
    debug!(
        table = %role,
        source = %source.display(),
        columns = headers.len(),
        rows = rows.len(),
        "read csv"
    );
    Ok(Table::new(role, headers, rows))
}
