//! CSV output.

use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use tempfile::NamedTempFile;
use tracing::debug;

use merge_model::Table;

use crate::error::{IngestError, Result};
use crate::reader::CsvOptions;

/// Writes a table (header row first) to any writer.
pub fn write_csv_writer<W: Write>(
    writer: W,
    table: &Table,
    target: &Path,
    options: CsvOptions,
) -> Result<()> {
    let csv_err = |source| IngestError::CsvWrite {
        path: target.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);
    writer.write_record(&table.headers).map_err(csv_err)?;
    for row in &table.rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| IngestError::Io {
        path: target.to_path_buf(),
        source,
    })
}

/// Writes a table to `path`, replacing any existing file.
///
/// Data goes to a temporary file next to `path` which is renamed into place
/// once fully written, so `path` is either untouched or complete.
pub fn write_csv_table(path: &Path, table: &Table, options: CsvOptions) -> Result<()> {
    let io_err = |source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;
    write_csv_writer(temp.as_file_mut(), table, path, options)?;
    temp.persist(path).map_err(|err| io_err(err.error))?;
    debug!(
        target_path = %path.display(),
        rows = table.len(),
        "wrote csv"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use merge_model::TableRole;

    use super::*;

    #[test]
    fn writes_header_then_rows_with_quoting() {
        let table = Table::new(
            TableRole::Primary,
            vec!["name".to_string(), "views_30d".to_string()],
            vec![
                vec!["Acme, Inc".to_string(), "500".to_string()],
                vec!["Beta".to_string(), String::new()],
            ],
        );
        let mut out = Vec::new();
        write_csv_writer(&mut out, &table, Path::new("out.csv"), CsvOptions::default())
            .expect("write csv");
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "name,views_30d\n\"Acme, Inc\",500\nBeta,\n");
    }
}
