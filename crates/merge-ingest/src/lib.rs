//! CSV ingestion and output for merge runs.
//!
//! Reading produces a [`merge_model::Table`] with header and cell text
//! untouched. Writing goes through a temporary file in the target
//! directory so a failed run never leaves a partial output behind.

pub mod error;
pub mod reader;
pub mod writer;

pub use error::{IngestError, Result};
pub use reader::{CsvOptions, read_csv_reader, read_csv_table};
pub use writer::{write_csv_table, write_csv_writer};
