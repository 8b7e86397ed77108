//! Data model shared by the merge crates.
//!
//! Tables are held fully in memory for the duration of a run. Field bindings
//! and join keys are derived from them and never outlive the run.

pub mod binding;
pub mod error;
pub mod key;
pub mod summary;
pub mod table;

pub use binding::{BoundColumn, FieldBinding, LogicalField};
pub use error::{MergeError, Result};
pub use key::{JoinKey, normalize_key};
pub use summary::MergeSummary;
pub use table::{Table, TableRole};
