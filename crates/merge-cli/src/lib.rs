//! CLI library components for opps-merge.

pub mod logging;
pub mod pipeline;
pub mod types;
