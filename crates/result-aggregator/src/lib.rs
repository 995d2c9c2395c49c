//! Result Aggregator
//!
//! Summary statistics (max, mean, count) over per-frame model outputs.

mod aggregate;

pub use aggregate::{aggregate, Aggregate};

use thiserror::Error;

/// Errors during aggregation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("Cannot aggregate an empty sequence")]
    EmptyInput,
}
