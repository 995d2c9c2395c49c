//! Max / mean / count computation

use crate::AggregateError;
use serde::{Deserialize, Serialize};

/// Summary of a sequence of scalars
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Maximum value
    pub max: f32,
    /// Position of the first occurrence of `max`
    pub max_index: usize,
    /// Arithmetic mean, accumulated in double precision
    pub mean: f64,
    /// Number of values
    pub count: usize,
}

/// Compute max, mean and count over `values`
pub fn aggregate(values: &[f32]) -> Result<Aggregate, AggregateError> {
    let (&first, rest) = values.split_first().ok_or(AggregateError::EmptyInput)?;

    let mut max = first;
    let mut max_index = 0;
    let mut sum = first as f64;

    for (i, &v) in rest.iter().enumerate() {
        sum += v as f64;
        // Strict comparison keeps the first occurrence on ties
        if v > max {
            max = v;
            max_index = i + 1;
        }
    }

    Ok(Aggregate {
        max,
        max_index,
        mean: sum / values.len() as f64,
        count: values.len(),
    })
}
