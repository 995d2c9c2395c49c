//! Encoding Error Types

use thiserror::Error;

/// Errors during frame encoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Frame length does not match the model input length
    #[error("Shape mismatch: expected {expected} samples, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}
