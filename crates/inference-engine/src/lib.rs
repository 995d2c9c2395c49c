//! Inference Engine
//!
//! Owns loaded models and runs single forward passes. A [`ModelHandle`]
//! wraps one [`ModelRuntime`] backend:
//! - [`TractRuntime`] for ONNX artifacts on disk
//! - [`StubRuntime`] for deterministic in-process models (tests, mock mode)

mod handle;
mod stub;
mod tract;

pub use handle::{ModelHandle, ModelRuntime};
pub use stub::{StubRuntime, StubStats};
pub use tract::TractRuntime;

use thiserror::Error;

/// Errors during model loading and inference
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    LoadError(String),
    #[error("Model not loaded")]
    NotLoaded,
    #[error("Invalid input shape: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("Inference failed: {0}")]
    RunError(String),
}
