//! Inference Session Manager
//!
//! Serves single-frame and batch requests against a pool of model handles:
//! - one handle per worker, never shared between concurrent runs
//! - batch results returned in input order whatever the completion order
//! - cancellable batches and a configurable per-frame failure policy

mod cancel;
mod config;
mod pool;
mod session;

pub use cancel::CancellationToken;
pub use config::{FailurePolicy, SessionConfig};
pub use session::{BatchOutcome, InferenceRequest, InferenceSession};

use inference_engine::InferenceError;
use result_aggregator::AggregateError;
use tensor_encoder::EncodeError;
use thiserror::Error;

/// Errors surfaced by the session manager
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Batch contains no frames")]
    EmptyBatch,

    #[error("Frame {index} failed: {source}")]
    FrameFailed {
        index: usize,
        #[source]
        source: Box<SessionError>,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Worker failed: {0}")]
    Worker(String),
}

impl SessionError {
    /// Innermost error, looking through per-frame wrappers
    pub fn root_cause(&self) -> &SessionError {
        match self {
            SessionError::FrameFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
