//! Boundary error codes

use inference_engine::InferenceError;
use result_aggregator::AggregateError;
use serde::{Deserialize, Serialize};
use session_manager::SessionError;
use tensor_encoder::EncodeError;
use thiserror::Error;

/// Stable error code reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ModelNotLoaded,
    InvalidData,
    AnalysisError,
    ShapeMismatch,
    Cancelled,
    NotImplemented,
}

impl ErrorCode {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ModelNotLoaded => "MODEL_NOT_LOADED",
            ErrorCode::InvalidData => "INVALID_DATA",
            ErrorCode::AnalysisError => "ANALYSIS_ERROR",
            ErrorCode::ShapeMismatch => "SHAPE_MISMATCH",
            ErrorCode::Cancelled => "CANCELLED",
            ErrorCode::NotImplemented => "NOT_IMPLEMENTED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned across the request boundary
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ChannelError {
    pub code: ErrorCode,
    pub message: String,
}

impl ChannelError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidData, message)
    }

    pub fn not_implemented(method: &str) -> Self {
        Self::new(ErrorCode::NotImplemented, format!("unknown method: {}", method))
    }
}

impl From<SessionError> for ChannelError {
    fn from(err: SessionError) -> Self {
        let code = match err.root_cause() {
            SessionError::Encode(EncodeError::ShapeMismatch { .. })
            | SessionError::Inference(InferenceError::ShapeMismatch { .. }) => ErrorCode::ShapeMismatch,
            SessionError::EmptyBatch => ErrorCode::InvalidData,
            SessionError::Inference(InferenceError::NotLoaded)
            | SessionError::Inference(InferenceError::LoadError(_)) => ErrorCode::ModelNotLoaded,
            SessionError::Cancelled => ErrorCode::Cancelled,
            SessionError::Inference(InferenceError::RunError(_))
            | SessionError::Aggregate(AggregateError::EmptyInput)
            | SessionError::Worker(_)
            | SessionError::FrameFailed { .. } => ErrorCode::AnalysisError,
        };
        Self::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_serialize_as_wire_strings() {
        let json = serde_json::to_string(&ErrorCode::ModelNotLoaded).unwrap();
        assert_eq!(json, "\"MODEL_NOT_LOADED\"");
        assert_eq!(ErrorCode::ShapeMismatch.to_string(), "SHAPE_MISMATCH");
    }

    #[test]
    fn test_frame_failure_maps_to_root_code() {
        let err = SessionError::FrameFailed {
            index: 3,
            source: Box::new(SessionError::Encode(EncodeError::ShapeMismatch {
                expected: 4,
                actual: 2,
            })),
        };
        let channel_err = ChannelError::from(err);
        assert_eq!(channel_err.code, ErrorCode::ShapeMismatch);
        assert!(channel_err.message.contains("Frame 3"));
    }

    #[test]
    fn test_empty_batch_is_invalid_data() {
        let err = ChannelError::from(SessionError::EmptyBatch);
        assert_eq!(err.code, ErrorCode::InvalidData);
    }

    #[test]
    fn test_not_loaded_code() {
        let err = ChannelError::from(SessionError::Inference(InferenceError::NotLoaded));
        assert_eq!(err.code, ErrorCode::ModelNotLoaded);
    }
}
