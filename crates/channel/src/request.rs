//! Request and response schema

use serde::{Deserialize, Serialize};
use session_manager::BatchOutcome;
use tensor_encoder::Frame;

use crate::ChannelError;

/// `analyzeFrame` arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeFrameRequest {
    /// Samples of one frame, each 0-255
    pub frame_data: Vec<u8>,
}

impl AnalyzeFrameRequest {
    pub fn new(frame_data: Vec<u8>) -> Self {
        Self { frame_data }
    }

    /// Reject empty frames before they reach the session
    pub fn into_frame(self) -> Result<Frame, ChannelError> {
        if self.frame_data.is_empty() {
            return Err(ChannelError::invalid_data("Frame data is null or empty"));
        }
        Ok(Frame::new(self.frame_data))
    }
}

/// `analyzeVideo` arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeVideoRequest {
    /// Ordered frames of one clip
    pub frames_data: Vec<Vec<u8>>,
}

impl AnalyzeVideoRequest {
    pub fn new(frames_data: Vec<Vec<u8>>) -> Self {
        Self { frames_data }
    }

    pub fn into_frames(self) -> Result<Vec<Frame>, ChannelError> {
        if self.frames_data.is_empty() {
            return Err(ChannelError::invalid_data("Frames data is null or empty"));
        }
        if let Some(index) = self.frames_data.iter().position(|f| f.is_empty()) {
            return Err(ChannelError::invalid_data(format!(
                "Frame {} has no samples",
                index
            )));
        }
        Ok(self.frames_data.into_iter().map(Frame::new).collect())
    }
}

/// `analyzeVideo` result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalysis {
    pub max_jump_height: f32,
    /// Mean of `jump_heights`, kept in double precision
    pub average_jump_height: f64,
    /// Per-frame heights in input order
    pub jump_heights: Vec<f32>,
    /// Number of heights aggregated
    pub frame_count: usize,
    /// Frames skipped under the skip-and-continue policy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_frames: Vec<usize>,
}

impl From<BatchOutcome> for VideoAnalysis {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            max_jump_height: outcome.aggregate.max,
            average_jump_height: outcome.aggregate.mean,
            frame_count: outcome.aggregate.count,
            jump_heights: outcome.values,
            failed_frames: outcome.failed_frames,
        }
    }
}
