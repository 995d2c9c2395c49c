//! Jump-height plugin: method dispatch over an inference session

use serde::de::DeserializeOwned;
use serde_json::Value;
use session_manager::{CancellationToken, InferenceSession};
use tracing::{debug, error, info};

use crate::{
    AnalyzeFrameRequest, AnalyzeVideoRequest, ChannelError, ErrorCode, PluginConfig,
    VideoAnalysis,
};

/// Method name for single-frame analysis
pub const ANALYZE_FRAME: &str = "analyzeFrame";
/// Method name for whole-clip analysis
pub const ANALYZE_VIDEO: &str = "analyzeVideo";

/// Request boundary in front of an [`InferenceSession`]
pub struct JumpHeightPlugin {
    session: InferenceSession,
}

impl JumpHeightPlugin {
    /// Load the configured model and start serving
    pub fn attach(config: &PluginConfig) -> Result<Self, ChannelError> {
        info!("Attaching jump height plugin, model {}", config.model.path.display());

        let session = InferenceSession::load(&config.model.path, config.session.clone())
            .map_err(|e| {
                error!("Failed to load model: {}", e);
                ChannelError::new(ErrorCode::ModelNotLoaded, e.to_string())
            })?;

        info!(
            "Jump height model loaded: {} input samples, {} worker(s)",
            session.input_len(),
            session.workers()
        );
        Ok(Self { session })
    }

    /// Serve an already built session
    pub fn with_session(session: InferenceSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &InferenceSession {
        &self.session
    }

    /// Predict the jump height for one frame
    pub async fn analyze_frame(&self, request: AnalyzeFrameRequest) -> Result<f32, ChannelError> {
        let frame = request.into_frame()?;
        let height = self.session.analyze_single(&frame).await.map_err(|e| {
            error!("Error analyzing frame: {}", e);
            ChannelError::from(e)
        })?;

        debug!("Jump height prediction: {}", height);
        Ok(height)
    }

    /// Analyze every frame of a clip
    pub async fn analyze_video(&self, request: AnalyzeVideoRequest) -> Result<VideoAnalysis, ChannelError> {
        self.analyze_video_with_cancel(request, &CancellationToken::new()).await
    }

    /// Analyze a clip, stopping early if `cancel` fires
    pub async fn analyze_video_with_cancel(
        &self,
        request: AnalyzeVideoRequest,
        cancel: &CancellationToken,
    ) -> Result<VideoAnalysis, ChannelError> {
        let frames = request.into_frames()?;
        let outcome = self.session.analyze_batch(frames, cancel).await.map_err(|e| {
            error!("Error analyzing video: {}", e);
            ChannelError::from(e)
        })?;

        let analysis = VideoAnalysis::from(outcome);
        info!(
            "Video analysis complete. Max jump height: {}",
            analysis.max_jump_height
        );
        Ok(analysis)
    }

    /// Dispatch a loosely typed method call
    pub async fn handle_call(&self, method: &str, args: Value) -> Result<Value, ChannelError> {
        debug!("Method call: {}", method);
        match method {
            ANALYZE_FRAME => {
                let height = self.analyze_frame(parse_args(args)?).await?;
                Ok(Value::from(height))
            }
            ANALYZE_VIDEO => {
                let analysis = self.analyze_video(parse_args(args)?).await?;
                serde_json::to_value(analysis)
                    .map_err(|e| ChannelError::new(ErrorCode::AnalysisError, e.to_string()))
            }
            other => Err(ChannelError::not_implemented(other)),
        }
    }

    /// Stop serving and release the model; later calls report `MODEL_NOT_LOADED`
    pub async fn detach(&self) {
        info!("Detaching jump height plugin");
        self.session.unload().await;
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ChannelError> {
    serde_json::from_value(args).map_err(|e| ChannelError::invalid_data(e.to_string()))
}
