use channel::{
    AnalyzeFrameRequest, AnalyzeVideoRequest, ErrorCode, JumpHeightPlugin, PluginConfig,
    ANALYZE_FRAME, ANALYZE_VIDEO,
};
use inference_engine::{ModelHandle, StubRuntime};
use serde_json::json;
use session_manager::{CancellationToken, FailurePolicy, InferenceSession, SessionConfig};

fn plugin_with(stub: StubRuntime, workers: usize, policy: FailurePolicy) -> JumpHeightPlugin {
    let handles = (0..workers)
        .map(|_| ModelHandle::from_runtime("stub", Box::new(stub.clone())).unwrap())
        .collect();
    let config = SessionConfig::parallel(workers).with_failure_policy(policy);
    JumpHeightPlugin::with_session(InferenceSession::new(handles, config).unwrap())
}

fn mean_plugin() -> JumpHeightPlugin {
    plugin_with(StubRuntime::mean(4), 2, FailurePolicy::FailFast)
}

#[tokio::test]
async fn analyze_frame_returns_model_scalar() {
    let plugin = mean_plugin();
    let height = plugin
        .analyze_frame(AnalyzeFrameRequest::new(vec![0, 255, 128, 64]))
        .await
        .unwrap();

    assert!((height - 0.438).abs() < 1e-3);
}

#[tokio::test]
async fn analyze_frame_wrong_length_is_shape_mismatch() {
    let plugin = mean_plugin();
    for len in [1usize, 3, 5, 64] {
        let err = plugin
            .analyze_frame(AnalyzeFrameRequest::new(vec![10; len]))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ShapeMismatch, "length {}", len);
    }
}

#[tokio::test]
async fn analyze_video_aggregates_in_order() {
    let plugin = mean_plugin();
    let request = AnalyzeVideoRequest::new(vec![
        vec![0, 0, 0, 0],
        vec![255, 255, 255, 255],
        vec![0, 255, 128, 64],
        vec![255, 255, 255, 255],
    ]);

    let analysis = plugin.analyze_video(request).await.unwrap();

    assert_eq!(analysis.frame_count, 4);
    assert_eq!(analysis.jump_heights.len(), 4);
    assert_eq!(analysis.jump_heights[0], 0.0);
    assert_eq!(analysis.jump_heights[1], 1.0);
    assert_eq!(analysis.max_jump_height, 1.0);

    let mean = analysis.jump_heights.iter().map(|&v| v as f64).sum::<f64>() / 4.0;
    assert!((analysis.average_jump_height - mean).abs() < 1e-6);
    assert!(analysis.failed_frames.is_empty());
}

#[tokio::test]
async fn average_jump_height_holds_precision_at_centimetre_scale() {
    // Heights in the 40-135 cm range, where f32 rounding of the mean exceeds 1e-6
    let stub = StubRuntime::with_fn(1, |input| Ok(40.0 + input[0] * 255.0 * 0.37));
    let plugin = plugin_with(stub, 2, FailurePolicy::FailFast);

    for clip in [vec![21u8, 147, 34], vec![200, 13, 77], vec![255, 254, 1]] {
        let request = AnalyzeVideoRequest::new(clip.iter().map(|&s| vec![s]).collect());
        let analysis = plugin.analyze_video(request).await.unwrap();

        let mean = analysis.jump_heights.iter().map(|&v| v as f64).sum::<f64>()
            / analysis.jump_heights.len() as f64;
        assert!(
            (analysis.average_jump_height - mean).abs() < 1e-6,
            "heights {:?}: average {} vs mean {}",
            analysis.jump_heights,
            analysis.average_jump_height,
            mean
        );
        assert!(analysis.average_jump_height > 40.0);
    }
}

#[tokio::test]
async fn analyze_video_fail_fast_reports_shape_mismatch() {
    let plugin = mean_plugin();
    let request = AnalyzeVideoRequest::new(vec![vec![1, 2, 3, 4], vec![1, 2]]);

    let err = plugin.analyze_video(request).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ShapeMismatch);
    assert!(err.message.contains("Frame 1"));
}

#[tokio::test]
async fn analyze_video_skip_and_continue_reports_failed_frames() {
    let stub = StubRuntime::with_fn(1, |input| {
        if input[0] == 0.0 {
            Err("no jumper detected".to_string())
        } else {
            Ok(input[0])
        }
    });
    let plugin = plugin_with(stub, 2, FailurePolicy::SkipAndContinue);

    let analysis = plugin
        .analyze_video(AnalyzeVideoRequest::new(vec![vec![255], vec![0], vec![51]]))
        .await
        .unwrap();

    assert_eq!(analysis.frame_count, 2);
    assert_eq!(analysis.jump_heights, vec![1.0, 0.2]);
    assert_eq!(analysis.failed_frames, vec![1]);
}

#[tokio::test]
async fn cancelled_video_reports_cancelled() {
    let plugin = mean_plugin();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = plugin
        .analyze_video_with_cancel(AnalyzeVideoRequest::new(vec![vec![1, 2, 3, 4]]), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Cancelled);
}

#[tokio::test]
async fn handle_call_dispatches_methods() {
    let plugin = mean_plugin();

    let height = plugin
        .handle_call(ANALYZE_FRAME, json!({ "frameData": [255, 255, 255, 255] }))
        .await
        .unwrap();
    assert_eq!(height, json!(1.0));

    let analysis = plugin
        .handle_call(ANALYZE_VIDEO, json!({ "framesData": [[0, 0, 0, 0], [255, 255, 255, 255]] }))
        .await
        .unwrap();
    assert_eq!(analysis["frameCount"], 2);
    assert_eq!(analysis["maxJumpHeight"], json!(1.0));
    assert_eq!(analysis["jumpHeights"], json!([0.0, 1.0]));
}

#[tokio::test]
async fn handle_call_rejects_bad_arguments() {
    let plugin = mean_plugin();

    let missing = plugin.handle_call(ANALYZE_FRAME, json!({})).await.unwrap_err();
    assert_eq!(missing.code, ErrorCode::InvalidData);

    let null = plugin
        .handle_call(ANALYZE_VIDEO, json!({ "framesData": null }))
        .await
        .unwrap_err();
    assert_eq!(null.code, ErrorCode::InvalidData);

    let out_of_range = plugin
        .handle_call(ANALYZE_FRAME, json!({ "frameData": [0, 1, 2, 300] }))
        .await
        .unwrap_err();
    assert_eq!(out_of_range.code, ErrorCode::InvalidData);

    let empty = plugin
        .handle_call(ANALYZE_FRAME, json!({ "frameData": [] }))
        .await
        .unwrap_err();
    assert_eq!(empty.code, ErrorCode::InvalidData);
}

#[tokio::test]
async fn handle_call_unknown_method() {
    let plugin = mean_plugin();
    let err = plugin.handle_call("calibrate", json!({})).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotImplemented);
}

#[tokio::test]
async fn calls_after_detach_report_model_not_loaded() {
    let plugin = mean_plugin();
    plugin.detach().await;
    plugin.detach().await;

    let err = plugin
        .analyze_frame(AnalyzeFrameRequest::new(vec![1, 2, 3, 4]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ModelNotLoaded);

    let err = plugin
        .analyze_video(AnalyzeVideoRequest::new(vec![vec![1, 2, 3, 4]]))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ModelNotLoaded);
}

#[test]
fn attach_with_missing_model_fails_at_startup() {
    let config = PluginConfig::for_model("/nonexistent/jump_height_model.onnx");
    let err = JumpHeightPlugin::attach(&config).err().unwrap();
    assert_eq!(err.code, ErrorCode::ModelNotLoaded);
}
