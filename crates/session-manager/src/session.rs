//! Inference Session Implementation

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use inference_engine::{InferenceError, ModelHandle};
use result_aggregator::{aggregate, Aggregate};
use tensor_encoder::{EncodedTensor, Frame, TensorEncoder};
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::pool::{Checkout, HandlePool};
use crate::{CancellationToken, FailurePolicy, SessionConfig, SessionError};

/// Ordered frames plus a correlation id
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub id: Uuid,
    pub frames: Vec<Frame>,
}

impl InferenceRequest {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            id: Uuid::new_v4(),
            frames,
        }
    }
}

/// Result of a batch request
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Correlation id of the request
    pub request_id: Uuid,
    /// Per-frame scalars in input order, failed frames omitted
    pub values: Vec<f32>,
    /// Summary over `values`
    pub aggregate: Aggregate,
    /// Input indices of frames dropped under `SkipAndContinue`
    pub failed_frames: Vec<usize>,
}

/// Serves requests against a pool of per-worker model handles
pub struct InferenceSession {
    pool: Arc<HandlePool>,
    encoder: TensorEncoder,
    config: SessionConfig,
}

impl InferenceSession {
    /// Build a session over already loaded handles, one per worker
    pub fn new(handles: Vec<ModelHandle>, config: SessionConfig) -> Result<Self, SessionError> {
        let first = handles.first().ok_or_else(|| {
            InferenceError::LoadError("session needs at least one model handle".to_string())
        })?;
        let input_len = first.input_len();

        if let Some(handle) = handles.iter().find(|h| !h.is_loaded()) {
            return Err(InferenceError::LoadError(format!("{} is not loaded", handle.source())).into());
        }
        if let Some(handle) = handles.iter().find(|h| h.input_len() != input_len) {
            return Err(InferenceError::LoadError(format!(
                "{} takes {} inputs, pool expects {}",
                handle.source(),
                handle.input_len(),
                input_len
            ))
            .into());
        }
        if handles.len() != config.workers {
            warn!(
                "Configured {} workers but got {} handles; pool size follows the handles",
                config.workers,
                handles.len()
            );
        }

        info!(
            "Inference session ready: {} worker(s), input length {}, policy {:?}",
            handles.len(),
            input_len,
            config.failure_policy
        );

        Ok(Self {
            pool: Arc::new(HandlePool::new(handles)),
            encoder: TensorEncoder::new(input_len),
            config,
        })
    }

    /// Load one handle per configured worker from a model artifact
    pub fn load(path: impl AsRef<Path>, config: SessionConfig) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let handles = (0..config.workers.max(1))
            .map(|_| ModelHandle::load(path))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(handles, config)
    }

    /// Input length every frame must have
    pub fn input_len(&self) -> usize {
        self.encoder.input_len()
    }

    pub fn workers(&self) -> usize {
        self.pool.size()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.pool.is_loaded()
    }

    /// Run one frame and return its scalar
    pub async fn analyze_single(&self, frame: &Frame) -> Result<f32, SessionError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("analyze_single", %request_id);
        self.run_single(frame).instrument(span).await
    }

    async fn run_single(&self, frame: &Frame) -> Result<f32, SessionError> {
        if !self.pool.is_loaded() {
            return Err(InferenceError::NotLoaded.into());
        }

        let tensor = self.encoder.encode_frame(frame)?;
        let checkout = self.pool.checkout().await?;
        let (_checkout, result) = run_blocking(checkout, tensor).await;

        let value = result?;
        debug!("Frame analyzed: {}", value);
        Ok(value)
    }

    /// Run an ordered batch of frames across the worker pool
    pub async fn analyze_batch(
        &self,
        frames: Vec<Frame>,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, SessionError> {
        let request = InferenceRequest::new(frames);
        let span = info_span!(
            "analyze_batch",
            request_id = %request.id,
            frames = request.frames.len()
        );
        self.run_batch(request, cancel).instrument(span).await
    }

    async fn run_batch(
        &self,
        request: InferenceRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, SessionError> {
        let InferenceRequest { id, frames } = request;
        let total = frames.len();

        if total == 0 {
            return Err(SessionError::EmptyBatch);
        }
        if !self.pool.is_loaded() {
            return Err(InferenceError::NotLoaded.into());
        }

        let fail_fast = self.config.failure_policy == FailurePolicy::FailFast;
        let failed = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<f32>> = vec![None; total];
        let mut failures: Vec<(usize, SessionError)> = Vec::new();

        for (index, frame) in frames.iter().enumerate() {
            if cancel.is_cancelled() {
                debug!("Cancelled before frame {}, stopping dispatch", index);
                break;
            }
            if fail_fast && failed.load(Ordering::Acquire) {
                debug!("Earlier frame failed, stopping dispatch at {}", index);
                break;
            }

            let tensor = match self.encoder.encode_frame(frame) {
                Ok(tensor) => tensor,
                Err(e) => {
                    warn!("Frame {} rejected: {}", index, e);
                    failed.store(true, Ordering::Release);
                    failures.push((index, e.into()));
                    continue;
                }
            };

            let checkout = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                checkout = self.pool.checkout() => checkout,
            };
            let checkout = match checkout {
                Ok(checkout) => checkout,
                Err(e) => {
                    failed.store(true, Ordering::Release);
                    failures.push((index, e.into()));
                    continue;
                }
            };

            // Waiting for a worker may have outlasted a failure or a cancel
            if cancel.is_cancelled() || (fail_fast && failed.load(Ordering::Acquire)) {
                break;
            }

            let failed = Arc::clone(&failed);
            tasks.spawn(async move {
                let (checkout, result) = run_blocking(checkout, tensor).await;
                if result.is_err() {
                    failed.store(true, Ordering::Release);
                }
                // Release the worker only once the failure is visible to dispatch
                drop(checkout);
                (index, result)
            });
        }

        // Barrier: every dispatched run completes before anything is reported
        let mut worker_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(value))) => slots[index] = Some(value),
                Ok((index, Err(e))) => {
                    warn!("Frame {} failed: {}", index, e);
                    failures.push((index, e));
                }
                Err(e) => {
                    warn!("Frame task failed: {}", e);
                    worker_error.get_or_insert(SessionError::Worker(e.to_string()));
                }
            }
        }
        if let Some(err) = worker_error {
            return Err(err);
        }

        if cancel.is_cancelled() {
            let completed = slots.iter().filter(|s| s.is_some()).count();
            info!(
                "Batch cancelled after {} of {} frames, discarding partial results",
                completed, total
            );
            return Err(SessionError::Cancelled);
        }

        failures.sort_by_key(|(index, _)| *index);
        let failed_frames: Vec<usize> = failures.iter().map(|(index, _)| *index).collect();
        let values: Vec<f32> = slots.into_iter().flatten().collect();

        if fail_fast || values.is_empty() {
            if let Some((index, source)) = failures.into_iter().next() {
                return Err(SessionError::FrameFailed {
                    index,
                    source: Box::new(source),
                });
            }
        }

        let aggregate = aggregate(&values)?;
        info!(
            "Batch complete: {} frames, {} failed, max {:.4}, mean {:.4}",
            total,
            failed_frames.len(),
            aggregate.max,
            aggregate.mean
        );

        Ok(BatchOutcome {
            request_id: id,
            values,
            aggregate,
            failed_frames,
        })
    }

    /// Wait for in-flight runs, then unload every handle
    pub async fn unload(&self) {
        self.pool.unload().await;
    }
}

/// Run a checked-out handle on the blocking pool
///
/// The checkout is handed back so the caller decides when the worker frees
/// up; it is `None` only if the run panicked.
async fn run_blocking(
    mut checkout: Checkout,
    tensor: EncodedTensor,
) -> (Option<Checkout>, Result<f32, SessionError>) {
    let started = Instant::now();
    let joined = tokio::task::spawn_blocking(move || {
        let result = checkout.run_scalar(&tensor);
        (checkout, result)
    })
    .await;

    let (checkout, result) = match joined {
        Ok((checkout, result)) => (Some(checkout), result),
        Err(e) => (
            None,
            Err(InferenceError::RunError(format!("worker panicked: {}", e))),
        ),
    };

    metrics::histogram!("inference_frame_seconds").record(started.elapsed().as_secs_f64());
    match &result {
        Ok(_) => metrics::counter!("inference_frames_total").increment(1),
        Err(_) => metrics::counter!("inference_frames_failed_total").increment(1),
    }

    (checkout, result.map_err(SessionError::from))
}
