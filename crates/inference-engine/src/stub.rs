//! Deterministic in-process model

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::{InferenceError, ModelRuntime};

type ModelFn = dyn Fn(&[f32]) -> Result<f32, String> + Send + Sync;
type LatencyFn = dyn Fn(&[f32]) -> Duration + Send + Sync;

/// Run counters shared by every clone of a stub
#[derive(Debug, Default)]
pub struct StubStats {
    runs: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl StubStats {
    /// Completed or failed runs
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous runs across all clones
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Stub runtime mapping a tensor to one scalar through a closure
///
/// Clones share the model, latency and [`StubStats`], so a pool of
/// per-worker handles can be observed as a whole.
#[derive(Clone)]
pub struct StubRuntime {
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
    model: Arc<ModelFn>,
    latency: Option<Arc<LatencyFn>>,
    stats: Arc<StubStats>,
}

impl StubRuntime {
    /// Stub returning `sum(input) / len`
    pub fn mean(input_len: usize) -> Self {
        Self::with_fn(input_len, |input| {
            Ok(input.iter().sum::<f32>() / input.len() as f32)
        })
    }

    /// Stub evaluating `model`; an `Err` becomes a `RunError`
    pub fn with_fn<F>(input_len: usize, model: F) -> Self
    where
        F: Fn(&[f32]) -> Result<f32, String> + Send + Sync + 'static,
    {
        Self {
            input_shape: vec![1, input_len],
            output_shape: vec![1, 1],
            model: Arc::new(model),
            latency: None,
            stats: Arc::new(StubStats::default()),
        }
    }

    /// Sleep for a per-input duration before producing output
    pub fn with_latency<F>(mut self, latency: F) -> Self
    where
        F: Fn(&[f32]) -> Duration + Send + Sync + 'static,
    {
        self.latency = Some(Arc::new(latency));
        self
    }

    /// Shared run counters
    pub fn stats(&self) -> Arc<StubStats> {
        Arc::clone(&self.stats)
    }
}

impl ModelRuntime for StubRuntime {
    fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }

    fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, InferenceError> {
        let active = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak_in_flight.fetch_max(active, Ordering::SeqCst);

        if let Some(latency) = &self.latency {
            std::thread::sleep(latency(input));
        }
        let result = (self.model)(input).map_err(InferenceError::RunError);

        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.stats.runs.fetch_add(1, Ordering::SeqCst);

        result.map(|value| vec![value])
    }
}
