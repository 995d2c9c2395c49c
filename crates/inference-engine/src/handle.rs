//! Model Handle Implementation

use std::path::Path;

use crate::{InferenceError, StubRuntime, TractRuntime};
use tensor_encoder::EncodedTensor;
use tracing::{debug, info, warn};

/// A loaded, executable model backend
///
/// `run` takes `&mut self`: a runtime is never entered twice at once.
pub trait ModelRuntime: Send {
    /// Declared input shape
    fn input_shape(&self) -> &[usize];

    /// Declared output shape
    fn output_shape(&self) -> &[usize];

    /// Execute one forward pass over a flat input buffer
    fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, InferenceError>;
}

/// Loaded model plus its declared shapes
pub struct ModelHandle {
    /// Where the model came from (path or "mock")
    source: String,
    /// Backend, `None` once unloaded
    runtime: Option<Box<dyn ModelRuntime>>,
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
}

impl ModelHandle {
    /// Load an ONNX model artifact from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading model from {}", path.display());

        if !path.is_file() {
            return Err(InferenceError::LoadError(format!(
                "model file not found: {}",
                path.display()
            )));
        }

        let runtime = TractRuntime::load(path)?;
        Self::from_runtime(path.display().to_string(), Box::new(runtime))
    }

    /// Wrap an already constructed runtime, validating its shape declaration
    pub fn from_runtime(
        source: impl Into<String>,
        runtime: Box<dyn ModelRuntime>,
    ) -> Result<Self, InferenceError> {
        let source = source.into();
        let input_shape = runtime.input_shape().to_vec();
        let output_shape = runtime.output_shape().to_vec();

        if element_count(&input_shape) == 0 {
            return Err(InferenceError::LoadError(format!(
                "{}: input shape {:?} declares no elements",
                source, input_shape
            )));
        }
        if element_count(&output_shape) == 0 {
            return Err(InferenceError::LoadError(format!(
                "{}: output shape {:?} declares no elements",
                source, output_shape
            )));
        }

        info!(
            "Model {} ready: input shape {:?}, output shape {:?}",
            source, input_shape, output_shape
        );

        Ok(Self {
            source,
            runtime: Some(runtime),
            input_shape,
            output_shape,
        })
    }

    /// Create a mock handle averaging its input, for development without an artifact
    pub fn mock(input_len: usize) -> Self {
        info!("Creating mock model handle (input length {})", input_len);
        Self {
            source: "mock".to_string(),
            runtime: Some(Box::new(StubRuntime::mean(input_len))),
            input_shape: vec![1, input_len],
            output_shape: vec![1, 1],
        }
    }

    /// Run one forward pass
    pub fn run(&mut self, tensor: &EncodedTensor) -> Result<Vec<f32>, InferenceError> {
        let expected = self.input_len();
        let runtime = self.runtime.as_mut().ok_or(InferenceError::NotLoaded)?;

        if tensor.len() != expected {
            return Err(InferenceError::ShapeMismatch {
                expected,
                actual: tensor.len(),
            });
        }

        let output = runtime.run(tensor.as_slice())?;
        let declared = element_count(&self.output_shape);
        if output.len() != declared {
            return Err(InferenceError::RunError(format!(
                "runtime produced {} output elements, model declares {}",
                output.len(),
                declared
            )));
        }

        Ok(output)
    }

    /// Run one forward pass and extract the leading output scalar
    pub fn run_scalar(&mut self, tensor: &EncodedTensor) -> Result<f32, InferenceError> {
        let output = self.run(tensor)?;
        let value = output
            .first()
            .copied()
            .ok_or_else(|| InferenceError::RunError("empty model output".to_string()))?;

        if !value.is_finite() {
            return Err(InferenceError::RunError(format!(
                "model produced non-finite output {}",
                value
            )));
        }

        debug!("Model {} output: {}", self.source, value);
        Ok(value)
    }

    /// Release runtime resources; later runs fail with `NotLoaded`
    pub fn unload(&mut self) {
        if self.runtime.take().is_some() {
            info!("Model {} unloaded", self.source);
        } else {
            warn!("Model {} already unloaded", self.source);
        }
    }

    /// Check if the runtime is still loaded
    pub fn is_loaded(&self) -> bool {
        self.runtime.is_some()
    }

    /// Number of input elements the model consumes
    pub fn input_len(&self) -> usize {
        element_count(&self.input_shape)
    }

    pub fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    pub fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }

    /// Model source (path or "mock")
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("source", &self.source)
            .field("loaded", &self.is_loaded())
            .field("input_shape", &self.input_shape)
            .field("output_shape", &self.output_shape)
            .finish()
    }
}

fn element_count(shape: &[usize]) -> usize {
    if shape.is_empty() {
        0
    } else {
        shape.iter().product()
    }
}
