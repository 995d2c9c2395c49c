//! ONNX backend using tract

use std::path::Path;

use crate::{InferenceError, ModelRuntime};
use tract_onnx::prelude::*;
use tracing::debug;

/// Optimized, runnable ONNX plan with concrete input/output shapes
pub struct TractRuntime {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
}

impl TractRuntime {
    /// Parse, optimize and plan a model file
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let load_err = |e: TractError| InferenceError::LoadError(format!("{}: {}", path.display(), e));

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.into_optimized())
            .map_err(load_err)?;

        let input_shape = concrete_shape(model.input_fact(0).map_err(load_err)?, "input")?;
        let output_shape = concrete_shape(model.output_fact(0).map_err(load_err)?, "output")?;

        let plan = model.into_runnable().map_err(load_err)?;
        debug!(
            "Planned {}: input {:?}, output {:?}",
            path.display(),
            input_shape,
            output_shape
        );

        Ok(Self {
            plan,
            input_shape,
            output_shape,
        })
    }
}

fn concrete_shape(fact: &TypedFact, which: &str) -> Result<Vec<usize>, InferenceError> {
    fact.shape
        .as_concrete()
        .map(|dims| dims.to_vec())
        .ok_or_else(|| {
            InferenceError::LoadError(format!("model does not declare a concrete {} shape", which))
        })
}

impl ModelRuntime for TractRuntime {
    fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn output_shape(&self) -> &[usize] {
        &self.output_shape
    }

    fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, InferenceError> {
        let run_err = |e: TractError| InferenceError::RunError(e.to_string());

        let tensor = Tensor::from_shape(&self.input_shape, input).map_err(run_err)?;
        let outputs = self.plan.run(tvec!(tensor.into())).map_err(run_err)?;

        let first = outputs
            .first()
            .ok_or_else(|| InferenceError::RunError("model produced no outputs".to_string()))?;
        let view = first.to_array_view::<f32>().map_err(run_err)?;

        Ok(view.iter().copied().collect())
    }
}
