//! Model-side collaborator interface.
//!
//! The harness owns no network architecture. Anything implementing
//! [`AsrModel`] can be driven by the epoch controller: the model runs its
//! own forward/backward numerics and exposes trainable parameters as a flat
//! slice of [`Param`] for the optimizer to step.

use std::collections::HashMap;

use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::config::Device;
use crate::error::{Error, Result};

/// A single trainable parameter: flat data plus an optional gradient buffer.
///
/// Gradients are written by the model during a training-mode forward pass
/// and cleared by [`crate::optim::Optimizer::zero_grad`].
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    data: Array1<f32>,
    grad: Option<Array1<f32>>,
}

impl Param {
    pub fn new(name: impl Into<String>, data: Array1<f32>) -> Self {
        Self { name: name.into(), data, grad: None }
    }

    pub fn from_vec(name: impl Into<String>, data: Vec<f32>) -> Self {
        Self::new(name, Array1::from_vec(data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array1<f32> {
        &mut self.data
    }

    pub fn grad(&self) -> Option<&Array1<f32>> {
        self.grad.as_ref()
    }

    pub fn set_grad(&mut self, grad: Array1<f32>) {
        self.grad = Some(grad);
    }

    pub fn zero_grad(&mut self) {
        self.grad = None;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Serializable snapshot of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamRecord {
    pub name: String,
    pub data: Vec<f32>,
}

/// Serializable model weights, the `model_state` half of a model checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ModelState {
    pub parameters: Vec<ParamRecord>,
}

impl ModelState {
    /// Snapshot a parameter slice.
    pub fn from_params(params: &[Param]) -> Self {
        Self {
            parameters: params
                .iter()
                .map(|p| ParamRecord { name: p.name.clone(), data: p.data.to_vec() })
                .collect(),
        }
    }

    /// Write this snapshot back into a parameter slice.
    ///
    /// Parameters are matched positionally; a count or length mismatch is a
    /// model error, not a silent truncation.
    pub fn apply_to(&self, params: &mut [Param]) -> Result<()> {
        if self.parameters.len() != params.len() {
            return Err(Error::Model(format!(
                "checkpoint has {} parameters, model has {}",
                self.parameters.len(),
                params.len()
            )));
        }
        for (record, param) in self.parameters.iter().zip(params.iter_mut()) {
            if record.data.len() != param.len() {
                return Err(Error::Model(format!(
                    "parameter '{}' has {} values in checkpoint, {} in model",
                    record.name,
                    record.data.len(),
                    param.len()
                )));
            }
            *param.data_mut() = Array1::from_vec(record.data.clone());
        }
        Ok(())
    }
}

/// Output of one forward pass over a batch.
#[derive(Debug, Clone)]
pub struct ForwardOutput {
    /// Frame-level outputs, architecture-defined content.
    pub outputs: Array2<f32>,
    pub output_lengths: Vec<usize>,
    /// Scalar loss for the batch.
    pub loss: f32,
}

/// Capability set the epoch controller requires from an ASR model.
pub trait AsrModel {
    /// Model class name, embedded in checkpoint file names.
    fn name(&self) -> &str;

    /// Run the model over a labeled batch.
    ///
    /// In training mode (`predict == false`) the model writes gradients into
    /// its parameters as a side effect. With `predict` set the pass is
    /// inference-only and the loss is reported for monitoring.
    fn forward(
        &mut self,
        features: &Array3<f32>,
        feature_lengths: &[usize],
        targets: &Array2<i64>,
        target_lengths: &[usize],
        predict: bool,
    ) -> Result<ForwardOutput>;

    /// Decode features to one text hypothesis per batch row.
    fn recognize(
        &mut self,
        features: &Array3<f32>,
        feature_lengths: &[usize],
    ) -> Result<Vec<String>>;

    /// Trainable parameters, in a stable order.
    fn params_mut(&mut self) -> &mut [Param];

    /// Export weights for checkpointing.
    fn state(&self) -> ModelState;

    /// Restore weights from a checkpoint blob.
    fn load_state(&mut self, state: &ModelState) -> Result<()>;

    /// Named hyperparameters stored alongside the weights.
    fn hyperparams(&self) -> HashMap<String, serde_json::Value>;

    /// Move the model to a compute target. Blocking; host-only models keep
    /// the default no-op.
    fn to_device(&mut self, device: &Device) -> Result<()> {
        let _ = device;
        Ok(())
    }
}
