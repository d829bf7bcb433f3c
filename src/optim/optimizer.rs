//! Optimizer trait and serializable state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Param;

/// Trait for optimization algorithms.
///
/// Exactly one optimizer instance exists per training run; its numeric state
/// is the single source of truth for resumption and must round-trip through
/// [`OptimizerState`] unchanged.
pub trait Optimizer {
    /// Apply one update to the parameters.
    fn step(&mut self, params: &mut [Param]);

    /// Clear gradients on all parameters.
    fn zero_grad(&mut self, params: &mut [Param]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Get learning rate.
    fn lr(&self) -> f32;

    /// Set learning rate.
    fn set_lr(&mut self, lr: f32);

    /// Export numeric state for checkpointing.
    fn state(&self) -> OptimizerState;

    /// Restore numeric state from a checkpoint blob.
    fn load_state(&mut self, state: &OptimizerState) -> Result<()>;
}

/// Optimizer state blob: a step counter plus named per-parameter buffer
/// lists (momentum, first/second moments).
///
/// An empty inner `Vec<f32>` encodes a buffer that has not been initialized
/// yet, so a freshly created optimizer and one that saved before its first
/// step produce identical blobs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizerState {
    pub step_count: u64,
    pub buffers: BTreeMap<String, Vec<Vec<f32>>>,
}

/// Convert moment buffers to their serializable form.
pub(crate) fn buffers_to_state(buffers: &[Option<ndarray::Array1<f32>>]) -> Vec<Vec<f32>> {
    buffers
        .iter()
        .map(|b| b.as_ref().map(|a| a.to_vec()).unwrap_or_default())
        .collect()
}

/// Convert serialized buffers back; empty entries become uninitialized.
pub(crate) fn buffers_from_state(state: &[Vec<f32>]) -> Vec<Option<ndarray::Array1<f32>>> {
    state
        .iter()
        .map(|b| {
            if b.is_empty() {
                None
            } else {
                Some(ndarray::Array1::from_vec(b.clone()))
            }
        })
        .collect()
}
