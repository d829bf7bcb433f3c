//! Optimizers and learning-rate schedulers.
//!
//! Construction goes through the name registries [`build_optimizer`] and
//! [`build_scheduler`]: a closed set of supported names mapped to
//! constructors, with a descriptive error for anything else.

mod adam;
mod adamw;
mod optimizer;
mod scheduler;
mod sgd;

pub use adam::Adam;
pub use adamw::AdamW;
pub use optimizer::{Optimizer, OptimizerState};
pub use scheduler::{CosineAnnealingLr, LrScheduler, OneCycleLr, SchedulerState, StepDecayLr};
pub use sgd::Sgd;

use crate::config::{OptimSpec, SchedSpec};
use crate::error::{Error, Result};

// Optimizer parameter field names.
const PARAM_MOMENTUM: &str = "momentum";
const PARAM_BETA1: &str = "beta1";
const PARAM_BETA2: &str = "beta2";
const PARAM_EPS: &str = "eps";
const PARAM_WEIGHT_DECAY: &str = "weight_decay";

// Scheduler parameter field names.
const PARAM_MAX_LR: &str = "max_lr";
const PARAM_PCT_START: &str = "pct_start";
const PARAM_DIV_FACTOR: &str = "div_factor";
const PARAM_FINAL_DIV_FACTOR: &str = "final_div_factor";
const PARAM_STEP_SIZE: &str = "step_size";
const PARAM_GAMMA: &str = "gamma";
const PARAM_T_MAX: &str = "t_max";
const PARAM_LR_MIN: &str = "lr_min";

fn param_f32(spec: &std::collections::HashMap<String, f64>, key: &str, default: f64) -> f32 {
    spec.get(key).copied().unwrap_or(default) as f32
}

/// Build an optimizer from configuration.
pub fn build_optimizer(spec: &OptimSpec) -> Result<Box<dyn Optimizer>> {
    match spec.name.to_lowercase().as_str() {
        "sgd" => {
            let momentum = param_f32(&spec.params, PARAM_MOMENTUM, 0.0);
            Ok(Box::new(Sgd::new(spec.lr, momentum)))
        }
        "adam" => {
            let beta1 = param_f32(&spec.params, PARAM_BETA1, 0.9);
            let beta2 = param_f32(&spec.params, PARAM_BETA2, 0.999);
            let eps = param_f32(&spec.params, PARAM_EPS, 1e-8);
            Ok(Box::new(Adam::new(spec.lr, beta1, beta2, eps)))
        }
        "adamw" => {
            let beta1 = param_f32(&spec.params, PARAM_BETA1, 0.9);
            let beta2 = param_f32(&spec.params, PARAM_BETA2, 0.999);
            let eps = param_f32(&spec.params, PARAM_EPS, 1e-8);
            let weight_decay = param_f32(&spec.params, PARAM_WEIGHT_DECAY, 0.01);
            Ok(Box::new(AdamW::new(spec.lr, beta1, beta2, eps, weight_decay)))
        }
        name => Err(Error::UnknownOptimizer(name.to_string())),
    }
}

/// Build a scheduler from configuration.
///
/// `base_lr` is the optimizer's configured learning rate; `total_steps` is
/// the full step budget (`batches_per_epoch * max_epochs`), which one-cycle
/// schedules require before construction.
pub fn build_scheduler(
    spec: &SchedSpec,
    base_lr: f32,
    total_steps: u64,
) -> Result<Box<dyn LrScheduler>> {
    match spec.name.to_lowercase().as_str() {
        "one_cycle" => {
            let max_lr = param_f32(&spec.params, PARAM_MAX_LR, f64::from(base_lr));
            let pct_start = param_f32(&spec.params, PARAM_PCT_START, 0.3);
            let div_factor = param_f32(&spec.params, PARAM_DIV_FACTOR, 25.0);
            let final_div_factor = param_f32(&spec.params, PARAM_FINAL_DIV_FACTOR, 1e4);
            if total_steps == 0 {
                return Err(Error::Config(
                    "one_cycle requires a non-zero total step budget".to_string(),
                ));
            }
            Ok(Box::new(OneCycleLr::new(
                max_lr,
                total_steps,
                pct_start,
                div_factor,
                final_div_factor,
            )))
        }
        "step_decay" => {
            let step_size = param_f32(&spec.params, PARAM_STEP_SIZE, 10.0) as u64;
            let gamma = param_f32(&spec.params, PARAM_GAMMA, 0.1);
            Ok(Box::new(StepDecayLr::new(base_lr, step_size, gamma)))
        }
        "cosine_annealing" => {
            let t_max = spec
                .params
                .get(PARAM_T_MAX)
                .map(|&t| t as u64)
                .unwrap_or(total_steps);
            let lr_min = param_f32(&spec.params, PARAM_LR_MIN, 0.0);
            Ok(Box::new(CosineAnnealingLr::new(base_lr, t_max, lr_min)))
        }
        name => Err(Error::UnknownScheduler(name.to_string())),
    }
}
