//! Learning rate schedulers.
//!
//! Provides the scheduling policies the registry knows about:
//! - `OneCycleLr` - warmup to a peak then cosine decay, sized by a total
//!   step budget known up front
//! - `StepDecayLr` - decay by a factor every N steps
//! - `CosineAnnealingLr` - smooth cosine decay

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use super::Optimizer;
use crate::error::Result;

/// Learning rate scheduler trait.
///
/// Exactly one scheduler instance exists per training run. Stepping happens
/// either once per epoch (by the epoch controller) or once per optimizer
/// step (inside the batch loop), never both.
pub trait LrScheduler {
    /// Scheduler class name, embedded in the `lr-{name}` metric key.
    fn name(&self) -> &'static str;

    /// Learning rate at the current step.
    fn lr(&self) -> f32;

    /// Advance the schedule.
    fn step(&mut self);

    /// Push the current learning rate into the optimizer.
    fn apply(&self, optimizer: &mut dyn Optimizer) {
        optimizer.set_lr(self.lr());
    }

    /// Export numeric state for checkpointing.
    fn state(&self) -> SchedulerState;

    /// Restore numeric state from a checkpoint blob.
    fn load_state(&mut self, state: &SchedulerState) -> Result<()>;

    /// Steps left in a finite schedule; `None` for open-ended policies.
    fn remaining_steps(&self) -> Option<u64> {
        None
    }
}

/// Scheduler state blob.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerState {
    pub current_step: u64,
}

/// One-cycle policy: linear warmup from `max_lr / div_factor` to `max_lr`
/// over the first `pct_start` fraction of `total_steps`, then cosine decay
/// down to `max_lr / final_div_factor`.
///
/// The phase boundaries depend on knowing the full step budget up front;
/// `total_steps` must be `batches_per_epoch * max_epochs` or the schedule is
/// silently wrong.
pub struct OneCycleLr {
    max_lr: f32,
    total_steps: u64,
    pct_start: f32,
    div_factor: f32,
    final_div_factor: f32,
    current_step: u64,
}

impl OneCycleLr {
    pub fn new(
        max_lr: f32,
        total_steps: u64,
        pct_start: f32,
        div_factor: f32,
        final_div_factor: f32,
    ) -> Self {
        Self {
            max_lr,
            total_steps,
            pct_start,
            div_factor,
            final_div_factor,
            current_step: 0,
        }
    }

    /// One-cycle with the usual defaults (pct_start 0.3, div_factor 25,
    /// final_div_factor 1e4).
    pub fn with_defaults(max_lr: f32, total_steps: u64) -> Self {
        Self::new(max_lr, total_steps, 0.3, 25.0, 1e4)
    }

    fn warmup_steps(&self) -> u64 {
        (self.pct_start * self.total_steps as f32).round() as u64
    }
}

impl LrScheduler for OneCycleLr {
    fn name(&self) -> &'static str {
        "OneCycleLR"
    }

    fn lr(&self) -> f32 {
        let initial = self.max_lr / self.div_factor;
        let final_lr = self.max_lr / self.final_div_factor;
        let warmup = self.warmup_steps();

        if self.current_step < warmup {
            let progress = self.current_step as f32 / warmup as f32;
            return initial + (self.max_lr - initial) * progress;
        }

        let decay_steps = self.total_steps.saturating_sub(warmup);
        if decay_steps == 0 || self.current_step >= self.total_steps {
            return final_lr;
        }

        let decay_step = self.current_step - warmup;
        let progress = decay_step as f32 / decay_steps as f32;
        let cosine_decay = 0.5 * (1.0 + (PI * progress).cos());
        final_lr + (self.max_lr - final_lr) * cosine_decay
    }

    fn step(&mut self) {
        self.current_step += 1;
    }

    fn state(&self) -> SchedulerState {
        SchedulerState { current_step: self.current_step }
    }

    fn load_state(&mut self, state: &SchedulerState) -> Result<()> {
        self.current_step = state.current_step;
        Ok(())
    }

    fn remaining_steps(&self) -> Option<u64> {
        Some(self.total_steps.saturating_sub(self.current_step))
    }
}

/// Step decay: multiply the learning rate by `gamma` every `step_size`
/// steps.
///
/// Formula: lr_t = lr_initial * gamma^(floor(t / step_size))
pub struct StepDecayLr {
    lr_initial: f32,
    step_size: u64,
    gamma: f32,
    current_step: u64,
}

impl StepDecayLr {
    pub fn new(lr_initial: f32, step_size: u64, gamma: f32) -> Self {
        Self { lr_initial, step_size, gamma, current_step: 0 }
    }
}

impl LrScheduler for StepDecayLr {
    fn name(&self) -> &'static str {
        "StepDecayLR"
    }

    fn lr(&self) -> f32 {
        if self.step_size == 0 {
            return self.lr_initial;
        }
        let num_decays = self.current_step / self.step_size;
        self.lr_initial * self.gamma.powi(num_decays as i32)
    }

    fn step(&mut self) {
        self.current_step += 1;
    }

    fn state(&self) -> SchedulerState {
        SchedulerState { current_step: self.current_step }
    }

    fn load_state(&mut self, state: &SchedulerState) -> Result<()> {
        self.current_step = state.current_step;
        Ok(())
    }
}

/// Cosine annealing from `lr_max` down to `lr_min` over `t_max` steps.
///
/// Formula: lr_t = lr_min + 0.5 * (lr_max - lr_min) * (1 + cos(π * t / T))
pub struct CosineAnnealingLr {
    lr_max: f32,
    lr_min: f32,
    t_max: u64,
    current_step: u64,
}

impl CosineAnnealingLr {
    pub fn new(lr_max: f32, t_max: u64, lr_min: f32) -> Self {
        Self { lr_max, lr_min, t_max, current_step: 0 }
    }
}

impl LrScheduler for CosineAnnealingLr {
    fn name(&self) -> &'static str {
        "CosineAnnealingLR"
    }

    fn lr(&self) -> f32 {
        if self.t_max == 0 || self.current_step >= self.t_max {
            return self.lr_min;
        }
        let progress = self.current_step as f32 / self.t_max as f32;
        let cosine_decay = 0.5 * (1.0 + (PI * progress).cos());
        self.lr_min + (self.lr_max - self.lr_min) * cosine_decay
    }

    fn step(&mut self) {
        self.current_step += 1;
    }

    fn state(&self) -> SchedulerState {
        SchedulerState { current_step: self.current_step }
    }

    fn load_state(&mut self, state: &SchedulerState) -> Result<()> {
        self.current_step = state.current_step;
        Ok(())
    }
}
