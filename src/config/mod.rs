//! Training configuration.
//!
//! [`TrainingConfig`] is the full set of controller hyperparameters. It is
//! immutable after construction with one exception: restoring a trainer
//! checkpoint replaces it wholesale with the stored hyperparameters (see
//! [`crate::train::Trainer::restore_from_checkpoint`]).
//!
//! Every struct rejects unknown fields during deserialization, so a restored
//! blob cannot silently attach state the configuration never declared.

mod device;

pub use device::Device;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// When the learning-rate scheduler advances.
///
/// Mutually exclusive: epoch-interval schedulers are stepped by the epoch
/// controller after the validation pass; step-interval schedulers are stepped
/// inside the per-batch strategy after each optimizer step. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepInterval {
    Epoch,
    Step,
}

impl std::fmt::Display for StepInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepInterval::Epoch => write!(f, "epoch"),
            StepInterval::Step => write!(f, "step"),
        }
    }
}

/// Metric-logging configuration.
///
/// `enabled` gates every sink emission; `settings` is an opaque mapping
/// handed to whichever sink the caller constructs (run name, project, output
/// path and so on).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub settings: HashMap<String, String>,
}

/// Optimizer selection plus hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimSpec {
    /// Registry name: sgd, adam or adamw.
    pub name: String,
    /// Base learning rate.
    pub lr: f32,
    /// Optimizer-specific knobs (momentum, beta1, beta2, eps, weight_decay).
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

/// Scheduler selection plus hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedSpec {
    /// Registry name: one_cycle, step_decay or cosine_annealing.
    pub name: String,
    /// Step granularity.
    pub interval: StepInterval,
    /// Scheduler-specific knobs.
    #[serde(default)]
    pub params: HashMap<String, f64>,
}

/// Full controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingConfig {
    /// Number of epochs the train loop runs. Must be at least 1.
    pub max_epochs: u32,
    /// Root directory for checkpoint versions and outcome files.
    pub experiment_path: PathBuf,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub optimizer: OptimSpec,
    pub scheduler: SchedSpec,
    #[serde(default)]
    pub device: Device,
}

impl TrainingConfig {
    /// Load and validate a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let config: TrainingConfig = serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse YAML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.max_epochs == 0 {
            return Err(Error::Config("max_epochs must be at least 1".to_string()));
        }
        if self.experiment_path.as_os_str().is_empty() {
            return Err(Error::Config("experiment_path must not be empty".to_string()));
        }
        if !self.optimizer.lr.is_finite() || self.optimizer.lr <= 0.0 {
            return Err(Error::Config(format!(
                "optimizer.lr must be a positive finite number, got {}",
                self.optimizer.lr
            )));
        }
        Ok(())
    }
}
