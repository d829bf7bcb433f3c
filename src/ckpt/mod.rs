//! Versioned checkpoint store.
//!
//! Every save event creates `{experiment_path}/version_{N}/` holding exactly
//! two files: a trainer blob (`{TrainerName}.epoch={E}.step={S}.pt`) and a
//! model blob (`{ModelName}.epoch={E}.step={S}.pt`). A version directory is
//! never rewritten; a failed save can only leave a partial *new* directory
//! behind, never touch a prior one.
//!
//! The version number is one past the highest existing `version_N`, so a
//! restored run always writes above everything already on disk and a deleted
//! version's number is never reused.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::error::{Error, Result};
use crate::model::ModelState;
use crate::optim::{OptimizerState, SchedulerState};

const VERSION_PREFIX: &str = "version_";

/// Trainer-side checkpoint blob: optimizer and scheduler state plus the full
/// set of controller hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainerCheckpoint {
    pub optimizer_state: OptimizerState,
    pub scheduler_state: SchedulerState,
    pub hyperparams: TrainingConfig,
}

/// Model-side checkpoint blob: weights plus named model hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelCheckpoint {
    pub model_state: ModelState,
    pub hyperparams: HashMap<String, serde_json::Value>,
}

/// Paths produced by one save event.
#[derive(Debug, Clone)]
pub struct SavedCheckpoint {
    pub version: u32,
    pub trainer_path: PathBuf,
    pub model_path: PathBuf,
}

/// Restore request. An absent field means cold start for that half.
#[derive(Debug, Clone, Default)]
pub struct RestorePaths {
    /// Path to a trainer checkpoint blob.
    pub trainer: Option<PathBuf>,
}

/// Store rooted at an experiment directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    root: PathBuf,
}

impl CheckpointStore {
    /// Open a store, creating the experiment directory when it is missing.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Existing version indices, ascending.
    pub fn versions(&self) -> Result<Vec<u32>> {
        let mut versions = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(suffix) = name.to_string_lossy().strip_prefix(VERSION_PREFIX).map(String::from)
            else {
                continue;
            };
            if let Ok(n) = suffix.parse::<u32>() {
                versions.push(n);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    /// Next free version number: one past the highest existing index.
    pub fn next_version(&self) -> Result<u32> {
        Ok(self.versions()?.last().map_or(0, |&v| v + 1))
    }

    /// Highest-numbered version directory, if any. The restart entry point
    /// after an external kill.
    pub fn latest_version(&self) -> Result<Option<(u32, PathBuf)>> {
        Ok(self
            .versions()?
            .last()
            .map(|&v| (v, self.version_path(v))))
    }

    fn version_path(&self, version: u32) -> PathBuf {
        self.root.join(format!("{VERSION_PREFIX}{version}"))
    }

    /// Write one checkpoint event: a fresh version directory with the two
    /// blobs inside.
    pub fn save(
        &self,
        trainer_name: &str,
        model_name: &str,
        trainer: &TrainerCheckpoint,
        model: &ModelCheckpoint,
        epoch: u32,
        step: u64,
    ) -> Result<SavedCheckpoint> {
        let version = self.next_version()?;
        let version_path = self.version_path(version);
        fs::create_dir(&version_path).map_err(|e| {
            Error::Checkpoint(format!(
                "failed to create {}: {e}",
                version_path.display()
            ))
        })?;

        let trainer_path =
            version_path.join(format!("{trainer_name}.epoch={epoch}.step={step}.pt"));
        let model_path = version_path.join(format!("{model_name}.epoch={epoch}.step={step}.pt"));

        fs::write(&trainer_path, serde_json::to_string_pretty(trainer)?)?;
        fs::write(&model_path, serde_json::to_string_pretty(model)?)?;

        Ok(SavedCheckpoint { version, trainer_path, model_path })
    }

    /// Load a trainer blob. Unknown fields are rejected.
    pub fn load_trainer(path: impl AsRef<Path>) -> Result<TrainerCheckpoint> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Checkpoint(format!("failed to read {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load a model blob.
    pub fn load_model(path: impl AsRef<Path>) -> Result<ModelCheckpoint> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Checkpoint(format!("failed to read {}: {e}", path.display()))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}
