//! Shared fixtures: a scripted in-memory model and config builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array1, Array2, Array3};

use destilar::config::{
    Device, LoggingConfig, OptimSpec, SchedSpec, StepInterval, TrainingConfig,
};
use destilar::data::{pad_targets, DistillBatch, LabeledBatch};
use destilar::error::Result;
use destilar::model::{AsrModel, ForwardOutput, ModelState, Param};
use destilar::text::{TextProcessor, WordVocab};

/// Deterministic stand-in for a network. Recognition cycles a fixed
/// transcript list; training-mode forward writes a constant gradient into
/// every parameter; every call is recorded for assertions.
pub struct ScriptedModel {
    name: String,
    params: Vec<Param>,
    transcripts: Vec<String>,
    loss: f32,
    /// `predict` flag of each forward call, in order.
    pub forward_calls: Vec<bool>,
    /// Targets and lengths seen by each forward call, in order.
    pub seen_targets: Vec<(Array2<i64>, Vec<usize>)>,
    /// Number of recognize calls.
    pub recognize_calls: usize,
}

impl ScriptedModel {
    pub fn new(name: &str, transcripts: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            params: vec![
                Param::from_vec("encoder.weight", vec![0.5, -0.25, 0.1]),
                Param::from_vec("encoder.bias", vec![0.0]),
            ],
            transcripts: transcripts.iter().map(|s| s.to_string()).collect(),
            loss: 2.0,
            forward_calls: Vec::new(),
            seen_targets: Vec::new(),
            recognize_calls: 0,
        }
    }

    pub fn with_loss(mut self, loss: f32) -> Self {
        self.loss = loss;
        self
    }
}

impl AsrModel for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(
        &mut self,
        features: &Array3<f32>,
        _feature_lengths: &[usize],
        targets: &Array2<i64>,
        target_lengths: &[usize],
        predict: bool,
    ) -> Result<ForwardOutput> {
        self.forward_calls.push(predict);
        self.seen_targets
            .push((targets.clone(), target_lengths.to_vec()));

        if !predict {
            for param in &mut self.params {
                param.set_grad(Array1::from_elem(param.len(), 0.1));
            }
        }

        let rows = features.shape()[0];
        Ok(ForwardOutput {
            outputs: Array2::zeros((rows, 1)),
            output_lengths: vec![1; rows],
            loss: self.loss,
        })
    }

    fn recognize(
        &mut self,
        features: &Array3<f32>,
        _feature_lengths: &[usize],
    ) -> Result<Vec<String>> {
        self.recognize_calls += 1;
        let rows = features.shape()[0];
        Ok((0..rows)
            .map(|row| {
                if self.transcripts.is_empty() {
                    String::new()
                } else {
                    self.transcripts[row % self.transcripts.len()].clone()
                }
            })
            .collect())
    }

    fn params_mut(&mut self) -> &mut [Param] {
        &mut self.params
    }

    fn state(&self) -> ModelState {
        ModelState::from_params(&self.params)
    }

    fn load_state(&mut self, state: &ModelState) -> Result<()> {
        state.apply_to(&mut self.params)
    }

    fn hyperparams(&self) -> HashMap<String, serde_json::Value> {
        HashMap::from([
            ("arch".to_string(), serde_json::json!("scripted")),
            ("n_mels".to_string(), serde_json::json!(2)),
        ])
    }
}

pub fn config_with(
    root: &Path,
    max_epochs: u32,
    scheduler: &str,
    interval: StepInterval,
) -> TrainingConfig {
    TrainingConfig {
        max_epochs,
        experiment_path: root.to_path_buf(),
        logging: LoggingConfig { enabled: true, settings: HashMap::new() },
        optimizer: OptimSpec {
            name: "sgd".to_string(),
            lr: 0.1,
            params: HashMap::new(),
        },
        scheduler: SchedSpec {
            name: scheduler.to_string(),
            interval,
            params: HashMap::new(),
        },
        device: Device::Cpu,
    }
}

pub fn phone_vocab() -> WordVocab {
    WordVocab::from_corpus(["sh iy hh ae d", "x y a b", "aa bb cc"])
}

/// Labeled batch over zero features with the given transcripts encoded and
/// padded.
pub fn labeled_batch(vocab: &WordVocab, transcripts: &[&str]) -> LabeledBatch {
    let n = transcripts.len();
    let features = Array3::zeros((n, 4, 2));
    let encoded: Vec<Vec<i64>> = transcripts
        .iter()
        .map(|t| vocab.text_to_ids(&vocab.tokenize(t)))
        .collect();
    let (targets, target_lengths) = pad_targets(&encoded);
    LabeledBatch::new(features, vec![4; n], targets, target_lengths)
}

/// Distillation batch of `rows` feature rows with the given overrides.
pub fn distill_batch(rows: usize, overrides: Vec<(usize, String)>) -> DistillBatch {
    DistillBatch::new(Array3::zeros((rows, 4, 2)), vec![4; rows], overrides)
}
