//! Pluggable per-batch behavior.
//!
//! The epoch controller owns the optimizer/scheduler lifecycle and hands a
//! [`StepContext`] into the strategy for each training pass; the strategy
//! owns its model(s) and decides what one batch means. Both bundled
//! strategies share the evaluation pass in [`run_eval_epoch`].

use crate::ckpt::{CheckpointStore, ModelCheckpoint, SavedCheckpoint, TrainerCheckpoint};
use crate::config::{Device, StepInterval, TrainingConfig};
use crate::data::DataLoader;
use crate::error::Result;
use crate::eval::{corpus_error_rate, word_error_rate, OutcomeWriter};
use crate::metrics::MetricReporter;
use crate::model::AsrModel;
use crate::optim::{LrScheduler, Optimizer};
use crate::text::TextProcessor;

/// Mutable view of the controller's training machinery, handed to a strategy
/// for the duration of one training pass.
pub struct StepContext<'a> {
    pub config: &'a TrainingConfig,
    pub optimizer: &'a mut dyn Optimizer,
    pub scheduler: &'a mut dyn LrScheduler,
    pub reporter: &'a mut MetricReporter,
    pub store: &'a CheckpointStore,
    /// Cumulative optimizer-step counter, monotonic across epochs. Used as
    /// the step identifier in checkpoint file names and metric emissions.
    pub global_step: &'a mut u64,
}

impl StepContext<'_> {
    /// Advance the global step counter; returns the new value.
    pub fn bump_step(&mut self) -> u64 {
        *self.global_step += 1;
        *self.global_step
    }

    /// Advance the scheduler after an optimizer step, iff configured for
    /// step granularity. Epoch-granularity stepping belongs to the
    /// controller; the two are mutually exclusive.
    pub fn step_scheduler_per_batch(&mut self) {
        if self.config.scheduler.interval == StepInterval::Step {
            self.scheduler.step();
            self.optimizer.set_lr(self.scheduler.lr());
        }
    }

    /// Emit the per-step training metrics (loss and current learning rate).
    pub fn log_train_metrics(&mut self, loss: f32) {
        let step = *self.global_step;
        self.reporter.log("train/loss", f64::from(loss), step);
        let key = format!("lr-{}", self.scheduler.name());
        self.reporter.log(&key, f64::from(self.optimizer.lr()), step);
    }

    /// Save the trainer and model blobs as the next checkpoint version.
    pub fn save_checkpoint(
        &mut self,
        trainer_name: &str,
        model: &dyn AsrModel,
        epoch: u32,
    ) -> Result<SavedCheckpoint> {
        let trainer = TrainerCheckpoint {
            optimizer_state: self.optimizer.state(),
            scheduler_state: self.scheduler.state(),
            hyperparams: self.config.clone(),
        };
        let blob = ModelCheckpoint {
            model_state: model.state(),
            hyperparams: model.hyperparams(),
        };
        self.store.save(
            trainer_name,
            model.name(),
            &trainer,
            &blob,
            epoch,
            *self.global_step,
        )
    }
}

/// View handed to a strategy for one evaluation pass.
pub struct EvalContext<'a> {
    pub config: &'a TrainingConfig,
    pub reporter: &'a mut MetricReporter,
}

/// Per-batch training and evaluation behavior.
///
/// The default method bodies are deliberately inert: a strategy that
/// overrides neither turns the epoch loop into a no-op. Concrete strategies
/// override both.
pub trait Strategy {
    /// Batch type consumed by the training pass.
    type TrainBatch;
    /// Batch type consumed by the evaluation pass.
    type EvalBatch;

    /// Strategy name embedded in trainer checkpoint file names.
    fn name(&self) -> &'static str;

    /// Move the owned model(s) to the configured device. Called once before
    /// any pass; the transfer is blocking.
    fn prepare(&mut self, device: &Device) -> Result<()> {
        let _ = device;
        Ok(())
    }

    /// One training pass over the loader.
    fn train_epoch(
        &mut self,
        ctx: &mut StepContext<'_>,
        loader: &dyn DataLoader<Self::TrainBatch>,
        epoch: u32,
    ) -> Result<()> {
        let _ = (ctx, loader, epoch);
        Ok(())
    }

    /// One evaluation pass over the loader.
    fn test_epoch(
        &mut self,
        ctx: &mut EvalContext<'_>,
        loader: &dyn DataLoader<Self::EvalBatch>,
        epoch: u32,
        task: &str,
        outcome_name: Option<&str>,
    ) -> Result<()> {
        let _ = (ctx, loader, epoch, task, outcome_name);
        Ok(())
    }
}

/// Shared evaluation pass: inference-mode forward for the loss, recognition
/// for hypotheses, reference decoding, per-example and corpus error rates,
/// outcome records, metric emissions.
pub(crate) fn run_eval_epoch<M: AsrModel>(
    model: &mut M,
    text: &dyn TextProcessor,
    ctx: &mut EvalContext<'_>,
    loader: &dyn DataLoader<crate::data::LabeledBatch>,
    epoch: u32,
    task: &str,
    outcome_name: Option<&str>,
) -> Result<()> {
    let default_name = format!("{task}_outcome.txt");
    let file_name = outcome_name.unwrap_or(&default_name);
    let writer = OutcomeWriter::new(ctx.config.experiment_path.join(file_name));
    writer.banner(task, epoch)?;

    let size = loader.len();
    for (batch_idx, batch) in loader.iter().enumerate() {
        let out = model.forward(
            &batch.features,
            &batch.feature_lengths,
            &batch.targets,
            &batch.target_lengths,
            true,
        )?;

        let predicted = model.recognize(&batch.features, &batch.feature_lengths)?;
        let actual: Vec<String> = (0..batch.size())
            .map(|row| {
                let len = batch.target_lengths[row];
                let ids: Vec<i64> = batch.targets.row(row).iter().take(len).copied().collect();
                text.ids_to_text(&ids)
            })
            .collect();

        for (reference, hypothesis) in actual.iter().zip(predicted.iter()) {
            let rate = word_error_rate(reference, hypothesis);
            writer.record(rate, reference, hypothesis)?;
        }

        let batch_rate = corpus_error_rate(
            actual
                .iter()
                .map(String::as_str)
                .zip(predicted.iter().map(String::as_str)),
        );

        ctx.reporter
            .log(&format!("{task}/loss"), f64::from(out.loss), u64::from(epoch));
        ctx.reporter
            .log(&format!("{task}/wer"), batch_rate, u64::from(epoch));

        println!(
            "[Epoch: {epoch}] {task} {}/{size} | Loss: {:.2} | WER: {:.2}%",
            batch_idx + 1,
            out.loss,
            batch_rate * 100.0
        );
    }

    Ok(())
}
