//! Supervised ASR training strategy.

use super::strategy::{run_eval_epoch, EvalContext, StepContext, Strategy};
use crate::config::Device;
use crate::data::{DataLoader, LabeledBatch};
use crate::error::Result;
use crate::model::AsrModel;
use crate::text::TextProcessor;

/// Trains one model against ground-truth transcripts.
///
/// Per batch: zero gradients, training-mode forward across the labeled
/// batch, optimizer step, scheduler step when configured per-step, metric
/// emissions, then a checkpoint. Checkpointing after every batch means an
/// externally killed run loses at most one batch of progress.
pub struct TeacherStrategy<M, T> {
    model: M,
    text: T,
}

impl<M: AsrModel, T: TextProcessor> TeacherStrategy<M, T> {
    pub fn new(model: M, text: T) -> Self {
        Self { model, text }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }
}

impl<M: AsrModel, T: TextProcessor> Strategy for TeacherStrategy<M, T> {
    type TrainBatch = LabeledBatch;
    type EvalBatch = LabeledBatch;

    fn name(&self) -> &'static str {
        "TeacherTrainer"
    }

    fn prepare(&mut self, device: &Device) -> Result<()> {
        self.model.to_device(device)
    }

    fn train_epoch(
        &mut self,
        ctx: &mut StepContext<'_>,
        loader: &dyn DataLoader<LabeledBatch>,
        epoch: u32,
    ) -> Result<()> {
        let size = loader.len();

        for (batch_idx, batch) in loader.iter().enumerate() {
            ctx.optimizer.zero_grad(self.model.params_mut());

            let out = self.model.forward(
                &batch.features,
                &batch.feature_lengths,
                &batch.targets,
                &batch.target_lengths,
                false,
            )?;

            ctx.optimizer.step(self.model.params_mut());
            ctx.step_scheduler_per_batch();
            ctx.bump_step();
            ctx.log_train_metrics(out.loss);

            println!(
                "[Epoch: {epoch}] {}/{size} | Loss: {:.2}",
                batch_idx + 1,
                out.loss
            );

            ctx.save_checkpoint(self.name(), &self.model, epoch)?;
        }

        Ok(())
    }

    fn test_epoch(
        &mut self,
        ctx: &mut EvalContext<'_>,
        loader: &dyn DataLoader<LabeledBatch>,
        epoch: u32,
        task: &str,
        outcome_name: Option<&str>,
    ) -> Result<()> {
        run_eval_epoch(
            &mut self.model,
            &self.text,
            ctx,
            loader,
            epoch,
            task,
            outcome_name,
        )
    }
}
