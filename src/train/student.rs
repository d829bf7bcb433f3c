//! Distillation training strategy.
//!
//! The frozen teacher produces a pseudo-label for every row of the batch;
//! rows carrying a gold transcript override it. Most of the batch therefore
//! trains against self-supervised labels while the held-out subset anchors
//! quality against ground truth.

use super::strategy::{run_eval_epoch, EvalContext, StepContext, Strategy};
use crate::config::Device;
use crate::data::{pad_targets, DataLoader, DistillBatch, LabeledBatch};
use crate::error::{Error, Result};
use crate::model::AsrModel;
use crate::text::TextProcessor;

/// Trains a student against teacher pseudo-labels mixed with gold
/// transcripts. Only the student's parameters are ever stepped; the teacher
/// is read-only apart from its own inference buffers.
pub struct StudentStrategy<MT, MS, T> {
    teacher: MT,
    student: MS,
    text: T,
}

impl<MT: AsrModel, MS: AsrModel, T: TextProcessor> StudentStrategy<MT, MS, T> {
    pub fn new(teacher: MT, student: MS, text: T) -> Self {
        Self { teacher, student, text }
    }

    pub fn student(&self) -> &MS {
        &self.student
    }

    pub fn student_mut(&mut self) -> &mut MS {
        &mut self.student
    }

    /// Produce the mixed, integer-encoded training targets for one batch:
    /// teacher pseudo-labels with gold-transcript overrides applied, then
    /// tokenized and encoded.
    fn mixed_targets(&mut self, batch: &DistillBatch) -> Result<Vec<Vec<i64>>> {
        let mut labels = self
            .teacher
            .recognize(&batch.features, &batch.feature_lengths)?;

        for (row, transcript) in &batch.overrides {
            let slot = labels.get_mut(*row).ok_or_else(|| {
                Error::Model(format!(
                    "override row {row} out of range for batch of {}",
                    batch.size()
                ))
            })?;
            *slot = transcript.clone();
        }

        Ok(labels
            .iter()
            .map(|label| self.text.text_to_ids(&self.text.tokenize(label)))
            .collect())
    }
}

impl<MT: AsrModel, MS: AsrModel, T: TextProcessor> Strategy for StudentStrategy<MT, MS, T> {
    type TrainBatch = DistillBatch;
    type EvalBatch = LabeledBatch;

    fn name(&self) -> &'static str {
        "StudentTrainer"
    }

    fn prepare(&mut self, device: &Device) -> Result<()> {
        self.teacher.to_device(device)?;
        self.student.to_device(device)
    }

    fn train_epoch(
        &mut self,
        ctx: &mut StepContext<'_>,
        loader: &dyn DataLoader<DistillBatch>,
        epoch: u32,
    ) -> Result<()> {
        let size = loader.len();

        for (batch_idx, batch) in loader.iter().enumerate() {
            let encoded = self.mixed_targets(&batch)?;
            let (targets, target_lengths) = pad_targets(&encoded);

            ctx.optimizer.zero_grad(self.student.params_mut());

            let out = self.student.forward(
                &batch.features,
                &batch.feature_lengths,
                &targets,
                &target_lengths,
                false,
            )?;

            ctx.optimizer.step(self.student.params_mut());
            ctx.step_scheduler_per_batch();
            ctx.bump_step();
            ctx.log_train_metrics(out.loss);

            println!(
                "[Epoch: {epoch}] {}/{size} | Loss: {:.2}",
                batch_idx + 1,
                out.loss
            );

            ctx.save_checkpoint(self.name(), &self.student, epoch)?;
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
            &mut self.student,
            &self.text,
            ctx,
            loader,
            epoch,
            task,
            outcome_name,
        )
    }
}
