//! Epoch controller.

use crate::ckpt::{CheckpointStore, RestorePaths};
use crate::config::{StepInterval, TrainingConfig};
use crate::data::DataLoader;
use crate::error::Result;
use crate::metrics::{MetricReporter, MetricSink};
use crate::optim::{build_optimizer, build_scheduler, LrScheduler, Optimizer, OptimizerState, SchedulerState};

use super::strategy::{EvalContext, StepContext, Strategy};

/// Optimizer/scheduler blobs stashed by a restore, injected into the next
/// freshly built pair so training resumes numerically.
struct RestoredState {
    optimizer: OptimizerState,
    scheduler: SchedulerState,
}

/// Drives the multi-epoch loop and owns the optimizer/scheduler lifecycle,
/// the checkpoint store, and the metric reporter. Per-batch behavior is
/// delegated to the strategy.
///
/// Execution is single-threaded and blocking: each batch completes (forward,
/// backward, optimizer step, logging, checkpoint write) before the next
/// begins, and there is no cancellation path. An externally killed run is
/// resumed by locating the highest-numbered version directory and passing
/// its trainer blob to [`Trainer::restore_from_checkpoint`].
pub struct Trainer<S: Strategy> {
    config: TrainingConfig,
    strategy: S,
    reporter: MetricReporter,
    store: CheckpointStore,
    restored: Option<RestoredState>,
    global_step: u64,
}

impl<S: Strategy> Trainer<S> {
    /// Create a controller. Validates the configuration and opens (creating
    /// if missing) the experiment directory.
    pub fn new(config: TrainingConfig, strategy: S, sink: Box<dyn MetricSink>) -> Result<Self> {
        config.validate()?;
        let store = CheckpointStore::open(&config.experiment_path)?;
        let reporter = MetricReporter::new(config.logging.enabled, sink);
        Ok(Self {
            config,
            strategy,
            reporter,
            store,
            restored: None,
            global_step: 0,
        })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    /// Load trainer state from a prior checkpoint.
    ///
    /// The stored hyperparameters replace the current configuration
    /// wholesale (a full overwrite, not a merge); the optimizer and
    /// scheduler blobs are stashed and injected when
    /// [`Trainer::build_optimizer_and_scheduler`] next runs. With no trainer
    /// path in the request this is a cold start and a no-op.
    pub fn restore_from_checkpoint(&mut self, paths: &RestorePaths) -> Result<()> {
        let Some(trainer_path) = &paths.trainer else {
            return Ok(());
        };

        let checkpoint = CheckpointStore::load_trainer(trainer_path)?;
        checkpoint.hyperparams.validate()?;

        self.config = checkpoint.hyperparams;
        self.store = CheckpointStore::open(&self.config.experiment_path)?;
        self.reporter.set_enabled(self.config.logging.enabled);
        self.restored = Some(RestoredState {
            optimizer: checkpoint.optimizer_state,
            scheduler: checkpoint.scheduler_state,
        });

        println!("Restored trainer checkpoint from {}", trainer_path.display());
        Ok(())
    }

    /// Construct the optimizer and scheduler named in the configuration.
    ///
    /// One-cycle schedules are sized `num_batches * max_epochs` before
    /// construction; building one without the full step budget silently
    /// fixes the wrong phase boundaries. Restored numeric state overwrites
    /// the fresh instances before they are returned.
    pub fn build_optimizer_and_scheduler(
        &self,
        num_batches: usize,
    ) -> Result<(Box<dyn Optimizer>, Box<dyn LrScheduler>)> {
        let mut optimizer = build_optimizer(&self.config.optimizer)?;
        let total_steps = num_batches as u64 * u64::from(self.config.max_epochs);
        let mut scheduler =
            build_scheduler(&self.config.scheduler, self.config.optimizer.lr, total_steps)?;

        if let Some(restored) = &self.restored {
            optimizer.load_state(&restored.optimizer)?;
            scheduler.load_state(&restored.scheduler)?;
        }

        // The schedule owns the learning rate from the first step on; for a
        // restored run this lands on the resumed position, not the base lr.
        scheduler.apply(optimizer.as_mut());

        Ok((optimizer, scheduler))
    }

    /// Run the full training loop: for each epoch one training pass then one
    /// validation pass, stepping the scheduler at epoch granularity when so
    /// configured.
    pub fn train(
        &mut self,
        train_loader: &dyn DataLoader<S::TrainBatch>,
        val_loader: &dyn DataLoader<S::EvalBatch>,
    ) -> Result<()> {
        self.strategy.prepare(&self.config.device)?;
        let (mut optimizer, mut scheduler) =
            self.build_optimizer_and_scheduler(train_loader.len())?;

        for epoch in 1..=self.config.max_epochs {
            {
                let mut ctx = StepContext {
                    config: &self.config,
                    optimizer: optimizer.as_mut(),
                    scheduler: scheduler.as_mut(),
                    reporter: &mut self.reporter,
                    store: &self.store,
                    global_step: &mut self.global_step,
                };
                self.strategy.train_epoch(&mut ctx, train_loader, epoch)?;
            }
            {
                let mut ctx = EvalContext {
                    config: &self.config,
                    reporter: &mut self.reporter,
                };
                self.strategy
                    .test_epoch(&mut ctx, val_loader, epoch, "valid", None)?;
            }

            if self.config.scheduler.interval == StepInterval::Epoch {
                scheduler.step();
                scheduler.apply(optimizer.as_mut());
            }
        }

        Ok(())
    }

    /// Single evaluation pass at epoch 0 against the test task.
    pub fn test(&mut self, loader: &dyn DataLoader<S::EvalBatch>) -> Result<()> {
        self.strategy.prepare(&self.config.device)?;
        let mut ctx = EvalContext {
            config: &self.config,
            reporter: &mut self.reporter,
        };
        self.strategy.test_epoch(&mut ctx, loader, 0, "test", None)
    }

    /// Single evaluation pass at epoch 0, writing to a caller-supplied
    /// outcome file.
    pub fn predict(
        &mut self,
        loader: &dyn DataLoader<S::EvalBatch>,
        outcome_name: &str,
    ) -> Result<()> {
        self.strategy.prepare(&self.config.device)?;
        let mut ctx = EvalContext {
            config: &self.config,
            reporter: &mut self.reporter,
        };
        self.strategy
            .test_epoch(&mut ctx, loader, 0, "predict", Some(outcome_name))
    }
}
