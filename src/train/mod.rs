//! The epoch-driven training loop.
//!
//! [`Trainer`] drives the multi-epoch control flow and owns the
//! optimizer/scheduler lifecycle plus the checkpoint/metric protocol;
//! [`Strategy`] supplies the per-batch semantics. Two strategies ship:
//! [`TeacherStrategy`] (supervised ASR training) and [`StudentStrategy`]
//! (distillation against teacher pseudo-labels mixed with gold transcripts).
//!
//! # Example
//!
//! ```no_run
//! use destilar::config::TrainingConfig;
//! use destilar::data::InMemoryLoader;
//! use destilar::metrics::NullSink;
//! use destilar::text::WordVocab;
//! use destilar::train::{TeacherStrategy, Trainer};
//!
//! # fn run(model: impl destilar::model::AsrModel) -> destilar::Result<()> {
//! let config = TrainingConfig::from_yaml_file("train.yaml")?;
//! let vocab = WordVocab::from_corpus(["sh iy hh ae d"]);
//! let strategy = TeacherStrategy::new(model, vocab);
//!
//! let mut trainer = Trainer::new(config, strategy, Box::new(NullSink))?;
//! let train_loader: InMemoryLoader<destilar::data::LabeledBatch> = InMemoryLoader::new(vec![]);
//! let val_loader: InMemoryLoader<destilar::data::LabeledBatch> = InMemoryLoader::new(vec![]);
//! trainer.train(&train_loader, &val_loader)?;
//! # Ok(())
//! # }
//! ```

mod strategy;
mod student;
mod teacher;
mod trainer;

pub use strategy::{EvalContext, StepContext, Strategy};
pub use student::StudentStrategy;
pub use teacher::TeacherStrategy;
pub use trainer::Trainer;
