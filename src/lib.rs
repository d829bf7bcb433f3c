//! Teacher-student distillation training harness for ASR models.
//!
//! The core is an epoch-driven controller ([`train::Trainer`]) that owns the
//! optimizer/scheduler lifecycle, versioned checkpointing
//! ([`ckpt::CheckpointStore`]), and gated metric reporting
//! ([`metrics::MetricReporter`]), delegating per-batch work to pluggable
//! strategies: supervised training against gold transcripts
//! ([`train::TeacherStrategy`]) and distillation against teacher-generated
//! pseudo-labels mixed with gold transcripts ([`train::StudentStrategy`]).
//!
//! Collaborators are specified at their interface boundary: the network
//! lives behind [`model::AsrModel`], tokenization behind
//! [`text::TextProcessor`], and batch production behind
//! [`data::DataLoader`].

pub mod ckpt;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod model;
pub mod optim;
pub mod text;
pub mod train;

pub use error::{Error, Result};
