//! Crate-wide error types.

use thiserror::Error;

/// Errors surfaced by the training harness.
///
/// The harness performs no local recovery: collaborator failures propagate
/// out of the epoch loop and abort the run, leaving the last fully written
/// checkpoint version intact for resumption.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Unknown optimizer: {0}. Supported: sgd, adam, adamw")]
    UnknownOptimizer(String),

    #[error("Unknown scheduler: {0}. Supported: one_cycle, step_decay, cosine_annealing")]
    UnknownScheduler(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result alias for harness operations.
pub type Result<T> = std::result::Result<T, Error>;
