//! CLI command handlers.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::ckpt::CheckpointStore;
use crate::config::TrainingConfig;
use crate::error::{Error, Result};

/// Teacher-student distillation training harness for ASR models.
#[derive(Parser)]
#[command(name = "destilar", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a training config and report problems.
    Validate {
        /// Path to a YAML training configuration.
        config: PathBuf,
    },
    /// Summarize an experiment directory's checkpoint versions.
    Info {
        /// Experiment directory holding version_* subdirectories.
        experiment: PathBuf,
    },
}

pub fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Validate { config } => validate_command(&config),
        Command::Info { experiment } => info_command(&experiment),
    }
}

fn validate_command(path: &Path) -> Result<()> {
    let config = TrainingConfig::from_yaml_file(path)?;

    println!("✓ Config loaded and validated");
    println!("  Experiment: {}", config.experiment_path.display());
    println!("  Epochs: {}", config.max_epochs);
    println!(
        "  Optimizer: {} (lr={})",
        config.optimizer.name, config.optimizer.lr
    );
    println!(
        "  Scheduler: {} ({} interval)",
        config.scheduler.name, config.scheduler.interval
    );
    println!("  Device: {}", config.device);
    println!(
        "  Logging: {}",
        if config.logging.enabled { "enabled" } else { "disabled" }
    );

    Ok(())
}

fn info_command(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(Error::Config(format!(
            "no experiment directory at {}",
            path.display()
        )));
    }

    let store = CheckpointStore::open(path)?;
    let versions = store.versions()?;
    if versions.is_empty() {
        println!("No checkpoints under {}", path.display());
        return Ok(());
    }

    let latest = versions.last().copied().unwrap_or(0);
    println!("{} checkpoint version(s) under {}", versions.len(), path.display());
    for version in versions {
        let dir = path.join(format!("version_{version}"));
        let marker = if version == latest { "  <- latest" } else { "" };
        println!("  version_{version}{marker}");
        let mut files: Vec<String> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        for file in files {
            println!("    {file}");
        }
    }

    Ok(())
}
