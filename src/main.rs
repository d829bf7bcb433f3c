//! Destilar CLI
//!
//! Utility entry points around the destilar training library.
//!
//! # Usage
//!
//! ```bash
//! # Validate a training config
//! destilar validate train.yaml
//!
//! # Summarize an experiment directory's checkpoints
//! destilar info experiments/timit-student
//! ```

use clap::Parser;
use destilar::cli::{run_command, Cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
