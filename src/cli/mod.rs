//! Command-line interface.

mod commands;

pub use commands::{run_command, Cli, Command};
