//! CLI module for the GoCD provider.
//!
//! This module provides the command-line interface for planning and applying
//! manifests against a GoCD server.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat, StateCommands};
pub use output::OutputFormatter;
