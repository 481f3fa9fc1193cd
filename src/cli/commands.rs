//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::MANIFEST_ENV;

/// Declarative management of GoCD server objects.
#[derive(Parser, Debug)]
#[command(name = "terraform-provider-gocd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the manifest file.
    #[arg(short, long, global = true, env = MANIFEST_ENV)]
    pub manifest: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the provider, resource and data source schemas.
    Schema,

    /// Validate the manifest against the provider schemas.
    Validate {
        /// Show all warnings, not just errors.
        #[arg(short, long)]
        warnings: bool,
    },

    /// Show what applying the manifest would change.
    Plan,

    /// Apply the manifest to the GoCD server.
    Apply {
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,

        /// Continue on errors.
        #[arg(long)]
        continue_on_error: bool,
    },

    /// Read every managed object back from the server.
    Refresh,

    /// Delete every managed object.
    Destroy {
        /// Skip confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Read the manifest's data sources.
    Data,

    /// Inspect or edit recorded state.
    State {
        /// State subcommand.
        #[command(subcommand)]
        command: StateCommands,
    },
}

/// State management subcommands.
#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// Show the recorded state with its history.
    Show,

    /// List recorded addresses.
    List,

    /// Forget an address without touching the server.
    Rm {
        /// Address to forget, e.g. `gocd_environment.prod`.
        address: String,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
