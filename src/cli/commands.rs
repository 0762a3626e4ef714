//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - run: run a draft for an event file
//! - schedule: preview the deadline schedule without starting
//! - check: validate config and event file

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Draftr - a snake-order draft scheduler with deadline allocation
#[derive(Parser, Debug)]
#[command(name = "draftr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a draft for the given event file
    Run {
        /// Path to the event YAML file
        event: PathBuf,

        /// Use this pick store file instead of the configured one
        #[arg(short, long)]
        store: Option<PathBuf>,
    },

    /// Preview the deadline schedule for an event without starting a draft
    Schedule {
        /// Path to the event YAML file
        event: PathBuf,
    },

    /// Validate the config and an event file
    Check {
        /// Path to the event YAML file
        event: PathBuf,
    },
}
