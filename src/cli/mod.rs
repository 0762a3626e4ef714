//! CLI module for draftr - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running a draft,
//! previewing its deadline schedule, and checking configuration.

pub mod commands;

pub use commands::Cli;
