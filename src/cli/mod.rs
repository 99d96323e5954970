//! CLI module for the deployment tool.
//!
//! This module provides the command-line interface: argument parsing and
//! rendering of results for humans, scripts and pipeline output files.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::{
    GITHUB_OUTPUT_ENV, OutputFormatter, append_outputs, failure_pairs, outcome_pairs,
    write_github_outputs,
};
