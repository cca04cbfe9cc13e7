//! CLI argument definitions using clap with subcommand architecture
//!
//! The CLI is a headless way to inspect recordings outside an editor: list
//! what the agent has captured, print the materialized directory tree, and
//! walk the call tree of a single recording.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Trace-recording inspector
#[derive(Parser, Debug)]
#[command(name = "tracescope")]
#[command(about = "Inspect method-call trace recordings as navigable trees")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root containing the trace data directory
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Trace database to load (defaults to the agent's conventional path)
    #[arg(long, value_name = "FILE", global = true)]
    pub db: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List recorded trace databases, newest first
    #[command(visible_alias = "ls")]
    Recordings,

    /// Print the app directory tree of a recording
    Tree(TreeArgs),

    /// Print the call tree of a recording
    Calls(CallsArgs),

    /// Show a recording's metadata
    Info,

    /// Delete a recorded trace database
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Only show entries under this file
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Recording file to delete
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct CallsArgs {
    /// Maximum depth to print
    #[arg(long, value_name = "N")]
    pub depth: Option<usize>,
}
