//! Command definitions
//!
//! `upload` takes its settings from flags and an optional deploy file,
//! `action` from pipeline inputs. Both end in [`deploy::run`].

pub mod action;
pub mod completions;
pub mod deploy;
pub mod upload;

use clap::{Parser, Subcommand};

/// Deploy a local directory to an S3 bucket with per-file cache-control rules
#[derive(Parser, Debug)]
#[command(name = "s3-deploy", version, about, long_about = None)]
pub struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a directory using command-line flags and an optional deploy file
    Upload(upload::UploadArgs),

    /// Upload a directory using INPUT_* pipeline variables
    Action(action::ActionArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
