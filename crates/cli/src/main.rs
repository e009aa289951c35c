//! s3-deploy - Deploy a local directory to an S3 bucket
//!
//! CLI entry point that initializes logging and dispatches to subcommands.

mod commands;
mod exit_code;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::{Cli, Commands};
use crate::output::OutputConfig;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let code = match cli.command {
        Commands::Upload(args) => commands::upload::execute(args, output_config).await,
        Commands::Action(args) => commands::action::execute(args, output_config).await,
        Commands::Completions(args) => commands::completions::execute(args),
    };

    code.into()
}

/// Initialize logging: RUST_LOG wins, otherwise quiet = warn, 0 = info, 1+ = debug
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match (quiet, verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, _) => "debug",
        };
        EnvFilter::new(format!("s3_deploy={level},sd_core={level},sd_s3={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
