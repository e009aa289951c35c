//! upload command - Deploy a directory using flags and an optional deploy file
//!
//! Flags override values from the deploy file; credentials come from the
//! standard AWS provider chain.

use std::path::PathBuf;

use clap::Args;
use sd_core::{BucketConfig, DEFAULT_CONCURRENCY, DeployConfig, Error, UploadOptions, parse_rules};

use super::deploy::{self, Deployment};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Upload a local directory to a bucket
#[derive(Args, Debug, Default)]
pub struct UploadArgs {
    /// Target bucket name
    #[arg(short, long, env = "S3_DEPLOY_BUCKET")]
    pub bucket: Option<String>,

    /// Bucket region
    #[arg(long)]
    pub region: Option<String>,

    /// Custom endpoint URL for S3-compatible services
    #[arg(long, env = "S3_DEPLOY_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long)]
    pub path_style: bool,

    /// Glob of files to upload, relative to the working directory (repeatable)
    #[arg(short, long, value_name = "GLOB")]
    pub include: Vec<String>,

    /// Glob of files to skip; wins over --include (repeatable)
    #[arg(short = 'x', long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Directory to upload from [default: .]
    #[arg(short = 'C', long, value_name = "DIR")]
    pub working_directory: Option<PathBuf>,

    /// Delete every object in the bucket before uploading
    #[arg(long)]
    pub clear: bool,

    /// Cache-control rule '<directive>: ["glob", ...]'; first match wins (repeatable)
    #[arg(long = "cache-control", value_name = "RULE")]
    pub cache_control: Vec<String>,

    /// Maximum concurrent uploads [default: 10]
    #[arg(short = 'P', long)]
    pub parallel: Option<usize>,

    /// Show what would be uploaded without touching the bucket
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// TOML deploy file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Execute the upload command
pub async fn execute(args: UploadArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let file = match &args.config {
        Some(path) => match DeployConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                formatter.error(&e.to_string());
                return ExitCode::from_error(&e);
            }
        },
        None => DeployConfig::default(),
    };

    let deployment = match resolve(args, file) {
        Ok(d) => d,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    deploy::run(deployment, &formatter).await
}

/// Layer flags over the deploy file
fn resolve(args: UploadArgs, file: DeployConfig) -> Result<Deployment, Error> {
    let include = prefer(args.include, file.upload.include);
    if include.is_empty() {
        return Err(Error::Config(
            "At least one --include pattern is required".to_string(),
        ));
    }

    let rule_lines = prefer(args.cache_control, file.upload.cache_control);
    let cache_control = parse_rules(&rule_lines)?;

    let options = UploadOptions {
        clear: args.clear || file.upload.clear.unwrap_or(false),
        include,
        exclude: prefer(args.exclude, file.upload.exclude),
        working_directory: args
            .working_directory
            .or(file.upload.working_directory)
            .unwrap_or_else(|| PathBuf::from(".")),
        cache_control,
    };

    let bucket = BucketConfig {
        bucket: args.bucket.or(file.bucket.name).unwrap_or_default(),
        region: args.region.or(file.bucket.region),
        endpoint: args.endpoint.or(file.bucket.endpoint),
        access_key: None,
        secret_key: None,
        force_path_style: args.path_style || file.bucket.path_style.unwrap_or(false),
    };

    Ok(Deployment {
        bucket,
        options,
        parallel: args
            .parallel
            .or(file.upload.parallel)
            .unwrap_or(DEFAULT_CONCURRENCY),
        dry_run: args.dry_run,
    })
}

/// Flag values win when any were given
fn prefer(flags: Vec<String>, file: Vec<String>) -> Vec<String> {
    if flags.is_empty() { file } else { flags }
}
