//! Shared deployment runner
//!
//! Takes fully resolved settings, runs the upload (or a dry run) and reports
//! the outcome in human or JSON form.

use std::sync::Arc;

use sd_core::upload::plan;
use sd_core::{BucketConfig, Error, PlannedUpload, UploadOptions, UploadSummary, Uploader};
use sd_s3::S3Client;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Everything needed for one run, resolved from flags, deploy file or inputs
#[derive(Debug, Clone)]
pub struct Deployment {
    pub bucket: BucketConfig,
    pub options: UploadOptions,
    pub parallel: usize,
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct UploadOutput {
    bucket: String,
    uploaded: usize,
    total_size_bytes: u64,
    total_size_human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cleared: Option<usize>,
    dry_run: bool,
}

impl UploadOutput {
    fn new(bucket: &str, summary: &UploadSummary) -> Self {
        Self {
            bucket: bucket.to_string(),
            uploaded: summary.uploaded,
            total_size_bytes: summary.bytes,
            total_size_human: humansize::format_size(summary.bytes, humansize::BINARY),
            cleared: summary.cleared,
            dry_run: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct DryRunOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket: Option<String>,
    files: Vec<PlannedUpload>,
    total_count: usize,
    total_size_bytes: u64,
    clear: bool,
    dry_run: bool,
}

/// Execute a resolved deployment
pub async fn run(deployment: Deployment, formatter: &Formatter) -> ExitCode {
    if deployment.dry_run {
        return dry_run(&deployment, formatter);
    }

    let client = match S3Client::new(&deployment.bucket).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let uploader = Uploader::new(Arc::new(client)).with_concurrency(deployment.parallel);

    match uploader.upload(&deployment.options).await {
        Ok(summary) => {
            report(&deployment.bucket.bucket, &summary, formatter);
            ExitCode::Success
        }
        Err(e) => {
            if let Error::Aggregate(aggregate) = &e
                && !formatter.is_json()
            {
                for failure in &aggregate.suppressed {
                    formatter.warning(&format!(
                        "Also failed: {}: {}",
                        failure.key, failure.error
                    ));
                }
            }
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

fn report(bucket: &str, summary: &UploadSummary, formatter: &Formatter) {
    if formatter.is_json() {
        formatter.json(&UploadOutput::new(bucket, summary));
        return;
    }

    if let Some(cleared) = summary.cleared {
        formatter.success(&format!(
            "Deleted {cleared} object(s) from {}",
            formatter.style_name(bucket)
        ));
    }

    let size = humansize::format_size(summary.bytes, humansize::BINARY);
    formatter.success(&format!(
        "Uploaded {} file(s) ({}) to {}",
        summary.uploaded,
        formatter.style_size(&size),
        formatter.style_name(bucket)
    ));
}

fn dry_run(deployment: &Deployment, formatter: &Formatter) -> ExitCode {
    let files = match plan(&deployment.options) {
        Ok(files) => files,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    let total_size: u64 = files
        .iter()
        .filter_map(|f| std::fs::metadata(&f.path).ok())
        .map(|m| m.len())
        .sum();

    if formatter.is_json() {
        let bucket = Some(deployment.bucket.bucket.clone()).filter(|b| !b.is_empty());
        formatter.json(&DryRunOutput {
            bucket,
            total_count: files.len(),
            total_size_bytes: total_size,
            clear: deployment.options.clear,
            files,
            dry_run: true,
        });
        return ExitCode::Success;
    }

    formatter.println("Dry run mode - no changes will be made:");
    formatter.println("");

    if deployment.options.clear {
        formatter.warning("The bucket would be cleared before uploading");
    }

    if files.is_empty() {
        formatter.warning("No files matched the include patterns");
    }

    for file in &files {
        let mut detail = file.content_type.clone();
        if let Some(cc) = &file.cache_control {
            detail.push_str(&format!(", cache-control: {cc}"));
        }
        formatter.println(&format!(
            "  + {} ({})",
            formatter.style_key(&file.key),
            formatter.style_detail(&detail)
        ));
    }

    formatter.println("");
    formatter.println(&format!(
        "Would upload {} file(s), {}",
        files.len(),
        humansize::format_size(total_size, humansize::BINARY)
    ));

    ExitCode::Success
}
