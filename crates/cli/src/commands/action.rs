//! action command - Deploy using pipeline inputs
//!
//! Reads every setting from `INPUT_<NAME>` variables, the way CI runners pass
//! step parameters:
//!
//! | input               | kind                         |
//! |---------------------|------------------------------|
//! | `bucket`            | required string              |
//! | `region`            | optional string              |
//! | `endpoint`          | optional string              |
//! | `path-style`        | optional boolean, false      |
//! | `access-key-id`     | optional string              |
//! | `secret-access-key` | optional string              |
//! | `include`           | required, multi-line         |
//! | `exclude`           | required, multi-line         |
//! | `working-directory` | required string              |
//! | `clear`             | optional boolean, false      |
//! | `cache-control`     | optional rules, one per line |
//! | `parallel`          | optional integer, 10         |
//! | `dry-run`           | optional boolean, false      |

use std::path::PathBuf;

use clap::Args;
use sd_core::{
    BucketConfig, DEFAULT_CONCURRENCY, EnvInputs, Error, InputSource, Inputs, UploadOptions,
};

use super::deploy::{self, Deployment};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Upload a directory configured through INPUT_* variables
#[derive(Args, Debug, Default)]
pub struct ActionArgs {}

/// Execute the action command
pub async fn execute(_args: ActionArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let deployment = match from_inputs(&Inputs::new(EnvInputs)) {
        Ok(d) => d,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };

    deploy::run(deployment, &formatter).await
}

/// Build a deployment from named inputs
fn from_inputs<S: InputSource>(inputs: &Inputs<S>) -> Result<Deployment, Error> {
    let bucket = BucketConfig {
        bucket: inputs.required_string("bucket")?,
        region: inputs.optional_string("region"),
        endpoint: inputs.optional_string("endpoint"),
        access_key: inputs.optional_string("access-key-id"),
        secret_key: inputs.optional_string("secret-access-key"),
        force_path_style: inputs.optional_bool("path-style", false),
    };

    let options = UploadOptions {
        clear: inputs.optional_bool("clear", false),
        include: inputs.required_multiline("include")?,
        exclude: inputs.required_multiline("exclude")?,
        working_directory: PathBuf::from(inputs.required_string("working-directory")?),
        cache_control: inputs.cache_control("cache-control", Vec::new())?,
    };

    let parallel = match inputs.optional_string("parallel") {
        Some(value) => value
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                Error::Config(format!(
                    "Input parallel must be a positive integer, got '{value}'"
                ))
            })?,
        None => DEFAULT_CONCURRENCY,
    };

    Ok(Deployment {
        bucket,
        options,
        parallel,
        dry_run: inputs.optional_bool("dry-run", false),
    })
}
