//! sd-core: Core library for the s3-deploy tool
//!
//! This crate provides the core functionality for s3-deploy, including:
//! - Cache-control rule parsing and resolution
//! - Local file discovery with include/exclude globs
//! - Configuration (deploy file and pipeline inputs)
//! - ObjectStore trait for bucket operations
//! - The bounded-concurrency upload orchestrator
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing and potential future support for other backends.

pub mod cache_control;
pub mod config;
pub mod content_type;
pub mod discovery;
pub mod error;
pub mod inputs;
pub mod pattern;
pub mod traits;
pub mod upload;

pub use cache_control::{CacheControlRule, parse_rules, parse_rules_or, resolve};
pub use config::{BucketConfig, DeployConfig, UploadOptions};
pub use discovery::{discover, discover_files};
pub use error::{AggregateError, Error, Result, RuleError, UploadFailure};
pub use inputs::{BoolInput, EnvInputs, InputSource, Inputs};
pub use pattern::{GlobPattern, PatternSet};
pub use traits::{ObjectStore, PutObject};
pub use upload::{DEFAULT_CONCURRENCY, PlannedUpload, UploadSummary, Uploader};
