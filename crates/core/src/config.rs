//! Deployment configuration
//!
//! [`UploadOptions`] is everything the orchestrator needs for one run and is
//! built once at the program boundary. [`DeployConfig`] is the optional TOML
//! deploy file that flags are layered on top of.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache_control::CacheControlRule;
use crate::error::{Error, Result};

/// Options for a single upload run
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Empty the whole bucket before uploading
    pub clear: bool,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    /// Base directory; keys are computed relative to it
    pub working_directory: PathBuf,
    /// Ordered cache-control rules, first match wins
    pub cache_control: Vec<CacheControlRule>,
}

/// Connection settings for the target bucket
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BucketConfig {
    pub bucket: String,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Use path-style addressing instead of virtual-hosted buckets
    pub force_path_style: bool,
}

impl BucketConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Check that the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::Config("Bucket name is required".to_string()));
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(Error::Config(
                "Access key and secret key must be provided together".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for BucketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// `[bucket]` table of the deploy file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BucketSection {
    pub name: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub path_style: Option<bool>,
}

/// `[upload]` table of the deploy file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadSection {
    pub working_directory: Option<PathBuf>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub clear: Option<bool>,
    pub parallel: Option<usize>,
    /// Rule lines in `<directive>: ["pattern", ...]` form
    pub cache_control: Vec<String>,
}

/// Deploy file contents
///
/// ```toml
/// [bucket]
/// name = "www.example.com"
/// region = "eu-west-1"
///
/// [upload]
/// working_directory = "dist"
/// include = ["**"]
/// exclude = ["**/*.map"]
/// cache_control = ['no-cache: ["index.html", "**/index.html"]']
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    pub bucket: BucketSection,
    pub upload: UploadSection,
}

impl DeployConfig {
    /// Load a deploy file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read deploy file {}: {e}", path.display()))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Invalid deploy file {}: {e}", path.display())))
    }

    /// Parse deploy file contents
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
