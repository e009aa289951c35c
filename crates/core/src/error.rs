//! Error types for s3-deploy
//!
//! All core operations return [`Result<T>`]. Configuration, rule and pattern
//! errors are caller mistakes and abort before any bucket I/O; storage errors
//! come from the [`ObjectStore`](crate::ObjectStore) implementation.

use std::fmt;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// All errors that can occur while planning or running a deployment
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required configuration value is absent or unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// A cache-control rule line could not be parsed
    #[error("Invalid cache-control rule on line {line} ({text:?}): {kind}")]
    Parse {
        /// 1-based line number within the rule input
        line: usize,
        /// The offending line as supplied
        text: String,
        #[source]
        kind: RuleError,
    },

    /// An include or exclude glob failed to compile
    #[error("Invalid glob pattern {pattern:?}: {reason}")]
    Pattern { pattern: String, reason: String },

    /// The object store rejected an operation
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Walking the working directory failed
    #[error("File discovery failed: {0}")]
    Discovery(String),

    /// One or more uploads failed
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl Error {
    /// Whether the error comes from operator input rather than the environment
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::Config(_) | Error::Parse { .. } | Error::Pattern { .. }
        )
    }
}

/// Reason a single cache-control rule line was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("missing ':' separator, expected \"<directive>: [\\\"pattern\\\", ...]\"")]
    MissingSeparator,

    #[error("invalid pattern list {0:?}, expected a JSON array of strings")]
    InvalidPatternList(String),

    #[error("invalid glob pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A failed upload of a single key
#[derive(Debug)]
pub struct UploadFailure {
    pub key: String,
    pub error: Box<Error>,
}

impl UploadFailure {
    pub fn new(key: impl Into<String>, error: Error) -> Self {
        Self {
            key: key.into(),
            error: Box::new(error),
        }
    }
}

/// Terminal failure of an upload run
///
/// `first` is the first failure observed; failures of sibling uploads that were
/// already in flight are kept in `suppressed`.
#[derive(Debug)]
pub struct AggregateError {
    pub first: UploadFailure,
    pub suppressed: Vec<UploadFailure>,
}

impl AggregateError {
    pub fn new(first: UploadFailure) -> Self {
        Self {
            first,
            suppressed: Vec::new(),
        }
    }

    /// Total number of failed uploads
    pub fn len(&self) -> usize {
        1 + self.suppressed.len()
    }

    /// Always false; an aggregate holds at least one failure
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn failures(&self) -> impl Iterator<Item = &UploadFailure> {
        std::iter::once(&self.first).chain(self.suppressed.iter())
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to upload {}: {}", self.first.key, self.first.error)?;
        if !self.suppressed.is_empty() {
            write!(f, " ({} more upload(s) failed)", self.suppressed.len())?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.first.error)
    }
}
