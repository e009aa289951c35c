//! Object store abstraction
//!
//! The upload orchestrator only talks to a bucket through [`ObjectStore`], so
//! the S3 SDK adapter lives in its own crate and tests can swap in fakes.

use async_trait::async_trait;

use crate::error::Result;

/// A single object write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    /// Object key, relative to the bucket root
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    /// `Cache-Control` header; the store applies its own default when `None`
    pub cache_control: Option<String>,
}

/// Bucket operations needed for a deployment
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Delete every object in the bucket, returning how many were removed
    async fn clear_bucket(&self) -> Result<usize>;

    /// Write one object
    async fn put_object(&self, object: PutObject) -> Result<()>;
}
