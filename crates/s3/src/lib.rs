//! sd-s3: S3 SDK adapter for s3-deploy
//!
//! Implements the `ObjectStore` trait from sd-core on top of aws-sdk-s3.

mod client;

pub use client::S3Client;
