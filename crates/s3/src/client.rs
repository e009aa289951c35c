//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from sd-core.

use async_trait::async_trait;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use sd_core::{BucketConfig, Error, ObjectStore, PutObject, Result};

/// Maximum keys accepted by a single DeleteObjects request
const DELETE_BATCH_SIZE: i32 = 1000;

/// S3 client wrapper bound to one bucket
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Client {
    /// Create a new S3 client from bucket settings
    pub async fn new(config: &BucketConfig) -> Result<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        if let Some(endpoint) = &config.endpoint {
            validate_endpoint(endpoint)?;
            loader = loader.endpoint_url(endpoint);
        }

        // Static keys win over the default provider chain
        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            let credentials = aws_credential_types::Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None, // session token
                None, // expiry
                "s3-deploy-static-credentials",
            );
            loader = loader.credentials_provider(credentials);
        }

        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(
            bucket = %config.bucket,
            endpoint = ?config.endpoint,
            path_style = config.force_path_style,
            "Created S3 client"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Format AWS SDK error into a detailed error message
    fn format_sdk_error<E: std::fmt::Display>(error: &aws_sdk_s3::error::SdkError<E>) -> String {
        match error {
            aws_sdk_s3::error::SdkError::ServiceError(service_err) => {
                let err = service_err.err();
                let meta = service_err.raw();
                let mut msg = format!("Service error: {}", err);
                if let Some(code) = meta.headers().get("x-amz-error-code") {
                    msg.push_str(&format!(" (code: {})", code));
                }
                msg
            }
            aws_sdk_s3::error::SdkError::ConstructionFailure(err) => {
                format!("Request construction failed: {:?}", err)
            }
            aws_sdk_s3::error::SdkError::TimeoutError(_) => "Request timeout".to_string(),
            aws_sdk_s3::error::SdkError::DispatchFailure(err) => {
                format!("Network dispatch error: {:?}", err)
            }
            aws_sdk_s3::error::SdkError::ResponseError(err) => {
                format!("Response error: {:?}", err)
            }
            _ => error.to_string(),
        }
    }

    /// Delete one batch of keys, returning how many were removed
    async fn delete_batch(&self, keys: Vec<String>) -> Result<usize> {
        if keys.is_empty() {
            return Ok(0);
        }

        let objects = keys
            .iter()
            .map(|k| ObjectIdentifier::builder().key(k).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Storage(e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|e| Error::Storage(e.to_string()))?;

        let response = self
            .inner
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| Error::Storage(Self::format_sdk_error(&e)))?;

        if !response.errors().is_empty() {
            let error_keys: Vec<&str> = response.errors().iter().filter_map(|e| e.key()).collect();
            tracing::warn!("Failed to delete some objects: {:?}", error_keys);
            return Err(Error::Storage(format!(
                "Failed to delete {} object(s) from bucket {}",
                response.errors().len(),
                self.bucket
            )));
        }

        Ok(response.deleted().len())
    }
}

/// Accept only absolute http(s) endpoint URLs
fn validate_endpoint(endpoint: &str) -> Result<()> {
    let url = url::Url::parse(endpoint)
        .map_err(|e| Error::Config(format!("Invalid endpoint URL '{endpoint}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::Config(format!(
            "Unsupported endpoint scheme '{scheme}' in '{endpoint}'"
        ))),
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn clear_bucket(&self) -> Result<usize> {
        let mut deleted = 0;

        // Deleted keys drop out of the listing, so always restart from the first page
        loop {
            let response = self
                .inner
                .list_objects_v2()
                .bucket(&self.bucket)
                .max_keys(DELETE_BATCH_SIZE)
                .send()
                .await
                .map_err(|e| {
                    let err_str = Self::format_sdk_error(&e);
                    if err_str.contains("NoSuchBucket") {
                        Error::Storage(format!("Bucket not found: {}", self.bucket))
                    } else {
                        Error::Storage(err_str)
                    }
                })?;

            let keys: Vec<String> = response
                .contents()
                .iter()
                .filter_map(|o| o.key().map(str::to_string))
                .collect();

            if keys.is_empty() {
                break;
            }

            deleted += self.delete_batch(keys).await?;
            tracing::debug!(deleted, bucket = %self.bucket, "Deleted batch of objects");

            if !response.is_truncated().unwrap_or(false) {
                break;
            }
        }

        Ok(deleted)
    }

    async fn put_object(&self, object: PutObject) -> Result<()> {
        let body = ByteStream::from(object.body);

        self.inner
            .put_object()
            .bucket(&self.bucket)
            .key(&object.key)
            .body(body)
            .content_type(object.content_type)
            .set_cache_control(object.cache_control)
            .send()
            .await
            .map_err(|e| Error::Storage(Self::format_sdk_error(&e)))?;

        Ok(())
    }
}
