//! S3/MinIO-compatible object store
//!
//! Uses the rust-s3 crate with path-style addressing. The crate is built
//! without `fail-on-err`, so every call inspects the returned status code.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::object_store::{ObjectStore, PutObjectOutput, StoreError};
use crate::core::config::StorageConfig;
use crate::core::error::AppError;

pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
}

impl S3ObjectStore {
    /// Create a new S3 client from configuration
    pub async fn new(config: StorageConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create S3 credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create S3 bucket handle: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let store = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
        };

        info!(
            "S3 object store initialized for endpoint: {}, bucket: {}",
            store.endpoint,
            store.bucket.name()
        );

        Ok(store)
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        match Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        {
            Ok(response) if response.success() => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Ok(response) => {
                // Bucket already exists (409) or similar - this is fine
                debug!(
                    "Bucket '{}' not created (HTTP {}), assuming it exists",
                    self.bucket.name(),
                    response.response_code
                );
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
                Ok(())
            }
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket.name(), key)
    }

    fn check_status(key: &str, status: u16) -> Result<(), StoreError> {
        match status {
            200..=299 => Ok(()),
            404 => Err(StoreError::NotFound(key.to_string())),
            other => Err(StoreError::Rejected(format!(
                "HTTP {} for object '{}'",
                other, key
            ))),
        }
    }
}

fn transport(e: s3::error::S3Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<PutObjectOutput, StoreError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(transport)?;

        Self::check_status(key, response.status_code())?;

        let etag = response
            .headers()
            .get("etag")
            .map(|v| v.trim_matches('"').to_string());

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());

        Ok(PutObjectOutput {
            key: key.to_string(),
            location: self.object_url(key),
            etag,
        })
    }

    async fn copy(&self, source_key: &str, dest_key: &str) -> Result<(), StoreError> {
        let status = self
            .bucket
            .copy_object_internal(source_key, dest_key)
            .await
            .map_err(|e| {
                let message = e.to_string();
                if message.contains("NoSuchKey") || message.contains("404") {
                    StoreError::NotFound(source_key.to_string())
                } else {
                    StoreError::Transport(message)
                }
            })?;

        Self::check_status(source_key, status)?;

        debug!("Copied '{}' to '{}'", source_key, dest_key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let response = self.bucket.delete_object(key).await.map_err(transport)?;

        Self::check_status(key, response.status_code())?;

        debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.bucket.head_object(key).await {
            Ok((_, 404)) => Ok(false),
            Ok((_, status)) => Self::check_status(key, status).map(|_| true),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("404") || error_str.contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(StoreError::Transport(error_str))
                }
            }
        }
    }

    async fn presigned_get_url(
        &self,
        key: &str,
        ttl_secs: u32,
        download_name: Option<&str>,
    ) -> Result<String, StoreError> {
        let custom_queries = download_name.map(|name| {
            let mut queries = HashMap::new();
            queries.insert(
                "response-content-disposition".to_string(),
                format!(
                    "attachment; filename=\"{}\"",
                    urlencoding::encode(name).into_owned()
                ),
            );
            queries
        });

        self.bucket
            .presign_get(key, ttl_secs, custom_queries)
            .await
            .map_err(transport)
    }

    fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}
