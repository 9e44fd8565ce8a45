use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by object store operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Object '{0}' not found")]
    NotFound(String),

    #[error("Object store rejected the request: {0}")]
    Rejected(String),

    #[error("Object store transport failure: {0}")]
    Transport(String),
}

/// Result of a successful `put`
#[derive(Debug, Clone, Serialize)]
pub struct PutObjectOutput {
    pub key: String,
    /// Provider URL of the object (not publicly readable on its own)
    pub location: String,
    pub etag: Option<String>,
}

/// Blob store keyed by hierarchical path strings.
///
/// Implementations do not enforce upload policy (size, MIME); callers
/// validate before `put`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<PutObjectOutput, StoreError>;

    /// Server-side copy. Fails with [`StoreError::NotFound`] when the source is missing.
    async fn copy(&self, source_key: &str, dest_key: &str) -> Result<(), StoreError>;

    /// Delete an object. Providers may report a missing key as
    /// [`StoreError::NotFound`]; callers usually treat that as success.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Time-limited read-only URL. `download_name` forces an attachment
    /// disposition with that file name.
    async fn presigned_get_url(
        &self,
        key: &str,
        ttl_secs: u32,
        download_name: Option<&str>,
    ) -> Result<String, StoreError>;

    fn bucket_name(&self) -> String;
}
