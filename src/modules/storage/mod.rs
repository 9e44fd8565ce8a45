//! Storage module for note files
//!
//! Provides the object store abstraction used by the moderation engine, an
//! S3/MinIO-backed implementation, and an in-memory store for tests.

mod object_store;
mod s3_store;

#[cfg(test)]
mod memory_store;

pub use object_store::{ObjectStore, PutObjectOutput, StoreError};
pub use s3_store::S3ObjectStore;

#[cfg(test)]
pub use memory_store::MemoryObjectStore;
