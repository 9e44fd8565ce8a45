//! Modules layer - Infrastructure adapters for external services
//!
//! Currently holds the object storage used for note files.

pub mod storage;
