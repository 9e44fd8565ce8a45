use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::object_store::{ObjectStore, PutObjectOutput, StoreError};

/// In-memory object store with switchable failures
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail_puts: AtomicBool,
    fail_copies: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_copies(&self, fail: bool) {
        self.fail_copies.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Place an object directly, bypassing failure switches
    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            (data.to_vec(), "application/octet-stream".to_string()),
        );
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<PutObjectOutput, StoreError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("put disabled".to_string()));
        }
        let etag = hex::encode(Sha256::digest(&data));
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(PutObjectOutput {
            key: key.to_string(),
            location: format!("memory://test-bucket/{}", key),
            etag: Some(etag),
        })
    }

    async fn copy(&self, source_key: &str, dest_key: &str) -> Result<(), StoreError> {
        if self.fail_copies.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("copy disabled".to_string()));
        }
        let mut objects = self.objects.lock().unwrap();
        let object = objects
            .get(source_key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(source_key.to_string()))?;
        objects.insert(dest_key.to_string(), object);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Transport("delete disabled".to_string()));
        }
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.contains(key))
    }

    async fn presigned_get_url(
        &self,
        key: &str,
        ttl_secs: u32,
        download_name: Option<&str>,
    ) -> Result<String, StoreError> {
        if !self.contains(key) {
            return Err(StoreError::NotFound(key.to_string()));
        }
        let mut url = format!("memory://test-bucket/{}?expires={}", key, ttl_secs);
        if let Some(name) = download_name {
            url.push_str(&format!("&download={}", urlencoding::encode(name)));
        }
        Ok(url)
    }

    fn bucket_name(&self) -> String {
        "test-bucket".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_missing_source_is_not_found() {
        let store = MemoryObjectStore::new();
        let err = store.copy("pending/a.pdf", "college-notes/a.pdf").await;
        assert_eq!(err, Err(StoreError::NotFound("pending/a.pdf".to_string())));
    }

    #[tokio::test]
    async fn test_put_then_copy_then_delete() {
        let store = MemoryObjectStore::new();
        let out = store
            .put("pending/a.pdf", b"pdf".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert_eq!(out.key, "pending/a.pdf");
        assert!(out.etag.is_some());

        store.copy("pending/a.pdf", "college-notes/a.pdf").await.unwrap();
        store.delete("pending/a.pdf").await.unwrap();

        assert_eq!(store.keys(), vec!["college-notes/a.pdf".to_string()]);
    }
}
