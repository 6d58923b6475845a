//! Object-storage boundary for listing images.
//!
//! Blob transfer itself is the provider's concern; this service hands out
//! the stored object's public URL and deletes objects when a listing image
//! is removed. Metadata is validated before anything reaches this boundary.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::validation::ImageMetadata;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage provider error: {0}")]
    Provider(String),
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Register an object under `key` and return its public URL.
    async fn store(&self, key: &str, metadata: &ImageMetadata) -> Result<String, StorageError>;

    /// Remove the object under `key`. Removing a missing object is not an
    /// error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage used in development and tests.
#[derive(Default)]
pub struct InMemoryStorage {
    objects: DashMap<String, ImageMetadata>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStorage for InMemoryStorage {
    async fn store(&self, key: &str, metadata: &ImageMetadata) -> Result<String, StorageError> {
        self.objects.insert(key.to_string(), metadata.clone());
        Ok(format!("memory://{}", key))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.objects.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_removes_objects() {
        let storage = InMemoryStorage::new();
        let metadata = ImageMetadata {
            file_name: "salon.jpg".into(),
            content_type: "image/jpeg".into(),
            size_bytes: 1024,
        };

        let url = storage.store("p/1/salon.jpg", &metadata).await.unwrap();
        assert_eq!(url, "memory://p/1/salon.jpg");
        assert!(storage.contains("p/1/salon.jpg"));

        storage.remove("p/1/salon.jpg").await.unwrap();
        assert!(!storage.contains("p/1/salon.jpg"));

        // Removing again is fine.
        storage.remove("p/1/salon.jpg").await.unwrap();
    }
}
