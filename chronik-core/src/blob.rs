//! Blob-store collaborator: takes uploaded image bytes, hands back a
//! stable reference string that goes on the post.

use async_trait::async_trait;
use chronik_common::model::post::ImageRef;
use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("The uploaded blob was empty")]
    Empty,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the bytes and returns the reference to put on a post.
    /// The reference stays valid forever; blobs are never deleted.
    async fn put(&self, bytes: Vec<u8>) -> Result<ImageRef, BlobError>;

    async fn get(&self, reference: &ImageRef) -> Option<Vec<u8>>;
}

/// Process-local blob store for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    next: AtomicU64,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: Vec<u8>) -> Result<ImageRef, BlobError> {
        if bytes.is_empty() {
            return Err(BlobError::Empty);
        }

        let number = self.next.fetch_add(1, Ordering::Relaxed);
        let reference = format!("images/{number:08x}");
        self.lock().insert(reference.clone(), bytes);
        Ok(ImageRef::new(reference))
    }

    async fn get(&self, reference: &ImageRef) -> Option<Vec<u8>> {
        self.lock().get(reference.get()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{BlobStore, MemoryBlobStore};

    #[tokio::test]
    async fn put_then_get() {
        let blobs = MemoryBlobStore::new();

        let first = blobs.put(vec![1, 2, 3]).await.unwrap();
        let second = blobs.put(vec![4, 5]).await.unwrap();
        assert_ne!(first, second);

        assert_eq!(blobs.get(&first).await.unwrap(), vec![1, 2, 3]);
        assert_eq!(blobs.get(&second).await.unwrap(), vec![4, 5]);
    }

    #[tokio::test]
    async fn empty_uploads_are_rejected() {
        let blobs = MemoryBlobStore::new();
        assert!(blobs.put(Vec::new()).await.is_err());
    }
}
