//! In-memory storage provider.
//!
//! Buckets and objects live in `tokio::sync::RwLock` maps.  Every put keeps
//! the metadata and ACL it was sent with, so the stored state can be
//! inspected after the fact.  Used for tests and local development.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::RwLock;

use super::backend::{CannedAcl, ObjectMetadata, ObjectStorage, PutObject, RemoteObject};
use crate::errors::StorageFault;

/// An object as held by [`MemoryStorage`].
#[derive(Debug, Clone)]
pub struct MemoryObject {
    pub data: Bytes,
    pub metadata: ObjectMetadata,
    pub acl: CannedAcl,
}

/// Storage provider that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStorage {
    buckets: RwLock<HashSet<String>>,
    /// (bucket, key) -> object.
    objects: RwLock<HashMap<(String, String), MemoryObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the object stored at `bucket`/`key`, if any.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<MemoryObject> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of objects across all buckets.
    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }

    async fn ensure_bucket(&self, operation: &'static str, bucket: &str) -> Result<(), StorageFault> {
        if self.buckets.read().await.contains(bucket) {
            Ok(())
        } else {
            Err(StorageFault::with_code(
                operation,
                "NoSuchBucket",
                format!("The specified bucket does not exist: {bucket}"),
            ))
        }
    }
}

impl ObjectStorage for MemoryStorage {
    fn put(
        &self,
        request: PutObject,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageFault>> + Send + '_>> {
        Box::pin(async move {
            self.ensure_bucket("put_object", &request.bucket).await?;
            let object = MemoryObject {
                data: request.data,
                metadata: request.metadata,
                acl: request.acl,
            };
            self.objects
                .write()
                .await
                .insert((request.bucket, request.key), object);
            Ok(())
        })
    }

    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<RemoteObject>, StorageFault>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.ensure_bucket("get_object", &bucket).await?;
            let objects = self.objects.read().await;
            Ok(objects.get(&(bucket, key)).map(|obj| RemoteObject {
                data: obj.data.clone(),
                content_type: Some(obj.metadata.content_type.clone()),
            }))
        })
    }

    fn delete(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageFault>> + Send + '_>> {
        let bucket = bucket.to_string();
        let key = key.to_string();
        Box::pin(async move {
            self.ensure_bucket("delete_object", &bucket).await?;
            self.objects.write().await.remove(&(bucket, key));
            Ok(())
        })
    }

    fn create_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageFault>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            let mut buckets = self.buckets.write().await;
            if !buckets.insert(bucket.clone()) {
                return Err(StorageFault::with_code(
                    "create_bucket",
                    "BucketAlreadyOwnedByYou",
                    format!("Bucket {bucket} already exists and is owned by you"),
                ));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_request(bucket: &str, key: &str, data: &'static [u8]) -> PutObject {
        PutObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            data: Bytes::from_static(data),
            metadata: ObjectMetadata::for_upload("text/plain", Some(data.len() as u64)),
            acl: CannedAcl::Private,
        }
    }

    async fn test_storage() -> MemoryStorage {
        let storage = MemoryStorage::new();
        storage.create_bucket("files").await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let storage = test_storage().await;
        storage.put(put_request("files", "a/1", b"hello")).await.unwrap();

        let obj = storage.get("files", "a/1").await.unwrap().unwrap();
        assert_eq!(obj.data, Bytes::from_static(b"hello"));
        assert_eq!(obj.content_type.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let storage = test_storage().await;
        assert!(storage.get("files", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_bucket_is_fault() {
        let storage = MemoryStorage::new();
        let err = storage.put(put_request("ghost", "k", b"x")).await.unwrap_err();
        assert!(err.has_code("NoSuchBucket"));
        assert_eq!(err.operation, "put_object");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let storage = test_storage().await;
        storage.put(put_request("files", "k", b"x")).await.unwrap();
        storage.delete("files", "k").await.unwrap();
        storage.delete("files", "k").await.unwrap();
        assert_eq!(storage.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_existing_bucket_reports_owned() {
        let storage = test_storage().await;
        let err = storage.create_bucket("files").await.unwrap_err();
        assert!(err.has_code("BucketAlreadyOwnedByYou"));
    }

    #[tokio::test]
    async fn test_put_keeps_metadata_and_acl() {
        let storage = test_storage().await;
        let mut request = put_request("files", "k", b"x");
        request.acl = CannedAcl::PublicRead;
        storage.put(request).await.unwrap();

        let stored = storage.object("files", "k").await.unwrap();
        assert_eq!(stored.acl, CannedAcl::PublicRead);
        assert_eq!(stored.metadata.content_length, Some(1));
    }
}
