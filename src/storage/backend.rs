//! Abstract object storage trait.
//!
//! Every storage provider must implement [`ObjectStorage`].  Calls address
//! objects by bucket and key; providers do not retry, retry policy belongs
//! to the underlying SDK.

use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;

use crate::errors::StorageFault;

/// Cache directive attached to every upload.
pub const CACHE_CONTROL: &str = "max-age=315360000, public";

/// Access-control policy applied to an uploaded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedAcl {
    /// Owner-only access.
    Private,
    /// Anyone may read the object.
    PublicRead,
}

impl CannedAcl {
    /// Policy for a file with the given visibility flag.
    pub fn for_visibility(is_private: bool) -> Self {
        if is_private {
            CannedAcl::Private
        } else {
            CannedAcl::PublicRead
        }
    }

    /// Wire value of the canned ACL header.
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::Private => "private",
            CannedAcl::PublicRead => "public-read",
        }
    }
}

/// Object metadata sent along with the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub cache_control: String,
    /// Request AES-256 server-side encryption.
    pub server_side_encryption: bool,
    /// Omitted when the payload size could not be probed.
    pub content_length: Option<u64>,
}

impl ObjectMetadata {
    /// Metadata used for file uploads: long-lived caching and AES-256 at rest.
    pub fn for_upload(content_type: &str, content_length: Option<u64>) -> Self {
        Self {
            content_type: content_type.to_string(),
            cache_control: CACHE_CONTROL.to_string(),
            server_side_encryption: true,
            content_length,
        }
    }
}

/// A complete put request.
#[derive(Debug, Clone)]
pub struct PutObject {
    pub bucket: String,
    pub key: String,
    pub data: Bytes,
    pub metadata: ObjectMetadata,
    pub acl: CannedAcl,
}

/// An object read back from storage.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// Async object storage contract.
pub trait ObjectStorage: Send + Sync + 'static {
    /// Upload an object, replacing any existing object at the same key.
    fn put(
        &self,
        request: PutObject,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageFault>> + Send + '_>>;

    /// Read an object.  A missing key yields `Ok(None)`.
    fn get(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<RemoteObject>, StorageFault>> + Send + '_>>;

    /// Delete an object.  Deleting a missing key is not an error.
    fn delete(
        &self,
        bucket: &str,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageFault>> + Send + '_>>;

    /// Create a bucket.  Providers report an existing bucket through the
    /// fault code (`BucketAlreadyOwnedByYou`).
    fn create_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), StorageFault>> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acl_follows_visibility() {
        assert_eq!(CannedAcl::for_visibility(true), CannedAcl::Private);
        assert_eq!(CannedAcl::for_visibility(false), CannedAcl::PublicRead);
        assert_eq!(CannedAcl::PublicRead.as_str(), "public-read");
    }

    #[test]
    fn test_upload_metadata() {
        let meta = ObjectMetadata::for_upload("image/png", Some(12));
        assert_eq!(meta.content_type, "image/png");
        assert_eq!(meta.cache_control, CACHE_CONTROL);
        assert!(meta.server_side_encryption);
        assert_eq!(meta.content_length, Some(12));
    }
}
