//! The process-wide storage handle.
//!
//! A [`StorageHandle`] binds one [`ObjectStorage`] provider to the active
//! bucket and the public base URL.  It starts out unready; every call made
//! before [`StorageHandle::initialize`] fails with
//! [`FileError::Configuration`].  Share it behind an `Arc`.

use std::sync::{Arc, OnceLock};

use tracing::info;

use super::aws::S3Storage;
use super::backend::ObjectStorage;
use crate::config::StorageSettings;
use crate::errors::{FileError, StorageFault};
use crate::public_url::normalize_base;

/// Provider codes tolerated while provisioning the bucket at startup.
const TOLERATED_PROVISIONING_CODES: [&str; 2] = ["BucketAlreadyOwnedByYou", "AccessDenied"];

pub struct StorageHandle {
    backend: OnceLock<Arc<dyn ObjectStorage>>,
    bucket: String,
    public_url: String,
}

impl StorageHandle {
    /// Create an unready handle for `bucket`.
    pub fn new(bucket: impl Into<String>, public_url: &str) -> Self {
        Self {
            backend: OnceLock::new(),
            bucket: bucket.into(),
            public_url: normalize_base(public_url),
        }
    }

    /// Build the S3 client from `settings`, provision the bucket and
    /// return a ready handle.
    pub async fn connect(settings: &StorageSettings) -> Result<Self, FileError> {
        let handle = Self::new(settings.bucket.clone(), &settings.public_url);
        let storage = S3Storage::connect(settings).await;
        handle.initialize(Arc::new(storage)).await?;
        Ok(handle)
    }

    /// Provision the bucket on `backend` and mark the handle ready.
    ///
    /// An existing bucket owned by the caller, or an access-denied answer
    /// (the bucket exists but creation is not permitted), is accepted.
    /// Any other provisioning error is fatal.
    pub async fn initialize(&self, backend: Arc<dyn ObjectStorage>) -> Result<(), FileError> {
        if self.backend.get().is_some() {
            return Err(FileError::Configuration(
                "storage handle is already initialized".to_string(),
            ));
        }

        let provisioned = match backend.create_bucket(&self.bucket).await {
            Ok(()) => Ok(()),
            Err(fault) if is_tolerated(&fault) => Ok(()),
            Err(fault) => Err(fault),
        };
        info!("Using S3 bucket: {}", self.bucket);
        provisioned?;

        self.backend.set(backend).map_err(|_| {
            FileError::Configuration("storage handle is already initialized".to_string())
        })
    }

    pub fn is_ready(&self) -> bool {
        self.backend.get().is_some()
    }

    /// The provider, or a configuration error when the handle is unready.
    pub fn backend(&self) -> Result<&Arc<dyn ObjectStorage>, FileError> {
        self.backend.get().ok_or_else(|| {
            FileError::Configuration(format!(
                "storage handle for bucket `{}` is not initialized",
                self.bucket
            ))
        })
    }

    /// Active bucket; snapshotted onto every file at persist time.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public base URL, always ending in a single `/`.
    pub fn public_url(&self) -> &str {
        &self.public_url
    }
}

fn is_tolerated(fault: &StorageFault) -> bool {
    TOLERATED_PROVISIONING_CODES
        .iter()
        .any(|code| fault.has_code(code))
}
