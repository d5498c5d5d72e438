//! Error taxonomy for file lifecycle operations.
//!
//! Every failure surfaced by the crate is a [`FileError`].  Storage
//! providers report through [`StorageFault`], which keeps the provider's
//! own error code so callers can branch on it.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// A provider-side failure during a put, get, delete or bucket call.
#[derive(Debug, Clone)]
pub struct StorageFault {
    /// Storage operation that failed (`put_object`, `get_object`, ...).
    pub operation: &'static str,
    /// Provider error code, e.g. `NoSuchBucket` or `AccessDenied`.
    pub code: Option<String>,
    /// Human readable detail.
    pub message: String,
}

impl StorageFault {
    pub fn new(operation: &'static str, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            operation,
            code,
            message: message.into(),
        }
    }

    /// Shortcut for a fault with a known provider code.
    pub fn with_code(operation: &'static str, code: &str, message: impl Into<String>) -> Self {
        Self::new(operation, Some(code.to_string()), message)
    }

    /// Whether the provider reported exactly `code`.
    pub fn has_code(&self, code: &str) -> bool {
        self.code.as_deref() == Some(code)
    }
}

impl fmt::Display for StorageFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} failed ({code}): {}", self.operation, self.message),
            None => write!(f, "{} failed: {}", self.operation, self.message),
        }
    }
}

impl std::error::Error for StorageFault {}

/// Errors returned by the storage handle and the file coordinator.
#[derive(Debug, Error)]
pub enum FileError {
    /// The storage handle is not initialized, or required settings are missing.
    #[error("storage is not configured: {0}")]
    Configuration(String),

    /// Network or provider error while talking to object storage.
    #[error(transparent)]
    Storage(#[from] StorageFault),

    /// The object was uploaded but the record row could not be written.
    /// The remote object at `bucket`/`key` is now orphaned.
    #[error("object {bucket}/{key} uploaded but record {id} was not written: {source}")]
    Consistency {
        id: Uuid,
        bucket: String,
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// The public URL could not be built, or would not address the object.
    #[error("invalid public url `{url}`: {reason}")]
    Url {
        url: String,
        reason: String,
        #[source]
        source: Option<url::ParseError>,
    },

    /// Persist was called without a payload attached.
    #[error("no payload attached to file `{name}`")]
    MissingPayload { name: String },

    /// Reading the payload source failed.
    #[error("could not read payload: {0}")]
    Payload(#[from] std::io::Error),

    /// The remote object backing a record does not exist.
    #[error("object {bucket}/{key} does not exist")]
    MissingObject { bucket: String, key: String },

    /// The record store failed outside the upload path.
    #[error("record store error: {0}")]
    Record(#[source] anyhow::Error),
}

impl FileError {
    /// Stable name for the error class, used in logs and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            FileError::Configuration(_) => "ConfigurationFault",
            FileError::Storage(_) => "StorageFault",
            FileError::Consistency { .. } => "ConsistencyFault",
            FileError::Url { .. } => "UrlFault",
            FileError::MissingPayload { .. } => "MissingPayload",
            FileError::Payload(_) => "PayloadFault",
            FileError::MissingObject { .. } => "MissingObject",
            FileError::Record(_) => "RecordFault",
        }
    }

    /// Whether an orphaned remote object may exist because of this error.
    pub fn is_orphaning(&self) -> bool {
        matches!(self, FileError::Consistency { .. })
    }
}
