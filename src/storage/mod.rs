//! Object storage layer.
//!
//! The [`backend::ObjectStorage`] trait abstracts over the object-storage
//! provider.  [`aws::S3Storage`] talks to S3 or any S3-compatible endpoint;
//! [`memory::MemoryStorage`] keeps objects in process memory.  The
//! [`handle::StorageHandle`] binds a provider to the active bucket.

pub mod aws;
pub mod backend;
pub mod handle;
pub mod memory;
