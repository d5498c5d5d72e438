//! s3file -- database records bound to objects in an S3 bucket.
//!
//! A [`StoredFile`] is a record row (name, content type, visibility,
//! subdirectory, bucket) whose payload lives in object storage.  The
//! [`FileCoordinator`] keeps the two in step: it uploads before writing the
//! record, derives the object key and ACL from the record fields, and
//! reports failures between the two writes as their own error.
//!
//! Typical wiring:
//!
//! ```no_run
//! # async fn wire() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use s3file::{FileCoordinator, NewFile, StorageHandle};
//! use s3file::records::sqlite::SqliteFileStore;
//!
//! let config = s3file::config::load_config("s3file.yaml")?;
//! s3file::logging::init_tracing(&config.logging);
//! s3file::metrics::init_metrics();
//!
//! let storage = StorageHandle::connect(&config.storage_settings()?).await?;
//! let records = SqliteFileStore::new(&config.records.sqlite.path)?;
//! let files = FileCoordinator::new(Arc::new(storage), Arc::new(records));
//!
//! let stored = files
//!     .persist(NewFile::new("photo.png", "image/png").with_payload(b"...".to_vec()))
//!     .await?;
//! println!("{:?}", files.url_string(&stored));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod errors;
pub mod keys;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod payload;
pub mod public_url;
pub mod records;
pub mod storage;

pub use coordinator::{FileCoordinator, Removal};
pub use errors::{FileError, StorageFault};
pub use model::{NewFile, StoredFile};
pub use payload::Payload;
pub use storage::handle::StorageHandle;
