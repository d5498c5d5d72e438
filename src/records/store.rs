//! Abstract record store trait.
//!
//! The coordinator only needs upsert and delete keyed by file id; `find`
//! lets callers load a persisted file back.  Methods use pinned boxed
//! futures so the trait stays object safe.

use std::future::Future;
use std::pin::Pin;

use uuid::Uuid;

use crate::model::StoredFile;

/// Async record store contract.
pub trait FileRecordStore: Send + Sync + 'static {
    /// Insert or update the row for `file` (upsert on `id`).
    fn insert_or_update(
        &self,
        file: StoredFile,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Delete the row for `id`.  Deleting a missing row is not an error.
    fn delete(&self, id: Uuid) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>>;

    /// Load the row for `id`.
    fn find(
        &self,
        id: Uuid,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<StoredFile>>> + Send + '_>>;
}
