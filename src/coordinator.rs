//! File lifecycle coordinator.
//!
//! [`FileCoordinator`] ties the storage handle to the record store and
//! owns the ordering rules between them:
//!
//! * persist uploads first and writes the record only after the upload
//!   succeeded, so a failed upload never leaves a record behind;
//! * a record write failing after a successful upload is reported as
//!   [`FileError::Consistency`], separate from upload failures;
//! * remove deletes the record first, then deletes the remote object on a
//!   best-effort basis.  A failed remote delete is logged and reported in
//!   the returned [`Removal`], never as an error.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use crate::errors::{FileError, StorageFault};
use crate::keys::clone_name;
use crate::metrics;
use crate::model::{NewFile, StoredFile};
use crate::public_url::resolve_url;
use crate::records::store::FileRecordStore;
use crate::storage::backend::{CannedAcl, ObjectMetadata, PutObject, RemoteObject};
use crate::storage::handle::StorageHandle;

/// Outcome of [`FileCoordinator::remove`].
#[derive(Debug)]
pub struct Removal {
    /// Id of the removed file.
    pub id: Uuid,
    /// Set when the record was removed but the remote object could not be.
    pub orphaned: Option<StorageFault>,
}

impl Removal {
    pub fn is_clean(&self) -> bool {
        self.orphaned.is_none()
    }
}

/// Persists, fetches, duplicates and removes stored files.
#[derive(Clone)]
pub struct FileCoordinator {
    storage: Arc<StorageHandle>,
    records: Arc<dyn FileRecordStore>,
}

impl FileCoordinator {
    pub fn new(storage: Arc<StorageHandle>, records: Arc<dyn FileRecordStore>) -> Self {
        Self { storage, records }
    }

    pub fn storage(&self) -> &StorageHandle {
        &self.storage
    }

    /// Assign an identity, upload the payload and write the record.
    pub async fn persist(&self, file: NewFile) -> Result<StoredFile, FileError> {
        let result = self.persist_inner(file).await;
        metrics::record_operation("persist", status(&result));
        result
    }

    async fn persist_inner(&self, file: NewFile) -> Result<StoredFile, FileError> {
        let backend = self.storage.backend().inspect_err(|_| {
            error!("Could not save file because the storage handle is not initialized");
        })?;

        let (stored, payload) = file.into_stored(Uuid::now_v7(), self.storage.bucket().to_string());
        let payload = payload.ok_or_else(|| FileError::MissingPayload {
            name: stored.name().to_string(),
        })?;
        let key = stored.key();

        let content_length = payload.probe_len().await;
        if content_length.is_none() {
            warn!(
                "Can't retrieve payload size for {}/{}; uploading without content length",
                stored.bucket(),
                key
            );
        }
        // Reading consumes the payload, which releases it on every path.
        let data = payload.read_all().await.inspect_err(|e| {
            warn!("Could not read payload for {}/{}: {}", stored.bucket(), key, e);
        })?;
        let size = data.len() as u64;
        let content_length = checked_length(content_length, size);

        let request = PutObject {
            bucket: stored.bucket().to_string(),
            key: key.clone(),
            data,
            metadata: ObjectMetadata::for_upload(stored.content_type(), content_length),
            acl: CannedAcl::for_visibility(stored.is_private()),
        };
        debug!(
            "Uploading {} ({} bytes) to {}/{}",
            stored.name(),
            size,
            stored.bucket(),
            key
        );
        backend.put(request).await.inspect_err(|fault| {
            warn!("Upload of {}/{} failed: {}", stored.bucket(), key, fault);
        })?;
        metrics::record_upload(size);

        if let Err(source) = self.records.insert_or_update(stored.clone()).await {
            error!(
                "Object {}/{} uploaded but record {} could not be written: {:#}",
                stored.bucket(),
                key,
                stored.id(),
                source
            );
            metrics::record_orphan("record_write");
            return Err(FileError::Consistency {
                id: stored.id(),
                bucket: stored.bucket().to_string(),
                key,
                source,
            });
        }

        info!("Stored file {} as {}/{}", stored.name(), stored.bucket(), key);
        Ok(stored)
    }

    /// Delete the record, then best-effort delete the remote object.
    pub async fn remove(&self, file: StoredFile) -> Result<Removal, FileError> {
        let result = self.remove_inner(file).await;
        metrics::record_operation("remove", status(&result));
        result
    }

    async fn remove_inner(&self, file: StoredFile) -> Result<Removal, FileError> {
        let backend = self.storage.backend().inspect_err(|_| {
            error!("Could not delete file because the storage handle is not initialized");
        })?;

        self.records
            .delete(file.id())
            .await
            .map_err(FileError::Record)?;

        let key = file.key();
        let orphaned = match backend.delete(file.bucket(), &key).await {
            Ok(()) => {
                info!("Removed file {} ({}/{})", file.id(), file.bucket(), key);
                None
            }
            Err(fault) => {
                warn!(
                    "Record {} removed but remote object {}/{} was not: {}",
                    file.id(),
                    file.bucket(),
                    key,
                    fault
                );
                metrics::record_orphan("remote_delete");
                Some(fault)
            }
        };

        Ok(Removal {
            id: file.id(),
            orphaned,
        })
    }

    /// Fetch the remote content of `file`.  Never cached.
    ///
    /// Returns `Ok(None)` when the object no longer exists.
    pub async fn fetch_content(&self, file: &StoredFile) -> Result<Option<RemoteObject>, FileError> {
        let result = self.fetch_inner(file).await;
        metrics::record_operation("fetch", status(&result));
        result
    }

    async fn fetch_inner(&self, file: &StoredFile) -> Result<Option<RemoteObject>, FileError> {
        let backend = self.storage.backend().inspect_err(|_| {
            error!("Could not get file content because the storage handle is not initialized");
        })?;
        let key = file.key();
        let object = backend.get(file.bucket(), &key).await?;
        if object.is_none() {
            debug!("No remote object at {}/{}", file.bucket(), key);
        }
        Ok(object)
    }

    /// Create an independent copy of `source` with a new identity.
    ///
    /// The copy gets a timestamped name, the same content type, visibility
    /// and subdirectory, and its own remote object.  Nothing is written if
    /// fetching or persisting fails.
    pub async fn duplicate(&self, source: &StoredFile) -> Result<StoredFile, FileError> {
        let result = self.duplicate_inner(source).await;
        metrics::record_operation("duplicate", status(&result));
        result
    }

    async fn duplicate_inner(&self, source: &StoredFile) -> Result<StoredFile, FileError> {
        let content = self
            .fetch_inner(source)
            .await?
            .ok_or_else(|| FileError::MissingObject {
                bucket: source.bucket().to_string(),
                key: source.key(),
            })?;

        let name = clone_name(source.name(), Utc::now().timestamp_millis());
        let mut copy = NewFile::new(&name, source.content_type())
            .with_private(source.is_private())
            .with_payload(content.data);
        if let Some(dir) = source.sub_directory() {
            copy.set_sub_directory(dir);
        }

        let copy = self.persist(copy).await?;
        debug!("Duplicated file {} into {}", source.id(), copy.id());
        Ok(copy)
    }

    /// Load a persisted file by id.
    pub async fn find(&self, id: Uuid) -> Result<Option<StoredFile>, FileError> {
        self.records.find(id).await.map_err(FileError::Record)
    }

    /// Public address of `file`.  Does not check that the object exists.
    pub fn url(&self, file: &StoredFile) -> Result<Url, FileError> {
        resolve_url(self.storage.public_url(), file.bucket(), &file.key())
    }

    /// Public address of `file` as a string, or `None` when it is malformed.
    pub fn url_string(&self, file: &StoredFile) -> Option<String> {
        self.url(file).ok().map(String::from)
    }
}

/// The probed length, if it still matches the bytes actually read.
fn checked_length(probed: Option<u64>, actual: u64) -> Option<u64> {
    match probed {
        Some(len) if len != actual => {
            warn!(
                "Payload changed size while reading ({} probed, {} read); uploading without content length",
                len, actual
            );
            None
        }
        other => other,
    }
}

fn status<T>(result: &Result<T, FileError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.code(),
    }
}
