//! In-memory record store.
//!
//! Rows live in a `tokio::sync::RwLock<HashMap<Uuid, StoredFile>>`.
//! Nothing is persisted; intended for tests and embedded use.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::FileRecordStore;
use crate::model::StoredFile;

#[derive(Default)]
pub struct MemoryFileStore {
    rows: RwLock<HashMap<Uuid, StoredFile>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl FileRecordStore for MemoryFileStore {
    fn insert_or_update(
        &self,
        file: StoredFile,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.rows.write().await.insert(file.id(), file);
            Ok(())
        })
    }

    fn delete(&self, id: Uuid) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.rows.write().await.remove(&id);
            Ok(())
        })
    }

    fn find(
        &self,
        id: Uuid,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<StoredFile>>> + Send + '_>> {
        Box::pin(async move { Ok(self.rows.read().await.get(&id).cloned()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_find_delete() {
        let store = MemoryFileStore::new();
        let file = StoredFile::restore(
            Uuid::now_v7(),
            "a.txt".to_string(),
            "text/plain".to_string(),
            false,
            None,
            "files".to_string(),
        );

        store.insert_or_update(file.clone()).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.find(file.id()).await.unwrap(), Some(file.clone()));

        store.delete(file.id()).await.unwrap();
        assert!(store.is_empty().await);
    }
}
