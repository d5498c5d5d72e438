//! SQLite-backed record store.
//!
//! Uses `rusqlite` with the `bundled` feature so no system SQLite
//! library is required.  All async trait methods are thin wrappers
//! around synchronous rusqlite calls executed under a `Mutex`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::store::FileRecordStore;
use crate::model::StoredFile;

/// Current schema version. Bumped when migrations are added.
const SCHEMA_VERSION: i64 = 1;

/// Record store backed by a single SQLite database file.
pub struct SqliteFileStore {
    /// The database connection, guarded by a mutex for Send + Sync.
    conn: Mutex<Connection>,
}

impl SqliteFileStore {
    /// Open (or create) the database at `path` and initialize the schema.
    ///
    /// Passing `":memory:"` creates an in-memory database (useful for tests).
    pub fn new(path: &str) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.apply_pragmas()?;
        store.init_db()?;
        Ok(store)
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("record store mutex poisoned"))
    }

    fn apply_pragmas(&self) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            ",
        )?;
        Ok(())
    }

    /// Create the table if it does not already exist.  Idempotent.
    fn init_db(&self) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_version (
                version    INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS s3file (
                id             TEXT PRIMARY KEY,
                name           TEXT NOT NULL,
                content_type   TEXT NOT NULL,
                is_private     INTEGER NOT NULL DEFAULT 1,
                sub_directory  TEXT NOT NULL DEFAULT '',
                bucket         TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_s3file_bucket
                ON s3file(bucket);
            ",
        )?;

        let existing: Option<i64> = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .optional()?
            .flatten();

        if existing.map_or(true, |v| v < SCHEMA_VERSION) {
            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                params![SCHEMA_VERSION, chrono::Utc::now().to_rfc3339()],
            )?;
        }

        Ok(())
    }

    /// Number of rows, mostly useful in tests and diagnostics.
    pub fn count(&self) -> anyhow::Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM s3file", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl FileRecordStore for SqliteFileStore {
    fn insert_or_update(
        &self,
        file: StoredFile,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            let conn = self.lock()?;
            conn.execute(
                "INSERT INTO s3file (id, name, content_type, is_private, sub_directory, bucket)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    content_type = excluded.content_type,
                    is_private = excluded.is_private,
                    sub_directory = excluded.sub_directory,
                    bucket = excluded.bucket",
                params![
                    file.id_string(),
                    file.name(),
                    file.content_type(),
                    file.is_private() as i32,
                    file.sub_directory().unwrap_or(""),
                    file.bucket(),
                ],
            )?;
            Ok(())
        })
    }

    fn delete(&self, id: Uuid) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        Box::pin(async move {
            let conn = self.lock()?;
            conn.execute("DELETE FROM s3file WHERE id = ?1", params![id.to_string()])?;
            Ok(())
        })
    }

    fn find(
        &self,
        id: Uuid,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<StoredFile>>> + Send + '_>> {
        Box::pin(async move {
            let conn = self.lock()?;
            let row = conn
                .query_row(
                    "SELECT name, content_type, is_private, sub_directory, bucket
                     FROM s3file WHERE id = ?1",
                    params![id.to_string()],
                    |row| {
                        let is_private: i32 = row.get(2)?;
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            is_private != 0,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                )
                .optional()
                .with_context(|| format!("loading file record {id}"))?;

            Ok(row.map(|(name, content_type, is_private, sub_directory, bucket)| {
                StoredFile::restore(
                    id,
                    name,
                    content_type,
                    is_private,
                    Some(sub_directory),
                    bucket,
                )
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> SqliteFileStore {
        SqliteFileStore::new(":memory:").expect("failed to create in-memory store")
    }

    fn make_file(name: &str, sub_directory: Option<&str>) -> StoredFile {
        StoredFile::restore(
            Uuid::now_v7(),
            name.to_string(),
            "image/png".to_string(),
            true,
            sub_directory.map(str::to_string),
            "files".to_string(),
        )
    }

    #[tokio::test]
    async fn test_schema_idempotent() {
        let store = test_store();
        store.init_db().expect("second init_db failed");
        store.init_db().expect("third init_db failed");
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = test_store();
        let file = make_file("photo.png", Some("avatars"));
        store.insert_or_update(file.clone()).await.unwrap();

        let fetched = store.find(file.id()).await.unwrap().unwrap();
        assert_eq!(fetched, file);
        assert_eq!(fetched.key(), format!("avatars/{}", file.id()));
    }

    #[tokio::test]
    async fn test_empty_sub_directory_round_trips_as_none() {
        let store = test_store();
        let file = make_file("photo.png", None);
        store.insert_or_update(file.clone()).await.unwrap();

        let fetched = store.find(file.id()).await.unwrap().unwrap();
        assert_eq!(fetched.sub_directory(), None);
    }

    #[tokio::test]
    async fn test_upsert_keeps_single_row() {
        let store = test_store();
        let file = make_file("photo.png", None);
        store.insert_or_update(file.clone()).await.unwrap();
        store.insert_or_update(file.clone()).await.unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = test_store();
        let file = make_file("photo.png", None);
        store.insert_or_update(file.clone()).await.unwrap();

        store.delete(file.id()).await.unwrap();
        assert!(store.find(file.id()).await.unwrap().is_none());
        store.delete(file.id()).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_missing() {
        let store = test_store();
        assert!(store.find(Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.db");
        let path = path.to_str().unwrap();
        let file = make_file("doc.txt", Some("docs"));

        {
            let store = SqliteFileStore::new(path).unwrap();
            store.insert_or_update(file.clone()).await.unwrap();
        }

        let reopened = SqliteFileStore::new(path).unwrap();
        assert_eq!(reopened.find(file.id()).await.unwrap(), Some(file));
    }
}
