//! The stored file entity, in its two states.
//!
//! [`NewFile`] is the only mutable form: it collects the caller's fields
//! and payload.  Persisting it yields a [`StoredFile`], which exposes
//! getters only.  Once a file has an identity its name, content type,
//! visibility and subdirectory can no longer change, so the remote key
//! and ACL always agree with the record row.

use serde::Serialize;
use uuid::Uuid;

use crate::keys::{derive_key, normalize_sub_directory};
use crate::payload::Payload;

/// A file that has not been persisted yet.
#[derive(Debug)]
pub struct NewFile {
    pub(crate) name: String,
    pub(crate) content_type: String,
    pub(crate) is_private: bool,
    pub(crate) sub_directory: Option<String>,
    pub(crate) payload: Option<Payload>,
}

impl Default for NewFile {
    fn default() -> Self {
        Self {
            name: String::new(),
            content_type: String::new(),
            is_private: true,
            sub_directory: None,
            payload: None,
        }
    }
}

impl NewFile {
    pub fn new(name: &str, content_type: &str) -> Self {
        let mut file = Self::default();
        file.set_name(name);
        file.set_content_type(content_type);
        file
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.trim().to_string();
    }

    pub fn set_content_type(&mut self, content_type: &str) {
        self.content_type = content_type.trim().to_string();
    }

    pub fn set_private(&mut self, is_private: bool) {
        self.is_private = is_private;
    }

    /// Set the logical prefix.  Blank values clear it; `.` and `..`
    /// segments are dropped so the key stays addressable by URL.
    pub fn set_sub_directory(&mut self, sub_directory: &str) {
        self.sub_directory = normalize_sub_directory(sub_directory);
    }

    /// Attach the data to upload, releasing any previously attached payload.
    pub fn set_payload(&mut self, payload: impl Into<Payload>) {
        self.payload = Some(payload.into());
    }

    pub fn with_private(mut self, is_private: bool) -> Self {
        self.set_private(is_private);
        self
    }

    pub fn with_sub_directory(mut self, sub_directory: &str) -> Self {
        self.set_sub_directory(sub_directory);
        self
    }

    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.set_payload(payload);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn sub_directory(&self) -> Option<&str> {
        self.sub_directory.as_deref()
    }

    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Freeze the fields under `id` and `bucket`, handing back the payload.
    pub(crate) fn into_stored(self, id: Uuid, bucket: String) -> (StoredFile, Option<Payload>) {
        let stored = StoredFile {
            id,
            name: self.name,
            content_type: self.content_type,
            is_private: self.is_private,
            sub_directory: self.sub_directory,
            bucket,
        };
        (stored, self.payload)
    }
}

/// A persisted file: identity assigned, object uploaded, record written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    id: Uuid,
    name: String,
    content_type: String,
    is_private: bool,
    sub_directory: Option<String>,
    bucket: String,
}

impl StoredFile {
    /// Rebuild a stored file from a record row.
    ///
    /// `sub_directory` goes through the same normalization as
    /// [`NewFile::set_sub_directory`], so `""` and `None` are equivalent.
    pub fn restore(
        id: Uuid,
        name: String,
        content_type: String,
        is_private: bool,
        sub_directory: Option<String>,
        bucket: String,
    ) -> Self {
        let sub_directory = sub_directory.as_deref().and_then(normalize_sub_directory);
        Self {
            id,
            name,
            content_type,
            is_private,
            sub_directory,
            bucket,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn id_string(&self) -> String {
        self.id.to_string()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn is_private(&self) -> bool {
        self.is_private
    }

    pub fn sub_directory(&self) -> Option<&str> {
        self.sub_directory.as_deref()
    }

    /// Bucket that held the active configuration when the file was persisted.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Remote key of the object within [`StoredFile::bucket`].
    pub fn key(&self) -> String {
        derive_key(&self.id, self.sub_directory())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_file_trims_fields() {
        let file = NewFile::new("  report.pdf ", " application/pdf\n")
            .with_sub_directory("  docs  ");
        assert_eq!(file.name(), "report.pdf");
        assert_eq!(file.content_type(), "application/pdf");
        assert_eq!(file.sub_directory(), Some("docs"));
    }

    #[test]
    fn test_new_file_defaults_to_private() {
        let file = NewFile::new("a.txt", "text/plain");
        assert!(file.is_private());
        assert!(!file.has_payload());
    }

    #[test]
    fn test_blank_sub_directory_is_no_prefix() {
        let mut file = NewFile::new("a.txt", "text/plain").with_sub_directory("docs");
        file.set_sub_directory("   ");
        assert_eq!(file.sub_directory(), None);
    }

    #[test]
    fn test_dot_segments_never_reach_the_key() {
        let file = NewFile::new("a.txt", "text/plain").with_sub_directory("a/../b");
        assert_eq!(file.sub_directory(), Some("a/b"));

        let id = Uuid::now_v7();
        let restored = StoredFile::restore(
            id,
            "a.txt".to_string(),
            "text/plain".to_string(),
            true,
            Some("..".to_string()),
            "files".to_string(),
        );
        assert_eq!(restored.sub_directory(), None);
        assert_eq!(restored.key(), id.to_string());
    }

    #[test]
    fn test_replacing_payload() {
        let mut file = NewFile::new("a.txt", "text/plain").with_payload(b"first".to_vec());
        file.set_payload(b"second".to_vec());
        assert!(file.has_payload());
    }

    #[test]
    fn test_restore_normalizes_sub_directory() {
        let id = Uuid::now_v7();
        let file = StoredFile::restore(
            id,
            "a.txt".to_string(),
            "text/plain".to_string(),
            false,
            Some(String::new()),
            "files".to_string(),
        );
        assert_eq!(file.sub_directory(), None);
        assert_eq!(file.key(), id.to_string());
    }

    #[test]
    fn test_stored_key_uses_sub_directory() {
        let id = Uuid::now_v7();
        let file = StoredFile::restore(
            id,
            "a.txt".to_string(),
            "text/plain".to_string(),
            true,
            Some("avatars".to_string()),
            "files".to_string(),
        );
        assert_eq!(file.key(), format!("avatars/{id}"));
        assert_eq!(file.bucket(), "files");
    }
}
