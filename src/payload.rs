//! Single-use byte sources attached to a file before its first persist.

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

enum Source {
    Bytes(Bytes),
    File(PathBuf),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

/// Data to upload for a new file.
///
/// A payload is read exactly once.  [`Payload::read_all`] takes it by
/// value, so the underlying reader or file handle is dropped whether the
/// read succeeds or not.
pub struct Payload {
    source: Source,
}

impl Payload {
    /// In-memory payload.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            source: Source::Bytes(data.into()),
        }
    }

    /// Payload read from a file on disk.  The file is opened at upload time.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    /// Payload read from an arbitrary async reader.  Its length is unknown.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            source: Source::Reader(Box::new(reader)),
        }
    }

    /// Best-effort size of the payload in bytes.
    ///
    /// Returns `None` when the size cannot be determined up front; the
    /// caller then uploads without a content-length hint.
    pub async fn probe_len(&self) -> Option<u64> {
        match &self.source {
            Source::Bytes(data) => Some(data.len() as u64),
            Source::File(path) => match tokio::fs::metadata(path).await {
                Ok(meta) => Some(meta.len()),
                Err(e) => {
                    debug!("metadata of {} unavailable: {}", path.display(), e);
                    None
                }
            },
            Source::Reader(_) => None,
        }
    }

    /// Consume the payload and return its full contents.
    pub async fn read_all(self) -> std::io::Result<Bytes> {
        match self.source {
            Source::Bytes(data) => Ok(data),
            Source::File(path) => Ok(Bytes::from(tokio::fs::read(&path).await?)),
            Source::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

impl From<Bytes> for Payload {
    fn from(data: Bytes) -> Self {
        Self::from_bytes(data)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self::from_bytes(data)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Bytes(data) => write!(f, "Payload::Bytes({} bytes)", data.len()),
            Source::File(path) => write!(f, "Payload::File({})", path.display()),
            Source::Reader(_) => f.write_str("Payload::Reader"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_bytes_payload() {
        let payload = Payload::from_bytes(&b"hello"[..]);
        assert_eq!(payload.probe_len().await, Some(5));
        assert_eq!(payload.read_all().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_file_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"on disk").unwrap();

        let payload = Payload::from_path(file.path());
        assert_eq!(payload.probe_len().await, Some(7));
        assert_eq!(payload.read_all().await.unwrap(), Bytes::from_static(b"on disk"));
    }

    #[tokio::test]
    async fn test_missing_file_has_no_length() {
        let dir = tempfile::tempdir().unwrap();
        let payload = Payload::from_path(dir.path().join("absent.bin"));
        assert_eq!(payload.probe_len().await, None);
        assert!(payload.read_all().await.is_err());
    }

    #[tokio::test]
    async fn test_reader_payload_length_unknown() {
        let payload = Payload::from_reader(&b"streamed"[..]);
        assert_eq!(payload.probe_len().await, None);
        assert_eq!(payload.read_all().await.unwrap(), Bytes::from_static(b"streamed"));
    }
}
