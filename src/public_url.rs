//! Public URL resolution for stored objects.
//!
//! The address is computed, not checked: resolving a URL never touches
//! the storage service.

use url::Url;

use crate::errors::FileError;
use crate::keys::is_dot_segment;

/// Return `base` with exactly one trailing `/`.
pub fn normalize_base(base: &str) -> String {
    let mut normalized = base.trim_end_matches('/').to_string();
    normalized.push('/');
    normalized
}

/// Build `<base>/<bucket>/<key>` and parse it as an absolute URL.
///
/// Bucket and key are taken verbatim.  A `.` or `..` segment in either
/// would be collapsed by the parser and point at a different object, so
/// it is rejected.
pub fn resolve_url(base: &str, bucket: &str, key: &str) -> Result<Url, FileError> {
    let raw = format!("{}{bucket}/{key}", normalize_base(base));

    if let Some(segment) = bucket
        .split('/')
        .chain(key.split('/'))
        .find(|segment| is_dot_segment(segment))
    {
        return Err(FileError::Url {
            reason: format!("dot segment `{segment}` cannot be addressed"),
            url: raw,
            source: None,
        });
    }

    Url::parse(&raw).map_err(|source| FileError::Url {
        reason: source.to_string(),
        url: raw,
        source: Some(source),
    })
}
