//! Remote key and clone name derivation.
//!
//! Everything here is pure.  [`derive_key`] runs at upload time and again
//! at every later fetch or delete, so its output must never drift for the
//! same inputs.

use uuid::Uuid;

/// Build the remote key for a file: `sub_directory/id`, or just `id`.
///
/// `None`, empty and whitespace-only subdirectories all mean "no prefix".
pub fn derive_key(id: &Uuid, sub_directory: Option<&str>) -> String {
    match sub_directory.map(str::trim) {
        Some(dir) if !dir.is_empty() => format!("{dir}/{id}"),
        _ => id.to_string(),
    }
}

/// Whether `segment` is a `.` or `..` path segment, plain or percent-encoded.
///
/// URL parsers collapse these, so a key containing one has no faithful
/// public address.
pub fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}

/// Canonical form of a subdirectory prefix.
///
/// Segments are trimmed; empty and dot segments are dropped.  Returns
/// `None` when nothing is left, which means "no prefix".
pub fn normalize_sub_directory(sub_directory: &str) -> Option<String> {
    let segments: Vec<&str> = sub_directory
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && !is_dot_segment(segment))
        .collect();
    (!segments.is_empty()).then(|| segments.join("/"))
}

/// Name given to a duplicate of `name` created at `timestamp_millis`.
///
/// `photo.png` becomes `photo_<ts>.png` and `README` becomes
/// `README_<ts>`.  The split happens at the last `.` only.
pub fn clone_name(name: &str, timestamp_millis: i64) -> String {
    match name.rfind('.') {
        Some(idx) => format!(
            "{}_{}.{}",
            &name[..idx],
            timestamp_millis,
            &name[idx + 1..]
        ),
        None => format!("{name}_{timestamp_millis}"),
    }
}
