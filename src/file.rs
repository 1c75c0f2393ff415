use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Map a request path to a filesystem path strictly under `root`.
///
/// Returns `None` for anything that could escape the root: `..`
/// segments (encoded or not), undecodable bytes, and backslashes or
/// NULs smuggled inside a segment.
pub fn resolve(root: &Path, uri_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(uri_path).decode_utf8().ok()?;
    let mut path = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains(['\\', '\0']) => return None,
            s => path.push(s),
        }
    }
    Some(path)
}
