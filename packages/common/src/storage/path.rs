use super::error::StorageError;

/// Validates a hierarchical object key.
///
/// Keys are relative, `/`-separated, and may not contain empty, `.` or `..`
/// segments. Spaces are allowed; category labels such as `Packaging Type`
/// travel through keys unchanged.
pub fn validate_object_path(path: &str) -> Result<(), StorageError> {
    if path.is_empty() {
        return Err(StorageError::InvalidPath("path cannot be empty".into()));
    }
    if path.contains('\0') {
        return Err(StorageError::InvalidPath(
            "path must not contain null bytes".into(),
        ));
    }
    if path.contains('\\') {
        return Err(StorageError::InvalidPath(
            "path must not contain backslashes".into(),
        ));
    }
    if path.starts_with('/') {
        return Err(StorageError::InvalidPath(
            "path must not start with '/'".into(),
        ));
    }
    for segment in path.split('/') {
        match segment {
            "" => {
                return Err(StorageError::InvalidPath(format!(
                    "empty segment in '{path}'"
                )));
            }
            "." | ".." => {
                return Err(StorageError::InvalidPath(format!(
                    "relative segment in '{path}'"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Percent-encode each segment of an object key, keeping the `/` separators.
pub fn encode_object_path(path: &str) -> String {
    path.bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'.'
            | b'_'
            | b'~'
            | b'/' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// Join a base URL and an object key into the object's URL.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), encode_object_path(path))
}
