use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// Result of validating a flat filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains path traversal patterns (`..`).
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '.' and '..' are not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a flat name (no directory components allowed).
///
/// Used both for uploaded filenames and for attribute values that become
/// object path segments.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == "." || trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    Ok(trimmed)
}

/// Splits a filename into its stem and extension (with the leading dot).
///
/// A leading dot does not start an extension: `.env` has stem `.env` and no
/// extension.
pub fn split_extension(filename: &str) -> (&str, &str) {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => (&filename[..pos], &filename[pos..]),
        _ => (filename, ""),
    }
}

/// `stem + "_" + timestamp + extension`.
pub fn generated_name(original: &str, timestamp_ms: i64) -> String {
    let (stem, ext) = split_extension(original);
    format!("{stem}_{timestamp_ms}{ext}")
}

static LAST_UPLOAD_MS: AtomicI64 = AtomicI64::new(0);

/// Millisecond upload timestamp, strictly increasing across the process.
///
/// Two calls never return the same value, so generated names stay unique
/// even for identical original names under the same prefix.
pub fn next_upload_timestamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_UPLOAD_MS.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_UPLOAD_MS.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
        {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}
