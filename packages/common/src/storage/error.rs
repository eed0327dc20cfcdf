use std::fmt;

/// Errors that can occur during object storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The object path is not a valid hierarchical key.
    InvalidPath(String),
    /// The request to the remote store did not complete.
    Backend(String),
    /// The remote store answered with a non-success status.
    Status { path: String, status: u16 },
    /// The backend could not be configured.
    Config(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::InvalidPath(msg) => write!(f, "invalid object path: {msg}"),
            Self::Backend(msg) => write!(f, "object store error: {msg}"),
            Self::Status { path, status } => {
                write!(f, "object store returned status {status} for '{path}'")
            }
            Self::Config(msg) => write!(f, "object store misconfigured: {msg}"),
        }
    }
}

impl StorageError {
    /// Whether repeating the same request may succeed.
    ///
    /// Transport failures, throttling and server-side errors are transient.
    /// Other statuses and local errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Io(_) | Self::InvalidPath(_) | Self::Config(_) => false,
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
