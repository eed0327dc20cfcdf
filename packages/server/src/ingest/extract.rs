//! Raw multipart parts and the ordered buffer extraction strategies.
//!
//! A [`RawFile`] can carry its content in several forms depending on how it
//! was received: a single contiguous buffer, a list of chunks, a temp file it
//! was spooled to, or a deferred materializer. Extraction tries each form in a
//! fixed order and takes the first one that yields a non-empty buffer.

use std::fmt;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use futures::future::BoxFuture;
use tracing::warn;

/// Deferred producer of a file's content, invoked at most once per extraction.
pub type Materializer = Box<dyn Fn() -> BoxFuture<'static, std::io::Result<Bytes>> + Send + Sync>;

/// A temp file holding a spooled part. Removed when dropped.
#[derive(Debug)]
pub struct SpooledFile {
    path: PathBuf,
}

impl SpooledFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpooledFile {
    /// Inside a runtime the removal goes to the blocking pool, so dropping a
    /// submission never stalls a worker thread.
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_spooled(&path));
            }
            Err(_) => remove_spooled(&path),
        }
    }
}

fn remove_spooled(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove spooled upload");
        }
    }
}

/// A file part as received, before its content has been resolved.
pub struct RawFile {
    pub file_name: String,
    pub content_type: Option<String>,
    raw_bytes: Option<Bytes>,
    chunks: Vec<Bytes>,
    spooled: Option<SpooledFile>,
    materializer: Option<Materializer>,
}

impl fmt::Debug for RawFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("raw_bytes", &self.raw_bytes.as_ref().map(Bytes::len))
            .field("chunks", &self.chunks.len())
            .field("spooled", &self.spooled)
            .field("materializer", &self.materializer.is_some())
            .finish()
    }
}

impl RawFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            raw_bytes: None,
            chunks: Vec::new(),
            spooled: None,
            materializer: None,
        }
    }

    pub fn with_raw_bytes(mut self, bytes: Bytes) -> Self {
        self.raw_bytes = Some(bytes);
        self
    }

    pub fn with_chunks(mut self, chunks: Vec<Bytes>) -> Self {
        self.chunks = chunks;
        self
    }

    pub fn with_spooled(mut self, spooled: SpooledFile) -> Self {
        self.spooled = Some(spooled);
        self
    }

    pub fn with_materializer(mut self, materializer: Materializer) -> Self {
        self.materializer = Some(materializer);
        self
    }
}

/// A multipart part: a scalar value or a file.
#[derive(Debug)]
pub enum RawPart {
    Text(String),
    File(RawFile),
}

#[derive(Debug)]
pub struct RawField {
    pub name: String,
    pub part: RawPart,
}

/// The parsed multipart body, in arrival order. Repeated names appear as
/// repeated entries.
#[derive(Debug, Default)]
pub struct RawSubmission {
    pub fields: Vec<RawField>,
}

impl RawSubmission {
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push(RawField {
            name: name.to_string(),
            part: RawPart::Text(value.into()),
        });
        self
    }

    pub fn file(mut self, name: &str, file: RawFile) -> Self {
        self.fields.push(RawField {
            name: name.to_string(),
            part: RawPart::File(file),
        });
        self
    }
}

/// Named ways of getting at a file's bytes, tried in [`ExtractStrategy::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractStrategy {
    /// A single contiguous buffer captured with the part.
    RawBytes,
    /// Chunks collected while streaming the part.
    Chunks,
    /// A temp file the part was spooled to.
    Spooled,
    /// A deferred materializer.
    Lazy,
}

enum Attempt {
    Absent,
    Empty,
    Failed(String),
    Found(Bytes),
}

impl ExtractStrategy {
    pub const ORDER: [ExtractStrategy; 4] = [
        ExtractStrategy::RawBytes,
        ExtractStrategy::Chunks,
        ExtractStrategy::Spooled,
        ExtractStrategy::Lazy,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ExtractStrategy::RawBytes => "raw_bytes",
            ExtractStrategy::Chunks => "chunks",
            ExtractStrategy::Spooled => "spooled",
            ExtractStrategy::Lazy => "lazy",
        }
    }

    async fn attempt(self, file: &RawFile) -> Attempt {
        let found = |bytes: Bytes| {
            if bytes.is_empty() {
                Attempt::Empty
            } else {
                Attempt::Found(bytes)
            }
        };

        match self {
            ExtractStrategy::RawBytes => match &file.raw_bytes {
                Some(bytes) => found(bytes.clone()),
                None => Attempt::Absent,
            },
            ExtractStrategy::Chunks => match file.chunks.as_slice() {
                [] => Attempt::Absent,
                [single] => found(single.clone()),
                many => found(Bytes::from(many.concat())),
            },
            ExtractStrategy::Spooled => match &file.spooled {
                Some(spooled) => match tokio::fs::read(spooled.path()).await {
                    Ok(bytes) => found(Bytes::from(bytes)),
                    Err(e) => Attempt::Failed(e.to_string()),
                },
                None => Attempt::Absent,
            },
            ExtractStrategy::Lazy => match &file.materializer {
                Some(materialize) => match materialize().await {
                    Ok(bytes) => found(bytes),
                    Err(e) => Attempt::Failed(e.to_string()),
                },
                None => Attempt::Absent,
            },
        }
    }
}

/// A successfully resolved buffer and the strategy that produced it.
#[derive(Debug)]
pub struct Extracted {
    pub bytes: Bytes,
    pub strategy: ExtractStrategy,
}

/// No strategy produced a non-empty buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    /// One `(strategy, outcome)` entry per strategy tried.
    pub attempts: Vec<(&'static str, String)>,
}

impl fmt::Display for ExtractionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no extractable file data")?;
        let mut sep = " (";
        for (name, outcome) in &self.attempts {
            write!(f, "{sep}{name}: {outcome}")?;
            sep = ", ";
        }
        if !self.attempts.is_empty() {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// Resolve a file's content using the first strategy that yields bytes.
pub async fn extract_buffer(file: &RawFile) -> Result<Extracted, ExtractionFailure> {
    let mut attempts = Vec::new();
    for strategy in ExtractStrategy::ORDER {
        let outcome = match strategy.attempt(file).await {
            Attempt::Found(bytes) => return Ok(Extracted { bytes, strategy }),
            Attempt::Absent => "absent".to_string(),
            Attempt::Empty => "empty".to_string(),
            Attempt::Failed(reason) => format!("failed: {reason}"),
        };
        attempts.push((strategy.name(), outcome));
    }
    Err(ExtractionFailure { attempts })
}
