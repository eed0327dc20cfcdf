//! Reads a multipart body into a [`RawSubmission`].
//!
//! Small file parts stay in memory; once a part outgrows the inline threshold
//! everything received so far is spooled to a temp file that is removed when
//! the submission is dropped.

use axum::body::Bytes;
use axum::extract::multipart::Field;
use axum::extract::{FromRequest, Multipart, Request};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::error::AppError;
use crate::ingest::extract::{RawField, RawFile, RawPart, RawSubmission, SpooledFile};
use crate::state::AppState;

impl FromRequest<AppState> for RawSubmission {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        let limits = &state.config.ingest;

        let mut submission = RawSubmission::default();
        let mut file_parts = 0usize;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue; // Nameless parts carry nothing we can classify.
            };

            let part = match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    file_parts += 1;
                    if file_parts > limits.max_files {
                        return Err(AppError::Validation(format!(
                            "Too many files: at most {} are accepted",
                            limits.max_files
                        )));
                    }
                    let content_type = field.content_type().map(str::to_string);
                    RawPart::File(read_file(field, file_name, content_type, limits).await?)
                }
                None => RawPart::Text(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read field '{name}': {e}"))
                })?),
            };
            submission.fields.push(RawField { name, part });
        }

        Ok(submission)
    }
}

async fn read_file(
    mut field: Field<'_>,
    file_name: String,
    content_type: Option<String>,
    limits: &IngestConfig,
) -> Result<RawFile, AppError> {
    let io_err = |e: std::io::Error| AppError::Internal(format!("Failed to spool upload: {e}"));

    let mut chunks: Vec<Bytes> = Vec::new();
    let mut buffered = 0usize;
    let mut total = 0u64;
    let mut spool: Option<(SpooledFile, tokio::fs::File)> = None;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        total += chunk.len() as u64;
        if total > limits.max_file_size {
            return Err(AppError::Validation(format!(
                "File '{file_name}' exceeds the maximum size of {} bytes",
                limits.max_file_size
            )));
        }

        match spool.as_mut() {
            Some((_, file)) => file.write_all(&chunk).await.map_err(io_err)?,
            None if buffered + chunk.len() > limits.inline_threshold => {
                let spooled = SpooledFile::new(
                    std::env::temp_dir().join(format!("evidence-upload-{}", Uuid::new_v4())),
                );
                let mut file = tokio::fs::File::create(spooled.path())
                    .await
                    .map_err(io_err)?;
                for buffered_chunk in chunks.drain(..) {
                    file.write_all(&buffered_chunk).await.map_err(io_err)?;
                }
                file.write_all(&chunk).await.map_err(io_err)?;
                spool = Some((spooled, file));
            }
            None => {
                buffered += chunk.len();
                chunks.push(chunk);
            }
        }
    }

    let raw = RawFile::new(file_name, content_type);
    Ok(match spool {
        Some((spooled, mut file)) => {
            file.flush().await.map_err(io_err)?;
            drop(file);
            raw.with_spooled(spooled)
        }
        None if chunks.len() == 1 => raw.with_raw_bytes(chunks.remove(0)),
        None => raw.with_chunks(chunks),
    })
}
