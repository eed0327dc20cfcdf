use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};

use super::category::{CategorySchema, FieldKind};
use super::extract::{RawFile, RawPart, RawSubmission, extract_buffer};
use super::model::{ComponentSubmission, ErrorStage, FileBody, FileError, SubmittedFile};
use crate::utils::filename::validate_flat_filename;

/// Classifier output: the submission plus files that had to be dropped.
#[derive(Debug)]
pub struct Classified {
    pub submission: ComponentSubmission,
    pub errors: Vec<FileError>,
}

/// Split a raw multipart body into attributes and categorized files.
///
/// Never fails: files without an extractable buffer are dropped and reported
/// in `errors`, and file fields with unknown category tokens are ignored.
#[instrument(skip_all, fields(stage = "classify", fields = raw.fields.len()))]
pub async fn classify(raw: RawSubmission, schema: &CategorySchema) -> Classified {
    let mut attributes = BTreeMap::new();
    let mut files: BTreeMap<_, Vec<SubmittedFile>> = BTreeMap::new();
    let mut errors = Vec::new();

    for field in raw.fields {
        match schema.classify_field(&field.name) {
            FieldKind::Attribute => match field.part {
                RawPart::Text(value) => {
                    if attributes.insert(field.name.clone(), value).is_some() {
                        debug!(field = %field.name, "Repeated attribute, keeping last value");
                    }
                }
                RawPart::File(file) => {
                    warn!(
                        field = %field.name,
                        file_name = %file.file_name,
                        "File posted under an attribute field, ignoring"
                    );
                }
            },
            FieldKind::UnknownFiles(token) => {
                debug!(field = %field.name, token, "Unknown category token, ignoring");
            }
            FieldKind::Files(category) => {
                let entry = match field.part {
                    RawPart::Text(value) => Ok(SubmittedFile {
                        file_name: field.name.clone(),
                        content_type: None,
                        body: Some(FileBody::Text(value)),
                    }),
                    RawPart::File(file) => resolve_file(file).await,
                };
                match entry {
                    Ok(file) => files.entry(category).or_default().push(file),
                    Err((file_name, reason)) => {
                        warn!(%category, %file_name, %reason, "Dropping file without usable data");
                        errors.push(FileError {
                            file_name,
                            category,
                            stage: ErrorStage::Extraction,
                            reason,
                            slot: None,
                        });
                    }
                }
            }
        }
    }

    Classified {
        submission: ComponentSubmission::new(attributes, files),
        errors,
    }
}

async fn resolve_file(file: RawFile) -> Result<SubmittedFile, (String, String)> {
    let file_name = match validate_flat_filename(&file.file_name) {
        Ok(name) => name.to_string(),
        Err(e) => return Err((file.file_name.clone(), e.message().to_string())),
    };

    match extract_buffer(&file).await {
        Ok(extracted) => {
            debug!(
                %file_name,
                strategy = extracted.strategy.name(),
                size = extracted.bytes.len(),
                "Extracted file buffer"
            );
            Ok(SubmittedFile {
                file_name,
                content_type: file.content_type.clone(),
                body: Some(FileBody::Binary(extracted.bytes)),
            })
        }
        Err(failure) => Err((file_name, failure.to_string())),
    }
}
