use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ApplicationId, Document, DocumentId, DocumentStatus, DocumentType};

/// Extensions accepted for any document slot, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "jpg", "jpeg", "png"];

/// Upper bound on a single document, inclusive.
pub const MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

/// File offered by the applicant for a document slot, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub file_name: String,
    pub size_bytes: u64,
}

impl UploadCandidate {
    pub fn new(file_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            size_bytes,
        }
    }
}

/// Reason an upload was refused; the applicant can fix the file and retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UploadRejection {
    #[error("unsupported file type '{extension}' (allowed: pdf, doc, docx, jpg, jpeg, png)")]
    UnsupportedType { extension: String },
    #[error("file is {size_bytes} bytes, above the {limit_bytes} byte limit")]
    TooLarge { size_bytes: u64, limit_bytes: u64 },
}

/// Upload that passed validation and may be handed to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub document_type: DocumentType,
    pub file_name: String,
    pub extension: String,
    pub size_bytes: u64,
    pub content_type: mime::Mime,
}

impl ValidatedUpload {
    pub fn into_document(self, id: DocumentId, stored: StoredFile, now: DateTime<Utc>) -> Document {
        Document {
            id,
            document_type: self.document_type,
            file_name: self.file_name,
            file_path: stored.file_path,
            file_size: self.size_bytes,
            content_type: self.content_type.essence_str().to_string(),
            status: DocumentStatus::Pending,
            uploaded_at: now,
        }
    }
}

/// Check type then size. Nothing is stored here.
pub fn validate_upload(
    candidate: &UploadCandidate,
    document_type: &DocumentType,
) -> Result<ValidatedUpload, UploadRejection> {
    let extension = Path::new(candidate.file_name.trim())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadRejection::UnsupportedType { extension });
    }

    if candidate.size_bytes > MAX_DOCUMENT_BYTES {
        return Err(UploadRejection::TooLarge {
            size_bytes: candidate.size_bytes,
            limit_bytes: MAX_DOCUMENT_BYTES,
        });
    }

    let content_type = mime_guess::from_ext(&extension).first_or_octet_stream();

    Ok(ValidatedUpload {
        document_type: document_type.clone(),
        file_name: candidate.file_name.trim().to_string(),
        extension,
        size_bytes: candidate.size_bytes,
        content_type,
    })
}

/// Location reported back by storage for a persisted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_path: String,
}

/// Storage collaborator that persists validated document bytes.
pub trait FileStorage: Send + Sync {
    fn store(
        &self,
        application_id: &ApplicationId,
        upload: &ValidatedUpload,
        contents: &[u8],
    ) -> Result<StoredFile, StorageError>;

    /// Delete a file previously returned by `store`. Missing files are not an error.
    fn remove(&self, file_path: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage io failure: {0}")]
    Io(#[from] std::io::Error),
}
