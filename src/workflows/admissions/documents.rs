use std::sync::Arc;

use chrono::Utc;
use mime::Mime;
use serde::Serialize;
use uuid::Uuid;

use super::domain::{DocumentKind, StoredDocument};
use super::repository::{DocumentStorage, StorageError};

/// Per-category size limits and the joint bounds on additional documents.
pub const PHOTO_MAX_BYTES: u64 = 2 * 1024 * 1024;
pub const DOCUMENT_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const ADDITIONAL_MAX_COUNT: usize = 5;
pub const ADDITIONAL_MAX_AGGREGATE_BYTES: u64 = 20 * 1024 * 1024;

const SLUG_MAX_LEN: usize = 40;

/// Raw upload as handed over by the request layer. The content type is
/// sniffed from the bytes; whatever the client declared is never trusted.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn extension(&self) -> Option<String> {
        let name = self.original_name.rsplit_once('.')?;
        let ext = name.1.trim().to_ascii_lowercase();
        if ext.is_empty() || ext.chars().any(|c| !c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(ext)
    }
}

/// One reason an upload (or one file of a batch) was refused. Batch calls
/// collect every reason so the caller can present all of them at once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UploadRejection {
    #[error("'{name}' is {found_bytes} bytes, over the {limit_bytes} byte limit")]
    SizeExceeded {
        name: String,
        limit_bytes: u64,
        found_bytes: u64,
    },
    #[error("'{name}' has content type '{detected}', which is not allowed here")]
    TypeNotAllowed { name: String, detected: String },
    #[error("at most {limit} additional documents are allowed, found {found}")]
    CountExceeded { limit: usize, found: usize },
    #[error("additional documents total {found_bytes} bytes, over the {limit_bytes} byte limit")]
    AggregateSizeExceeded { limit_bytes: u64, found_bytes: u64 },
}

/// Error raised by document intake operations.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload rejected: {}", summarize(.0))]
    Rejected(Vec<UploadRejection>),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn summarize(reasons: &[UploadRejection]) -> String {
    reasons
        .iter()
        .map(|reason| reason.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl DocumentKind {
    const fn max_bytes(self) -> u64 {
        match self {
            DocumentKind::Photo => PHOTO_MAX_BYTES,
            _ => DOCUMENT_MAX_BYTES,
        }
    }

    fn allows_mime(self, detected: &Mime) -> bool {
        match self {
            DocumentKind::Photo => {
                *detected == mime::IMAGE_JPEG || *detected == mime::IMAGE_PNG
            }
            _ => {
                *detected == mime::APPLICATION_PDF
                    || *detected == mime::IMAGE_JPEG
                    || *detected == mime::IMAGE_PNG
            }
        }
    }

    fn allows_extension(self, extension: &str) -> bool {
        match self {
            DocumentKind::Photo => matches!(extension, "jpg" | "jpeg" | "png"),
            _ => matches!(extension, "pdf" | "jpg" | "jpeg" | "png"),
        }
    }
}

/// Detect the content type from leading magic bytes. Only the formats the
/// intake accepts are recognized; anything else is `None`.
fn sniff_mime(bytes: &[u8]) -> Option<Mime> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some(mime::IMAGE_JPEG),
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(mime::IMAGE_PNG),
        [b'%', b'P', b'D', b'F', b'-', ..] => Some(mime::APPLICATION_PDF),
        _ => None,
    }
}

/// Validates and persists admission documents against a blob storage backend.
///
/// Every accepted file passes three independent checks: the per-category size
/// limit, the sniffed content type, and the extension allow-list. Batch calls
/// either store every file or none.
pub struct DocumentIntake<S> {
    storage: Arc<S>,
    root: String,
}

impl<S> DocumentIntake<S>
where
    S: DocumentStorage,
{
    pub fn new(storage: Arc<S>, root: impl Into<String>) -> Self {
        let root = root.into();
        let root = root.trim_end_matches('/').to_string();
        Self { storage, root }
    }

    /// Store an applicant photo, replacing `previous` once the new file has
    /// been validated and written.
    pub fn upload_photo(
        &self,
        file: &UploadedFile,
        previous: Option<&str>,
    ) -> Result<StoredDocument, UploadError> {
        self.upload_document(file, DocumentKind::Photo, previous)
    }

    /// Store a single mandatory document for `kind`.
    pub fn upload_document(
        &self,
        file: &UploadedFile,
        kind: DocumentKind,
        previous: Option<&str>,
    ) -> Result<StoredDocument, UploadError> {
        let reasons = validate_file(file, kind);
        if !reasons.is_empty() {
            return Err(UploadError::Rejected(reasons));
        }

        let stored = self.store(file, kind)?;

        // Never delete-before-validate: the old file goes away only now that
        // the replacement is durable.
        if let Some(path) = previous {
            self.discard_previous(path);
        }

        Ok(stored)
    }

    /// Store a batch of additional documents. The count and aggregate-size
    /// bounds cover `existing` plus the new files; any unmet constraint
    /// fails the whole batch with every reason, and nothing is written.
    pub fn upload_additional(
        &self,
        files: &[UploadedFile],
        existing: &[StoredDocument],
    ) -> Result<Vec<StoredDocument>, UploadError> {
        let mut reasons = Vec::new();

        let total_count = existing.len() + files.len();
        if total_count > ADDITIONAL_MAX_COUNT {
            reasons.push(UploadRejection::CountExceeded {
                limit: ADDITIONAL_MAX_COUNT,
                found: total_count,
            });
        }

        let existing_bytes: u64 = existing.iter().map(|doc| doc.size_bytes).sum();
        let new_bytes: u64 = files.iter().map(UploadedFile::size_bytes).sum();
        let aggregate = existing_bytes + new_bytes;
        if aggregate > ADDITIONAL_MAX_AGGREGATE_BYTES {
            reasons.push(UploadRejection::AggregateSizeExceeded {
                limit_bytes: ADDITIONAL_MAX_AGGREGATE_BYTES,
                found_bytes: aggregate,
            });
        }

        for file in files {
            reasons.extend(validate_file(file, DocumentKind::Additional));
        }

        if !reasons.is_empty() {
            return Err(UploadError::Rejected(reasons));
        }

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            match self.store(file, DocumentKind::Additional) {
                Ok(document) => stored.push(document),
                Err(error) => {
                    // A storage failure mid-batch must not leave a partial
                    // write behind.
                    for document in &stored {
                        self.discard_previous(&document.path);
                    }
                    return Err(error);
                }
            }
        }

        Ok(stored)
    }

    /// Remove a stored document outright.
    pub fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.storage.delete(path)
    }

    fn store(&self, file: &UploadedFile, kind: DocumentKind) -> Result<StoredDocument, UploadError> {
        let path = self.stored_path(file, kind);
        self.storage.write(&path, &file.bytes)?;
        Ok(StoredDocument {
            path,
            size_bytes: file.size_bytes(),
        })
    }

    fn discard_previous(&self, path: &str) {
        match self.storage.delete(path) {
            Ok(()) | Err(StorageError::NotFound(_)) => {}
            Err(error) => {
                tracing::warn!(%path, %error, "failed to delete superseded document");
            }
        }
    }

    /// Synthesize the storage path: category prefix, UTC timestamp, random
    /// token, and a sanitized slug of the original name. The raw client name
    /// never reaches storage.
    fn stored_path(&self, file: &UploadedFile, kind: DocumentKind) -> String {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let token = Uuid::new_v4().simple().to_string();
        let slug = slugify(stem(&file.original_name));
        let extension = file.extension().unwrap_or_else(|| "bin".to_string());
        format!(
            "{}/{}-{}-{}-{}.{}",
            self.root,
            kind.label(),
            timestamp,
            &token[..8],
            slug,
            extension
        )
    }
}

fn validate_file(file: &UploadedFile, kind: DocumentKind) -> Vec<UploadRejection> {
    let mut reasons = Vec::new();

    let limit = kind.max_bytes();
    if file.size_bytes() > limit {
        reasons.push(UploadRejection::SizeExceeded {
            name: file.original_name.clone(),
            limit_bytes: limit,
            found_bytes: file.size_bytes(),
        });
    }

    let sniffed = sniff_mime(&file.bytes);
    let extension_ok = file
        .extension()
        .map(|ext| kind.allows_extension(&ext))
        .unwrap_or(false);
    let mime_ok = sniffed
        .as_ref()
        .map(|detected| kind.allows_mime(detected))
        .unwrap_or(false);

    if !(mime_ok && extension_ok) {
        reasons.push(UploadRejection::TypeNotAllowed {
            name: file.original_name.clone(),
            detected: sniffed
                .map(|detected| detected.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        });
    }

    reasons
}

fn stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len().min(SLUG_MAX_LEN));
    let mut last_dash = true;
    for c in name.chars() {
        if slug.len() >= SLUG_MAX_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "document".to_string()
    } else {
        slug
    }
}
