//! Uploaded documents and their text extraction.

pub mod hash;
pub mod pdf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use strum::{Display, EnumString, IntoStaticStr};
use tracing::{debug, trace};

use crate::error::{ProcessingError, ServiceError, ServiceResult};

/// Which of the two document inputs an upload fills
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentSlot {
    /// The IRB application form under review
    Form,
    /// The institution's IRB policy
    Policy,
}

/// A PDF selected by the user or loaded from the bundled samples.
///
/// Immutable once created; re-selecting a file replaces the whole value.
#[derive(Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub mime_type: String,
    pub content_hash: String,
    pub data: Bytes,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        let content_hash = hash::compute_content_hash(&data);
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            content_hash,
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("content_hash", &self.content_hash)
            .field("size", &self.data.len())
            .finish()
    }
}

/// Check an incoming upload against the size limit and the PDF-only rule.
///
/// A file counts as a PDF when either its declared content type is
/// `application/pdf` or its name ends in `.pdf`.
pub fn validate_upload(
    filename: &str,
    content_type: Option<&str>,
    size: u64,
    max_size: u64,
) -> Result<(), ProcessingError> {
    if size > max_size {
        return Err(ProcessingError::FileTooLarge {
            size,
            max: max_size,
        });
    }

    let declared_pdf = content_type
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.essence_str() == mime::APPLICATION_PDF.essence_str());

    let named_pdf = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if declared_pdf || named_pdf {
        Ok(())
    } else {
        Err(ProcessingError::UnsupportedFormat {
            format: content_type.unwrap_or("unknown").to_string(),
        })
    }
}

/// Extract the text of one document on the blocking thread pool.
pub async fn extract_document_text(
    slot: DocumentSlot,
    document: Arc<UploadedDocument>,
) -> ServiceResult<String> {
    let filename = document.filename.clone();
    let text = tokio::task::spawn_blocking(move || {
        pdf::extract_pdf_text(&document.filename, &document.data)
    })
    .await
    .map_err(|e| ServiceError::Internal {
        message: format!("Text extraction task for {} failed: {}", filename, e),
    })??;

    debug!(slot = %slot, filename = %filename, chars = text.chars().count(), "Extracted document text");
    trace!(slot = %slot, text = %text, "Extracted document text content");

    Ok(text)
}

/// Extract both documents concurrently.
///
/// Fails as soon as either extraction fails; no partial result is returned.
pub async fn extract_pair(
    form: Arc<UploadedDocument>,
    policy: Arc<UploadedDocument>,
) -> ServiceResult<(String, String)> {
    join_extractions(form, policy, extract_document_text).await
}

async fn join_extractions<F, Fut>(
    form: Arc<UploadedDocument>,
    policy: Arc<UploadedDocument>,
    extract: F,
) -> ServiceResult<(String, String)>
where
    F: Fn(DocumentSlot, Arc<UploadedDocument>) -> Fut,
    Fut: Future<Output = ServiceResult<String>>,
{
    tokio::try_join!(
        extract(DocumentSlot::Form, form),
        extract(DocumentSlot::Policy, policy),
    )
}
