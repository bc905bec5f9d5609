//! Document upload endpoint.
//!
//! Shared multipart handling for the JSON API and the page form.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use std::sync::Arc;

use crate::error::{I18nError, ServiceError, ServiceResult};
use crate::ingestion::{DocumentSlot, UploadedDocument, validate_upload};
use crate::service::ShellSnapshot;

use super::AppState;

/// Read the `file` field of a multipart upload into a validated document
pub async fn read_upload(mut multipart: Multipart, max_size: u64) -> ServiceResult<UploadedDocument> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::InvalidRequest {
            message: e.body_text(),
        })?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("document.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| ServiceError::InvalidRequest {
            message: e.body_text(),
        })?;

        // Browsers submit an empty part when no file was chosen
        if data.is_empty() {
            break;
        }

        validate_upload(
            &filename,
            content_type.as_deref(),
            data.len() as u64,
            max_size,
        )?;

        return Ok(UploadedDocument::new(
            filename,
            content_type.unwrap_or_else(|| mime::APPLICATION_PDF.essence_str().to_string()),
            data,
        ));
    }

    Err(ServiceError::InvalidRequest {
        message: "No file provided".to_string(),
    })
}

/// Upload a document into a slot
pub async fn upload_document_handler(
    State(state): State<Arc<AppState>>,
    Path(slot): Path<DocumentSlot>,
    multipart: Multipart,
) -> Result<Json<ShellSnapshot>, I18nError> {
    let max_size = state.service.config.limits.max_document_size_bytes;
    let document = read_upload(multipart, max_size)
        .await
        .map_err(|e| state.i18n_error(e))?;

    state.service.set_document(slot, document).await;
    Ok(Json(state.service.snapshot().await))
}
