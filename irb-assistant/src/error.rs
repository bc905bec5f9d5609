use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::i18n::I18n;

/// Main service error type
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Both the IRB form and the IRB policy must be uploaded")]
    MissingDocuments,

    #[error("An analysis is already in progress")]
    AnalysisInProgress,

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Failed to load sample files")]
    SampleLoad(#[from] SampleLoadError),

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// PDF extraction errors
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Failed to parse PDF document {filename}")]
    DocumentParse {
        filename: String,
        #[source]
        source: lopdf::Error,
    },

    #[error("Failed to extract text from page {page} of {filename}")]
    TextExtraction {
        filename: String,
        page: u32,
        #[source]
        source: lopdf::Error,
    },

    #[error("Unsupported file format: {format}")]
    UnsupportedFormat { format: String },

    #[error("File too large: {size} bytes (max {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },
}

/// Completion endpoint errors
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Connection failed to completion endpoint at {url}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Completion request failed (status {status}): {message}")]
    ApiRequest { status: u16, message: String },

    #[error("Invalid response from completion endpoint")]
    InvalidResponse {
        #[source]
        source: reqwest::Error,
    },

    #[error("No completion API key configured")]
    MissingApiKey,
}

/// Sample asset errors
#[derive(Error, Debug)]
pub enum SampleLoadError {
    #[error("Failed to read sample file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// API error response (matches Axum's built-in JsonRejection format)
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::MissingDocuments | ServiceError::InvalidRequest { .. } => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::AnalysisInProgress => StatusCode::CONFLICT,
            ServiceError::Processing(ProcessingError::DocumentParse { .. })
            | ServiceError::Processing(ProcessingError::TextExtraction { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::Processing(ProcessingError::UnsupportedFormat { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServiceError::Processing(ProcessingError::FileTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ServiceError::Completion(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::MissingDocuments => "missing_documents",
            ServiceError::AnalysisInProgress => "analysis_in_progress",
            ServiceError::Processing(ProcessingError::DocumentParse { .. }) => {
                "document_parse_error"
            }
            ServiceError::Processing(ProcessingError::TextExtraction { .. }) => {
                "text_extraction_error"
            }
            ServiceError::Processing(ProcessingError::UnsupportedFormat { .. }) => {
                "unsupported_format"
            }
            ServiceError::Processing(ProcessingError::FileTooLarge { .. }) => "file_too_large",
            ServiceError::Completion(CompletionError::Connection { .. }) => "completion_connection",
            ServiceError::Completion(CompletionError::ApiRequest { .. }) => "api_request_error",
            ServiceError::Completion(CompletionError::InvalidResponse { .. }) => {
                "completion_invalid_response"
            }
            ServiceError::Completion(CompletionError::MissingApiKey) => "missing_api_key",
            ServiceError::SampleLoad(_) => "sample_load_error",
            ServiceError::InvalidRequest { .. } => "invalid_request",
            ServiceError::Config { .. } => "config_error",
            ServiceError::Internal { .. } => "internal_error",
        }
    }

    /// Get a user-friendly translated message
    pub fn user_message(&self, i18n: &I18n, locale: &str) -> String {
        match self {
            ServiceError::MissingDocuments => i18n.get(locale, "error-missing-documents", None),
            ServiceError::AnalysisInProgress => {
                i18n.get(locale, "error-analysis-in-progress", None)
            }
            ServiceError::SampleLoad(_) => i18n.get(locale, "error-sample-load", None),
            ServiceError::Internal { .. } => i18n.get(locale, "error-internal", None),
            // For other errors, fall back to the technical message
            _ => self.to_string(),
        }
    }

    /// Convert to an error response with i18n support
    pub fn into_response_with_i18n(self, i18n: &I18n, locale: &str) -> Response {
        let status = self.status_code();
        let response = ErrorResponse {
            message: self.user_message(i18n, locale),
            code: Some(self.error_code().to_string()),
        };

        (status, Json(response)).into_response()
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let response = ErrorResponse {
            message: self.to_string(),
            code: Some(self.error_code().to_string()),
        };

        (status, Json(response)).into_response()
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Render an error and every `source()` beneath it as one line for logging.
pub fn format_error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Error wrapper with i18n support for API responses
pub struct I18nError {
    pub error: ServiceError,
    pub i18n: std::sync::Arc<I18n>,
    pub locale: String,
}

impl I18nError {
    pub fn new(error: ServiceError, i18n: std::sync::Arc<I18n>, locale: impl Into<String>) -> Self {
        Self {
            error,
            i18n,
            locale: locale.into(),
        }
    }
}

impl IntoResponse for I18nError {
    fn into_response(self) -> Response {
        self.error.into_response_with_i18n(&self.i18n, &self.locale)
    }
}
