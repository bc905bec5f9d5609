//! In-memory state of the application shell.
//!
//! All transitions are plain methods on [`ShellState`]; the service holds it
//! behind a lock and never awaits while holding it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::analysis::DisplaySections;
use crate::error::{ServiceError, ServiceResult};
use crate::ingestion::{DocumentSlot, UploadedDocument};

/// Shell phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Analyzing,
}

/// Text of the most recent analysis (or the failure message)
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub text: String,
    pub completed_at: DateTime<Utc>,
}

/// Everything the shell remembers between requests
#[derive(Debug, Default)]
pub struct ShellState {
    form: Option<Arc<UploadedDocument>>,
    policy: Option<Arc<UploadedDocument>>,
    phase: Phase,
    response: Option<AnalysisResult>,
    notice: Option<String>,
}

impl ShellState {
    pub fn document(&self, slot: DocumentSlot) -> Option<&Arc<UploadedDocument>> {
        match slot {
            DocumentSlot::Form => self.form.as_ref(),
            DocumentSlot::Policy => self.policy.as_ref(),
        }
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    /// Replace one slot wholesale
    pub fn set_document(&mut self, slot: DocumentSlot, document: UploadedDocument) {
        let document = Some(Arc::new(document));
        match slot {
            DocumentSlot::Form => self.form = document,
            DocumentSlot::Policy => self.policy = document,
        }
    }

    /// Replace both slots in one step
    pub fn set_documents(&mut self, form: UploadedDocument, policy: UploadedDocument) {
        self.form = Some(Arc::new(form));
        self.policy = Some(Arc::new(policy));
    }

    /// `Idle -> Analyzing`. Returns the documents to analyse.
    ///
    /// Rejected without any change when a slot is empty or an analysis is
    /// already running.
    pub fn begin_analysis(
        &mut self,
    ) -> ServiceResult<(Arc<UploadedDocument>, Arc<UploadedDocument>)> {
        if self.phase == Phase::Analyzing {
            return Err(ServiceError::AnalysisInProgress);
        }

        let (Some(form), Some(policy)) = (self.form.clone(), self.policy.clone()) else {
            return Err(ServiceError::MissingDocuments);
        };

        self.phase = Phase::Analyzing;
        self.notice = None;
        Ok((form, policy))
    }

    /// `Analyzing -> Idle`, storing the response text
    pub fn finish_analysis(&mut self, text: String) {
        self.phase = Phase::Idle;
        self.response = Some(AnalysisResult {
            text,
            completed_at: Utc::now(),
        });
    }

    pub fn snapshot(&self, labels: ButtonLabels) -> ShellSnapshot {
        let analyzing = self.phase == Phase::Analyzing;
        ShellSnapshot {
            phase: self.phase,
            form: self.form.as_deref().map(DocumentSummary::from),
            policy: self.policy.as_deref().map(DocumentSummary::from),
            can_analyze: !analyzing,
            analyze_label: if analyzing {
                labels.analyzing
            } else {
                labels.idle
            },
            notice: self.notice.clone(),
            response: self.response.as_ref().map(|r| r.text.clone()),
            completed_at: self.response.as_ref().map(|r| r.completed_at),
            sections: self
                .response
                .as_ref()
                .map(|r| DisplaySections::from_response(&r.text)),
        }
    }
}

/// Trigger captions for the two phases
#[derive(Debug, Clone)]
pub struct ButtonLabels {
    pub idle: String,
    pub analyzing: String,
}

/// What a client needs to render the shell
#[derive(Debug, Clone, Serialize)]
pub struct ShellSnapshot {
    pub phase: Phase,
    pub form: Option<DocumentSummary>,
    pub policy: Option<DocumentSummary>,
    pub can_analyze: bool,
    pub analyze_label: String,
    pub notice: Option<String>,
    pub response: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub sections: Option<DisplaySections>,
}

/// Selected file, without its contents
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub mime_type: String,
    pub size: usize,
    pub content_hash: String,
}

impl From<&UploadedDocument> for DocumentSummary {
    fn from(document: &UploadedDocument) -> Self {
        Self {
            filename: document.filename.clone(),
            mime_type: document.mime_type.clone(),
            size: document.size(),
            content_hash: document.content_hash.clone(),
        }
    }
}
