mod state;

pub use state::{ButtonLabels, Phase, ShellSnapshot, ShellState};

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::analysis::CompletionProvider;
use crate::config::AppConfig;
use crate::error::{ServiceError, ServiceResult, format_error_chain};
use crate::groq::GroqClient;
use crate::i18n::I18n;
use crate::ingestion::{DocumentSlot, UploadedDocument, extract_pair};
use crate::samples::SampleLoader;

/// Locale used for all user-visible text
pub const LOCALE: &str = "en";

/// The application shell: selected documents, the analyze pipeline and its result
pub struct AnalysisService {
    pub config: AppConfig,
    pub i18n: Arc<I18n>,
    pub samples: SampleLoader,
    completion: Arc<dyn CompletionProvider>,
    state: RwLock<ShellState>,
}

impl AnalysisService {
    /// Create a service backed by the configured Groq endpoint
    pub fn new(config: AppConfig) -> ServiceResult<Self> {
        info!("Initializing IRB Assistant service");

        let groq = GroqClient::new(config.completion.clone())?;
        info!(
            url = %config.completion.base_url,
            model = %groq.model(),
            "Completion client initialized"
        );
        if config.completion.resolve_api_key().is_none() {
            warn!("No completion API key configured; analyses will fail until one is set");
        }

        Ok(Self::with_provider(config, Arc::new(groq)))
    }

    /// Create a service around any completion provider
    pub fn with_provider(config: AppConfig, completion: Arc<dyn CompletionProvider>) -> Self {
        let samples = SampleLoader::new(&config.samples);
        Self {
            config,
            i18n: Arc::new(I18n::new()),
            samples,
            completion,
            state: RwLock::new(ShellState::default()),
        }
    }

    pub async fn snapshot(&self) -> ShellSnapshot {
        let labels = ButtonLabels {
            idle: self.i18n.get(LOCALE, "page-analyze-button", None),
            analyzing: self.i18n.get(LOCALE, "page-analyzing-button", None),
        };
        self.state.read().await.snapshot(labels)
    }

    /// Put a user-selected file into a slot
    pub async fn set_document(&self, slot: DocumentSlot, document: UploadedDocument) {
        info!(
            slot = %slot,
            filename = %document.filename,
            size = document.size(),
            hash = %document.content_hash,
            "Document selected"
        );
        let slot_name: &'static str = slot.into();
        metrics::counter!("irb_documents_uploaded_total", "slot" => slot_name).increment(1);

        let notice = self.i18n.format(
            LOCALE,
            "notice-document-selected",
            &[("slot", slot_name), ("name", document.filename.as_str())],
        );

        let mut state = self.state.write().await;
        if let Some(previous) = state.document(slot) {
            debug!(slot = %slot, previous = %previous.filename, "Replacing selected document");
        }
        state.set_document(slot, document);
        state.set_notice(notice);
    }

    /// Load the bundled samples into both slots
    ///
    /// Both files are read before the shell is touched, so a failed load
    /// leaves the previous selection intact.
    pub async fn load_samples(&self) -> ServiceResult<()> {
        let (form, policy) = match self.samples.load().await {
            Ok(pair) => pair,
            Err(e) => {
                let e = ServiceError::from(e);
                error!(error = %format_error_chain(&e), "Failed to load sample files");
                self.record_notice(&e).await;
                return Err(e);
            }
        };

        let notice = self.i18n.get(LOCALE, "notice-samples-loaded", None);
        let mut state = self.state.write().await;
        state.set_documents(form, policy);
        state.set_notice(notice);
        Ok(())
    }

    /// Show an error as the page notice
    pub async fn record_notice(&self, error: &ServiceError) {
        let message = error.user_message(&self.i18n, LOCALE);
        self.state.write().await.set_notice(message);
    }

    /// Run the analyze action and return the resulting snapshot.
    ///
    /// Only the preconditions (both files present, nothing already running)
    /// produce an error. Failures inside the pipeline are logged and become
    /// the generic failure message in the response panel.
    pub async fn analyze(self: &Arc<Self>) -> ServiceResult<ShellSnapshot> {
        let begun = self.state.write().await.begin_analysis();
        let (form, policy) = match begun {
            Ok(documents) => documents,
            Err(e) => {
                warn!(error = %e, "Analyze rejected");
                self.record_notice(&e).await;
                return Err(e);
            }
        };

        info!(form = %form.filename, policy = %policy.filename, "Analysis started");

        // Own task: finishes and returns the shell to Idle even if the caller goes away
        let service = Arc::clone(self);
        let pipeline = tokio::spawn(async move {
            service.run_pipeline(form, policy).await;
        });

        if let Err(e) = pipeline.await {
            error!(error = %e, "Analysis task aborted");
            let message = self.i18n.get(LOCALE, "analysis-failed", None);
            self.state.write().await.finish_analysis(message);
        }

        Ok(self.snapshot().await)
    }

    async fn run_pipeline(&self, form: Arc<UploadedDocument>, policy: Arc<UploadedDocument>) {
        let started = Instant::now();

        let text = match self.compare(form, policy).await {
            Ok(text) => {
                info!(
                    chars = text.chars().count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Analysis completed"
                );
                metrics::counter!("irb_analyses_total", "outcome" => "success").increment(1);
                text
            }
            Err(e) => {
                error!(error = %format_error_chain(&e), "Analysis failed");
                metrics::counter!("irb_analyses_total", "outcome" => "failure").increment(1);
                self.i18n.get(LOCALE, "analysis-failed", None)
            }
        };

        metrics::histogram!("irb_analysis_duration_seconds").record(started.elapsed().as_secs_f64());

        self.state.write().await.finish_analysis(text);
    }

    async fn compare(
        &self,
        form: Arc<UploadedDocument>,
        policy: Arc<UploadedDocument>,
    ) -> ServiceResult<String> {
        let (form_text, policy_text) = extract_pair(form, policy).await?;
        let response = self.completion.complete(&form_text, &policy_text).await?;
        debug!(response = %response, "Completion response");
        Ok(response)
    }
}
