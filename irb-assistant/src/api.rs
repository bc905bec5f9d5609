//! HTTP API for the IRB Assistant.
//!
//! This module provides:
//! - The server-rendered page and its form targets
//! - The JSON API over the same shell
//! - The sample assets
//! - Health and metrics monitoring

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::error::{I18nError, ServiceError};
use crate::service::{AnalysisService, LOCALE};

pub mod analysis;
pub mod documents;
pub mod page;
use analysis::{analyze_handler, samples_handler, state_handler};
use documents::upload_document_handler;
use page::{page_handler, ui_analyze_handler, ui_samples_handler, ui_upload_handler};

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state
pub struct AppState {
    pub service: Arc<AnalysisService>,
    pub start_time: Instant,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Create an i18n-aware error from a service error
    pub fn i18n_error(&self, error: ServiceError) -> I18nError {
        I18nError::new(error, self.service.i18n.clone(), LOCALE)
    }
}

/// Build the router
pub fn router(service: Arc<AnalysisService>, prometheus: Option<PrometheusHandle>) -> Router {
    let max_body_size =
        service.config.limits.max_document_size_bytes as usize + MULTIPART_OVERHEAD_BYTES;
    let samples_dir = service.samples.dir().to_path_buf();

    let state = Arc::new(AppState {
        service,
        start_time: Instant::now(),
        prometheus,
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/state", get(state_handler))
        .route(
            "/documents/{slot}",
            post(upload_document_handler).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/samples", post(samples_handler))
        .route("/analyze", post(analyze_handler));

    let ui_routes = Router::new()
        .route(
            "/documents/{slot}",
            post(ui_upload_handler).layer(DefaultBodyLimit::max(max_body_size)),
        )
        .route("/samples", post(ui_samples_handler))
        .route("/analyze", post(ui_analyze_handler));

    Router::new()
        .route("/", get(page_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api_routes)
        .nest("/ui", ui_routes)
        .nest_service("/samples", ServeDir::new(samples_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Health & Metrics ===

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let i18n = &state.service.i18n;
    let completion_configured = state.service.config.completion.resolve_api_key().is_some();

    let status = if completion_configured {
        i18n.get(LOCALE, "health-status-healthy", None)
    } else {
        i18n.format(
            LOCALE,
            "health-status-degraded",
            &[("reason", "no completion API key configured")],
        )
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        completion_configured,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_seconds: u64,
    completion_configured: bool,
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics recorder not installed",
        )
            .into_response(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::CompletionProvider;
    use crate::config::AppConfig;
    use crate::error::ServiceResult;
    use crate::test_support::THREE_SECTION_RESPONSE;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use tower::ServiceExt;

    struct FixedReply;

    impl CompletionProvider for FixedReply {
        fn complete<'a>(
            &'a self,
            _form_text: &'a str,
            _policy_text: &'a str,
        ) -> BoxFuture<'a, ServiceResult<String>> {
            async { Ok(THREE_SECTION_RESPONSE.to_string()) }.boxed()
        }
    }

    pub(crate) fn test_router() -> Router {
        let service = AnalysisService::with_provider(AppConfig::default(), Arc::new(FixedReply));
        router(Arc::new(service), None)
    }

    pub(crate) async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    pub(crate) fn multipart_request(
        uri: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Request<Body> {
        let boundary = "irb-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::post(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["completion_configured"].is_boolean());
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = test_router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_sample_assets_are_served() {
        let response = test_router()
            .oneshot(
                Request::get("/samples/irb_form.pdf")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }
}
