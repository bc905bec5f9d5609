//! JSON endpoints for the shell: state, sample loading and analysis.

use axum::{Json, extract::State};
use std::sync::Arc;

use crate::error::I18nError;
use crate::service::ShellSnapshot;

use super::AppState;

/// Current shell snapshot
pub async fn state_handler(State(state): State<Arc<AppState>>) -> Json<ShellSnapshot> {
    Json(state.service.snapshot().await)
}

/// Load the bundled sample documents into both slots
pub async fn samples_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ShellSnapshot>, I18nError> {
    state
        .service
        .load_samples()
        .await
        .map_err(|e| state.i18n_error(e))?;
    Ok(Json(state.service.snapshot().await))
}

/// Run the analysis and return the resulting snapshot
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ShellSnapshot>, I18nError> {
    let snapshot = state
        .service
        .analyze()
        .await
        .map_err(|e| state.i18n_error(e))?;
    Ok(Json(snapshot))
}
