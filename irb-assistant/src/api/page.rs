//! Server-rendered page and the form targets it posts to.
//!
//! Every form target performs one shell operation and redirects back to `/`;
//! failures surface as the page notice.

use axum::{
    extract::{Multipart, Path, State},
    response::{Html, Redirect},
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::sync::Arc;
use tracing::debug;

use crate::analysis::{DisplaySections, Section};
use crate::i18n::I18n;
use crate::ingestion::DocumentSlot;
use crate::service::{LOCALE, ShellSnapshot};

use super::AppState;
use super::documents::read_upload;

const STYLE: &str = r#"
body { font-family: system-ui, -apple-system, Segoe UI, Roboto, sans-serif; background: #f3f4f6; margin: 0; }
.app { display: flex; justify-content: center; padding: 40px 16px; }
.card { background: #fff; border-radius: 12px; box-shadow: 0 4px 16px rgba(0,0,0,0.08); padding: 32px; width: 100%; max-width: 640px; }
.title { margin-top: 0; }
.label { display: block; font-weight: 600; margin: 16px 0 6px; }
.file-form { display: flex; gap: 8px; align-items: center; }
.selected { color: #4b5563; font-size: 14px; margin: 4px 0 0; }
.analyze-btn { margin-top: 24px; width: 100%; padding: 12px; font-size: 16px; border: 0; border-radius: 8px; background: #2563eb; color: #fff; cursor: pointer; }
.analyze-btn:disabled { background: #93c5fd; cursor: progress; }
.sample-link { text-align: center; color: #6b7280; }
.sample-link form { display: inline; }
.link-btn { background: none; border: 0; color: #2563eb; text-decoration: underline; cursor: pointer; font-size: inherit; padding: 0; }
.alert { background: #fef3c7; border-left: 4px solid #f59e0b; padding: 10px 14px; border-radius: 4px; margin-bottom: 16px; }
.results details { border: 1px solid #e5e7eb; border-radius: 8px; padding: 8px 12px; margin-bottom: 8px; }
.results summary { font-weight: 600; cursor: pointer; }
.section-body { white-space: pre-wrap; margin: 8px 0 0; }
"#;

/// Render the whole page for a snapshot
pub fn render_page(snapshot: &ShellSnapshot, i18n: &I18n) -> String {
    let t = |key: &str| i18n.get(LOCALE, key, None);

    let mut html = String::new();
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<div class="app">
<div class="card">
<h1 class="title">{title}</h1>
"#,
        title = encode_text(&t("page-title")),
    ));

    if let Some(notice) = &snapshot.notice {
        html.push_str(&format!(
            "<div class=\"alert\" role=\"alert\">{}</div>\n",
            encode_text(notice)
        ));
    }

    for slot in [DocumentSlot::Form, DocumentSlot::Policy] {
        html.push_str(&render_file_input(snapshot, slot, i18n));
    }

    let disabled = if snapshot.can_analyze { "" } else { " disabled" };
    html.push_str(&format!(
        r#"<form method="post" action="/ui/analyze">
<button class="analyze-btn" type="submit"{disabled}>{label}</button>
</form>
<div class="sample-link">{prefix} <form method="post" action="/ui/samples"><button class="link-btn" type="submit">{samples}</button></form></div>
"#,
        label = encode_text(&snapshot.analyze_label),
        prefix = encode_text(&t("page-sample-prefix")),
        samples = encode_text(&t("page-sample-button")),
    ));

    if let Some(sections) = &snapshot.sections {
        html.push_str(&render_sections(sections, i18n));
    }

    html.push_str("</div>\n</div>\n</body>\n</html>\n");
    html
}

fn render_file_input(snapshot: &ShellSnapshot, slot: DocumentSlot, i18n: &I18n) -> String {
    let (label_key, selected) = match slot {
        DocumentSlot::Form => ("page-form-label", &snapshot.form),
        DocumentSlot::Policy => ("page-policy-label", &snapshot.policy),
    };
    let selected = match selected {
        Some(document) => i18n.format(
            LOCALE,
            "page-selected-file",
            &[("name", document.filename.as_str())],
        ),
        None => i18n.get(LOCALE, "page-no-file", None),
    };
    let id = format!("{}-file", slot);

    format!(
        r#"<label class="label" for="{id}">{label}</label>
<form class="file-form" method="post" action="/ui/documents/{slot}" enctype="multipart/form-data">
<input class="file-input" id="{id}" type="file" name="file" accept="application/pdf" required />
<button type="submit">{upload}</button>
</form>
<p class="selected">{selected}</p>
"#,
        id = encode_double_quoted_attribute(&id),
        label = encode_text(&i18n.get(LOCALE, label_key, None)),
        upload = encode_text(&i18n.get(LOCALE, "page-upload-button", None)),
        selected = encode_text(&selected),
    )
}

fn render_sections(sections: &DisplaySections, i18n: &I18n) -> String {
    let mut html = format!(
        "<section class=\"results\">\n<h2>{}</h2>\n",
        encode_text(&i18n.get(LOCALE, "page-results-title", None))
    );

    for section in Section::ALL {
        html.push_str(&format!(
            "<details open>\n<summary>{}</summary>\n<div class=\"section-body\">{}</div>\n</details>\n",
            encode_text(&i18n.get(LOCALE, section.label_key(), None)),
            encode_text(sections.get(section).trim()),
        ));
    }

    html.push_str("</section>\n");
    html
}

/// The page
pub async fn page_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let snapshot = state.service.snapshot().await;
    Html(render_page(&snapshot, &state.service.i18n))
}

/// Form target for a file input
pub async fn ui_upload_handler(
    State(state): State<Arc<AppState>>,
    Path(slot): Path<DocumentSlot>,
    multipart: Multipart,
) -> Redirect {
    let max_size = state.service.config.limits.max_document_size_bytes;
    match read_upload(multipart, max_size).await {
        Ok(document) => state.service.set_document(slot, document).await,
        Err(e) => {
            debug!(slot = %slot, error = %e, "Upload rejected");
            state.service.record_notice(&e).await;
        }
    }
    Redirect::to("/")
}

/// Form target for "Use Sample Files"
pub async fn ui_samples_handler(State(state): State<Arc<AppState>>) -> Redirect {
    // The service records the notice on failure
    if let Err(e) = state.service.load_samples().await {
        debug!(error = %e, "Sample load rejected");
    }
    Redirect::to("/")
}

/// Form target for the analyze button
pub async fn ui_analyze_handler(State(state): State<Arc<AppState>>) -> Redirect {
    if let Err(e) = state.service.analyze().await {
        debug!(error = %e, "Analyze rejected");
    }
    Redirect::to("/")
}
