//! PDF text extraction, page by page in page order.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::error::ProcessingError;

/// `TJ` offsets (thousandths of text space) below this read as a word gap.
const TJ_WORD_GAP: f32 = -100.0;

/// Extract the plain text of a PDF held in memory.
///
/// Pages are visited in ascending page number. Each page contributes its
/// text fragments joined by a single space, followed by a newline. The
/// result is trimmed of leading and trailing whitespace.
pub fn extract_pdf_text(filename: &str, data: &[u8]) -> Result<String, ProcessingError> {
    let document = Document::load_mem(data).map_err(|source| ProcessingError::DocumentParse {
        filename: filename.to_string(),
        source,
    })?;

    let pages = document.get_pages();
    info!(filename = %filename, pages = pages.len(), "Processing PDF pages");

    let mut text = String::new();
    // BTreeMap iterates in ascending page order
    for (&page_number, &page_id) in &pages {
        let fragments = page_fragments(&document, page_id).map_err(|source| {
            warn!(filename = %filename, page = page_number, error = %source, "Failed to extract page text");
            ProcessingError::TextExtraction {
                filename: filename.to_string(),
                page: page_number,
                source,
            }
        })?;

        text.push_str(&fragments.join(" "));
        text.push('\n');
    }

    let text = text.trim().to_string();
    if text.is_empty() {
        warn!(filename = %filename, "No text could be extracted from PDF");
    }

    debug!(
        filename = %filename,
        pages = pages.len(),
        chars = text.chars().count(),
        "PDF text extracted"
    );

    Ok(text)
}

/// Every text-showing operation on a page, decoded, in content order.
///
/// `Tj`, `'` and `"` each yield one fragment; a `TJ` array yields one
/// fragment with large negative offsets turned into spaces. Blank
/// fragments are dropped.
fn page_fragments(document: &Document, page_id: ObjectId) -> lopdf::Result<Vec<String>> {
    let encodings: BTreeMap<Vec<u8>, &str> = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect();
    let content = Content::decode(&document.get_page_content(page_id)?)?;

    let mut encoding = None;
    let mut fragments = Vec::new();
    for operation in &content.operations {
        let shown = match operation.operator.as_str() {
            "Tf" => {
                encoding = operation
                    .operands
                    .first()
                    .and_then(|font| font.as_name().ok())
                    .and_then(|name| encodings.get(name).copied());
                None
            }
            "Tj" | "'" => operation.operands.first().map(|s| decode_string(encoding, s)),
            "\"" => operation.operands.get(2).map(|s| decode_string(encoding, s)),
            "TJ" => operation.operands.first().map(|a| decode_array(encoding, a)),
            _ => None,
        };

        if let Some(shown) = shown {
            let fragment = shown.trim();
            if !fragment.is_empty() {
                fragments.push(fragment.to_string());
            }
        }
    }

    Ok(fragments)
}

fn decode_string(encoding: Option<&str>, operand: &Object) -> String {
    match operand {
        Object::String(bytes, _) => Document::decode_text(encoding, bytes),
        _ => String::new(),
    }
}

fn decode_array(encoding: Option<&str>, operand: &Object) -> String {
    let Object::Array(items) = operand else {
        return String::new();
    };

    let mut text = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => text.push_str(&Document::decode_text(encoding, bytes)),
            Object::Integer(offset) if (*offset as f32) < TJ_WORD_GAP => text.push(' '),
            Object::Real(offset) if *offset < TJ_WORD_GAP => text.push(' '),
            _ => {}
        }
    }
    text
}
