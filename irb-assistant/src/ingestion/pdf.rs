//! PDF document processing.
//!
//! Text is extracted with lopdf, so no native PDF library is needed at runtime.

pub mod text;

pub use text::extract_pdf_text;
