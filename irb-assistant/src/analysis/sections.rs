//! Splitting a model reply into its three marked sections.
//!
//! This is plain substring search. A section whose marker is absent shows a
//! placeholder; nothing here ever fails.

use serde::Serialize;

/// One of the three parts of an analysis reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Compliant,
    Concerns,
    Recommendations,
}

impl Section {
    pub const ALL: [Section; 3] = [
        Section::Compliant,
        Section::Concerns,
        Section::Recommendations,
    ];

    /// Literal text that introduces the section in the reply
    pub fn marker(self) -> &'static str {
        match self {
            Section::Compliant => "**Compliant Sections:**",
            Section::Concerns => "**Potential Concerns:**",
            Section::Recommendations => "**Recommendations:**",
        }
    }

    /// Shown when the reply has no marker for this section
    pub fn placeholder(self) -> &'static str {
        match self {
            Section::Compliant => "No compliant sections found.",
            Section::Concerns => "No potential concerns found.",
            Section::Recommendations => "No recommendations found.",
        }
    }

    /// Translation key of the section heading
    pub fn label_key(self) -> &'static str {
        match self {
            Section::Compliant => "page-section-compliant",
            Section::Concerns => "page-section-concerns",
            Section::Recommendations => "page-section-recommendations",
        }
    }

    /// The marker that ends this section, if any
    fn next(self) -> Option<Section> {
        match self {
            Section::Compliant => Some(Section::Concerns),
            Section::Concerns => Some(Section::Recommendations),
            Section::Recommendations => None,
        }
    }

    /// Text after the first occurrence of this section's marker, up to the
    /// next occurrence of the following marker (or the end of the reply).
    fn extract(self, response: &str) -> Option<&str> {
        let (_, rest) = response.split_once(self.marker())?;
        let body = self
            .next()
            .and_then(|next| rest.split_once(next.marker()))
            .map_or(rest, |(body, _)| body);
        Some(body)
    }
}

/// The three display sections derived from a reply.
///
/// Section bodies are the exact substrings of the reply; trimming is left to
/// the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySections {
    pub compliant: String,
    pub concerns: String,
    pub recommendations: String,
}

impl DisplaySections {
    pub fn from_response(response: &str) -> Self {
        let section = |section: Section| {
            section
                .extract(response)
                .unwrap_or(section.placeholder())
                .to_string()
        };

        Self {
            compliant: section(Section::Compliant),
            concerns: section(Section::Concerns),
            recommendations: section(Section::Recommendations),
        }
    }

    pub fn get(&self, section: Section) -> &str {
        match section {
            Section::Compliant => &self.compliant,
            Section::Concerns => &self.concerns,
            Section::Recommendations => &self.recommendations,
        }
    }
}
