//! Request and result types for a single analysis

use crate::pipeline::{classify, DocumentKind};
use crate::url::infer_name_from_url;
use serde::Serialize;
use std::path::PathBuf;

/// Maximum number of characters kept in [`AnalysisResult::text_preview`]
pub const TEXT_PREVIEW_CHARS: usize = 500;

/// A URL to analyze, with an optional display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub url: String,
    pub display_name: Option<String>,
}

impl AnalysisRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Outcome of analyzing one URL
///
/// `error` is only set when the primary URL could not be fetched; every
/// other failure shows up as fewer results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Display name, or the last URL segment
    pub name: String,

    /// Kind of the artifact the emails came from
    pub document_kind: DocumentKind,

    /// URL of the consumed artifact (a candidate URL when one succeeded)
    pub url: String,

    /// Unique emails in first-seen order, case-sensitive
    pub emails: Vec<String>,

    /// Distinct QR payloads decoded from the consumed artifact
    pub qr_payloads: Vec<String>,

    /// Content-Type of the consumed artifact
    pub content_type: Option<String>,

    /// Size of the consumed artifact in bytes
    pub size_bytes: u64,

    /// SHA-256 of the persisted artifact
    pub content_hash: Option<String>,

    /// Where the artifact was persisted
    pub stored_path: Option<PathBuf>,

    /// Leading extracted text, for eyeballing what the decoders saw
    pub text_preview: Option<String>,

    /// Primary fetch failure
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Creates an empty result for a request
    ///
    /// The kind is guessed from the URL suffix until something is fetched.
    pub fn new(request: &AnalysisRequest) -> Self {
        let name = request
            .display_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| infer_name_from_url(&request.url));

        Self {
            name,
            document_kind: classify("", &request.url),
            url: request.url.clone(),
            emails: Vec::new(),
            qr_payloads: Vec::new(),
            content_type: None,
            size_bytes: 0,
            content_hash: None,
            stored_path: None,
            text_preview: None,
            error: None,
        }
    }

    /// Marks the result as failed, clearing any partial findings
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.emails.clear();
        self.qr_payloads.clear();
        self.error = Some(error.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Truncates text for [`AnalysisResult::text_preview`]
pub fn text_preview(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut chars = text.chars();
    let preview: String = chars.by_ref().take(TEXT_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        Some(format!("{}...", preview))
    } else {
        Some(preview)
    }
}
