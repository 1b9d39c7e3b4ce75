//! Document classification from Content-Type and URL suffix

use crate::url::{has_pdf_extension, has_raster_extension};
use serde::Serialize;
use std::fmt;

/// Kind of artifact a fetched URL turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    /// A PDF document
    Pdf,

    /// A raster image (scanned certificate, photo)
    Image,

    /// Anything else, treated as an HTML landing page
    HtmlPage,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Image => "IMAGE",
            Self::HtmlPage => "HTML_PAGE",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifies an artifact; never fails
///
/// Unrecognized content types degrade to [`DocumentKind::HtmlPage`].
///
/// # Examples
///
/// ```
/// use cert_sieve::{classify, DocumentKind};
///
/// assert_eq!(classify("application/pdf", "https://example.com/view"), DocumentKind::Pdf);
/// assert_eq!(classify("", "https://example.com/scan.PNG"), DocumentKind::Image);
/// assert_eq!(classify("application/x-unknown", "https://example.com/x"), DocumentKind::HtmlPage);
/// ```
pub fn classify(content_type: &str, url: &str) -> DocumentKind {
    let content_type = content_type.trim().to_lowercase();

    if content_type.contains("application/pdf") || has_pdf_extension(url) {
        DocumentKind::Pdf
    } else if content_type.starts_with("image/") || has_raster_extension(url) {
        DocumentKind::Image
    } else {
        DocumentKind::HtmlPage
    }
}
