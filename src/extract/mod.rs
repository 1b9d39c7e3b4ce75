//! Text extraction backends
//!
//! This module turns fetched bytes into searchable text:
//! - PDF text through an ordered chain of independent libraries
//! - OCR through a fixed cascade of preprocessing/engine settings
//! - QR payloads from images and from images embedded in PDFs
//! - Email matching over the merged result
//!
//! Every backend is best-effort. Failures are logged and turn into absent
//! text rather than errors.

mod email;
mod engine;
mod ocr;
mod pdf;
mod qr;

pub use email::extract_emails;
pub use engine::ExtractionEngine;
pub use ocr::{
    prepare_for_ocr, run_ocr_cascade, ImageVariant, OcrAttempt, OcrEngine, OcrOptions,
    PreparedImages, TesseractOcr, OCR_CASCADE,
};
pub use pdf::{LopdfBackend, PdfExtractBackend, PdfTextBackend};
pub use qr::{QrDecoder, RqrrDecoder};

use thiserror::Error;

/// Errors raised by individual decode backends
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF backend {backend} failed: {message}")]
    Pdf {
        backend: &'static str,
        message: String,
    },

    #[error("Backend {0} panicked")]
    Panicked(&'static str),

    #[error("OCR backend not available: {0}")]
    OcrUnavailable(String),

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text recovered from one artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    /// Document text (PDF text layer or OCR output, with QR payloads for images)
    pub text: Option<String>,

    /// Distinct QR payloads in discovery order
    pub qr_payloads: Vec<String>,
}

impl ExtractedText {
    /// Document text followed by the QR payloads it does not already hold,
    /// newline separated
    ///
    /// Image text carries its payloads as trailing lines, so they are not
    /// repeated here.
    pub fn searchable_text(&self) -> String {
        let text = self.text.as_deref().unwrap_or_default();
        let mut parts: Vec<&str> = Vec::with_capacity(self.qr_payloads.len() + 1);
        if self.text.is_some() {
            parts.push(text);
        }
        parts.extend(
            self.qr_payloads
                .iter()
                .map(String::as_str)
                .filter(|payload| !holds_segment(text, payload)),
        );
        parts.join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.qr_payloads.is_empty()
    }
}

/// Whether `segment` appears in `text` bounded by newlines or the text ends
fn holds_segment(text: &str, segment: &str) -> bool {
    text.match_indices(segment).any(|(start, _)| {
        let end = start + segment.len();
        (start == 0 || text[..start].ends_with('\n'))
            && (end == text.len() || text[end..].starts_with('\n'))
    })
}

/// Runs a backend call, turning panics into [`ExtractError::Panicked`]
///
/// Font and stream decoders in the PDF libraries panic on some malformed input.
pub(crate) fn guarded<T>(
    backend: &'static str,
    f: impl FnOnce() -> Result<T, ExtractError>,
) -> Result<T, ExtractError> {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(_) => Err(ExtractError::Panicked(backend)),
    }
}
