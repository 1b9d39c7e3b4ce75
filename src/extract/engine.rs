//! Per-kind dispatch over the decode backends

use crate::config::OcrConfig;
use crate::extract::ocr::{prepare_for_ocr, run_ocr_cascade, OcrEngine, TesseractOcr};
use crate::extract::pdf::{LopdfBackend, PdfExtractBackend, PdfTextBackend};
use crate::extract::qr::{merge_distinct, QrDecoder, RqrrDecoder};
use crate::extract::ExtractedText;
use crate::pipeline::DocumentKind;
use image::DynamicImage;

/// Turns fetched bytes into text and QR payloads
///
/// Extraction is synchronous and CPU-bound; async callers should run it on
/// the blocking pool.
pub struct ExtractionEngine {
    pdf_backends: Vec<Box<dyn PdfTextBackend>>,
    ocr: Box<dyn OcrEngine>,
    qr: Box<dyn QrDecoder>,
    threshold: u8,
}

impl ExtractionEngine {
    /// Creates an engine from explicit backends
    ///
    /// `pdf_backends` are tried in order.
    pub fn new(
        pdf_backends: Vec<Box<dyn PdfTextBackend>>,
        ocr: Box<dyn OcrEngine>,
        qr: Box<dyn QrDecoder>,
        threshold: u8,
    ) -> Self {
        Self {
            pdf_backends,
            ocr,
            qr,
            threshold,
        }
    }

    /// Creates the default engine: `pdf-extract` then `lopdf`, Tesseract, `rqrr`
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(
            vec![Box::new(PdfExtractBackend), Box::new(LopdfBackend)],
            Box::new(TesseractOcr::new(
                config.tesseract_binary.clone(),
                config.language.clone(),
            )),
            Box::new(RqrrDecoder),
            config.threshold,
        )
    }

    /// Extracts text and QR payloads from an artifact
    ///
    /// Never fails: every backend error ends up as missing text.
    pub fn extract(&self, kind: DocumentKind, bytes: &[u8]) -> ExtractedText {
        if bytes.is_empty() {
            return ExtractedText::default();
        }

        match kind {
            DocumentKind::Pdf => self.extract_pdf(bytes),
            DocumentKind::Image => self.extract_image(bytes),
            DocumentKind::HtmlPage => ExtractedText::default(),
        }
    }

    fn extract_pdf(&self, bytes: &[u8]) -> ExtractedText {
        ExtractedText {
            text: self.pdf_text(bytes),
            qr_payloads: self.pdf_qr_payloads(bytes),
        }
    }

    /// First backend producing non-empty text wins
    fn pdf_text(&self, bytes: &[u8]) -> Option<String> {
        for backend in &self.pdf_backends {
            match backend.page_texts(bytes) {
                Ok(pages) => {
                    let text = pages.join(" ").trim().to_string();
                    if !text.is_empty() {
                        tracing::debug!("PDF text extracted with {}", backend.name());
                        return Some(text);
                    }
                    tracing::debug!("{} found no PDF text", backend.name());
                }
                Err(e) => tracing::debug!("{} failed: {}", backend.name(), e),
            }
        }

        None
    }

    fn pdf_qr_payloads(&self, bytes: &[u8]) -> Vec<String> {
        let images = self
            .pdf_backends
            .iter()
            .find_map(|backend| match backend.embedded_images(bytes) {
                Ok(images) if !images.is_empty() => Some(images),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!("{} could not list images: {}", backend.name(), e);
                    None
                }
            })
            .unwrap_or_default();

        let mut payloads = Vec::new();
        for image in &images {
            merge_distinct(&mut payloads, self.qr.decode(image));
        }
        payloads
    }

    fn extract_image(&self, bytes: &[u8]) -> ExtractedText {
        let image = match image::load_from_memory(bytes) {
            Ok(image) => DynamicImage::ImageRgb8(image.to_rgb8()),
            Err(e) => {
                tracing::debug!("Undecodable image: {}", e);
                return ExtractedText::default();
            }
        };

        let prepared = prepare_for_ocr(&image, self.threshold);
        let ocr_text = run_ocr_cascade(self.ocr.as_ref(), &prepared);

        let mut qr_payloads = Vec::new();
        merge_distinct(&mut qr_payloads, self.qr.decode(&prepared.original));

        let text = if qr_payloads.is_empty() {
            ocr_text
        } else {
            let mut parts: Vec<String> = ocr_text.into_iter().collect();
            parts.extend(qr_payloads.iter().cloned());
            Some(parts.join("\n"))
        };

        ExtractedText { text, qr_payloads }
    }
}
