//! PDF text and embedded-image backends

use crate::extract::{guarded, ExtractError};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Document, ObjectId};

/// One PDF library, used as a link in the fallback chain
pub trait PdfTextBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Extracts the text of every page, in page order
    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError>;

    /// Decodes raster images embedded in page objects
    ///
    /// Backends that cannot enumerate images return an empty list.
    fn embedded_images(&self, bytes: &[u8]) -> Result<Vec<DynamicImage>, ExtractError> {
        let _ = bytes;
        Ok(Vec::new())
    }
}

/// Primary backend: `pdf-extract`
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractBackend;

impl PdfTextBackend for PdfExtractBackend {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        guarded(self.name(), || {
            pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| ExtractError::Pdf {
                backend: "pdf-extract",
                message: e.to_string(),
            })
        })
    }
}

/// Secondary backend: `lopdf`
///
/// Also walks page XObjects to recover embedded images for QR decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    fn load(bytes: &[u8]) -> Result<Document, ExtractError> {
        Document::load_mem(bytes).map_err(lopdf_error)
    }
}

impl PdfTextBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        guarded(self.name(), || {
            let document = Self::load(bytes)?;

            // A page that fails to decode contributes nothing
            let texts = document
                .get_pages()
                .keys()
                .map(|page_number| match document.extract_text(&[*page_number]) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::debug!("lopdf could not read page {}: {}", page_number, e);
                        String::new()
                    }
                })
                .collect();

            Ok(texts)
        })
    }

    fn embedded_images(&self, bytes: &[u8]) -> Result<Vec<DynamicImage>, ExtractError> {
        guarded(self.name(), || {
            let document = Self::load(bytes)?;
            let mut images = Vec::new();

            for (page_number, page_id) in document.get_pages() {
                let page_images = match document.get_page_images(page_id) {
                    Ok(page_images) => page_images,
                    Err(e) => {
                        tracing::debug!("No images on page {}: {}", page_number, e);
                        continue;
                    }
                };

                for pdf_image in page_images {
                    let embedded = EmbeddedImage {
                        id: pdf_image.id,
                        width: pdf_image.width,
                        height: pdf_image.height,
                        color_space: pdf_image.color_space.as_deref(),
                        filters: pdf_image.filters.as_deref().unwrap_or(&[]),
                        bits_per_component: pdf_image.bits_per_component,
                        content: pdf_image.content,
                    };

                    match decode_embedded(&document, &embedded) {
                        Ok(Some(image)) => images.push(image),
                        Ok(None) => tracing::debug!(
                            "Skipping unsupported image {:?} (filters {:?}, color space {:?})",
                            embedded.id,
                            embedded.filters,
                            embedded.color_space
                        ),
                        Err(e) => {
                            tracing::debug!("Failed to decode image {:?}: {}", embedded.id, e)
                        }
                    }
                }
            }

            Ok(images)
        })
    }
}

/// The parts of an image XObject needed to rebuild its pixels
struct EmbeddedImage<'a> {
    id: ObjectId,
    width: i64,
    height: i64,
    color_space: Option<&'a str>,
    filters: &'a [String],
    bits_per_component: Option<i64>,
    content: &'a [u8],
}

/// Rebuilds a raster image from an XObject stream
///
/// Supports JPEG (`DCTDecode`) and raw or `FlateDecode` 8-bit
/// Gray/RGB/CMYK samples. Anything else yields `Ok(None)`.
fn decode_embedded(
    document: &Document,
    embedded: &EmbeddedImage<'_>,
) -> Result<Option<DynamicImage>, ExtractError> {
    if embedded.filters.iter().any(|f| f == "DCTDecode") {
        let image = image::load_from_memory_with_format(embedded.content, ImageFormat::Jpeg)?;
        return Ok(Some(image));
    }

    if embedded.filters.iter().any(|f| f != "FlateDecode") {
        return Ok(None);
    }

    if embedded.bits_per_component != Some(8) {
        return Ok(None);
    }

    let (Ok(width), Ok(height)) = (u32::try_from(embedded.width), u32::try_from(embedded.height))
    else {
        return Ok(None);
    };

    let samples = if embedded.filters.is_empty() {
        embedded.content.to_vec()
    } else {
        document
            .get_object(embedded.id)
            .and_then(|object| object.as_stream())
            .and_then(|stream| stream.decompressed_content())
            .map_err(lopdf_error)?
    };

    let image = match embedded.color_space {
        Some("DeviceGray") => {
            GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8)
        }
        Some("DeviceRGB") => {
            RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8)
        }
        Some("DeviceCMYK") => {
            cmyk_to_rgb(width, height, &samples).map(DynamicImage::ImageRgb8)
        }
        _ => None,
    };

    Ok(image)
}

fn cmyk_to_rgb(width: u32, height: u32, samples: &[u8]) -> Option<RgbImage> {
    let expected = (width as usize) * (height as usize) * 4;
    if samples.len() < expected {
        return None;
    }

    let rgb = samples[..expected]
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - u16::from(px[3]);
            [px[0], px[1], px[2]].map(|c| ((255 - u16::from(c)) * k / 255) as u8)
        })
        .collect();

    RgbImage::from_raw(width, height, rgb)
}

fn lopdf_error(e: lopdf::Error) -> ExtractError {
    ExtractError::Pdf {
        backend: "lopdf",
        message: e.to_string(),
    }
}
