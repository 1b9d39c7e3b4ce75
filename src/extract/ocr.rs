//! OCR preprocessing and the fixed recognition cascade

use crate::extract::ExtractError;
use image::{DynamicImage, GrayImage, ImageFormat, Luma, RgbImage};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Engine settings for one recognition pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrOptions {
    /// Tesseract page segmentation mode (`--psm`)
    pub page_segmentation: u8,

    /// Tesseract engine mode (`--oem`), engine default when `None`
    pub engine_mode: Option<u8>,
}

/// Which preprocessed copy of the image a pass runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageVariant {
    Binarized,
    Grayscale,
    Original,
}

/// One step of the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrAttempt {
    pub variant: ImageVariant,
    pub options: OcrOptions,
}

/// Attempts in order; the first non-empty result wins
pub const OCR_CASCADE: [OcrAttempt; 3] = [
    OcrAttempt {
        variant: ImageVariant::Binarized,
        options: OcrOptions {
            page_segmentation: 6,
            engine_mode: None,
        },
    },
    OcrAttempt {
        variant: ImageVariant::Grayscale,
        options: OcrOptions {
            page_segmentation: 6,
            engine_mode: None,
        },
    },
    OcrAttempt {
        variant: ImageVariant::Original,
        options: OcrOptions {
            page_segmentation: 6,
            engine_mode: Some(1),
        },
    },
];

/// A text recognizer
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs
    fn name(&self) -> &'static str;

    /// Recognizes the text in `image`
    fn recognize(&self, image: &DynamicImage, options: OcrOptions)
        -> Result<String, ExtractError>;
}

/// The three image copies the cascade runs on
#[derive(Debug, Clone)]
pub struct PreparedImages {
    pub original: DynamicImage,
    pub grayscale: DynamicImage,
    pub binarized: DynamicImage,
}

impl PreparedImages {
    pub fn variant(&self, variant: ImageVariant) -> &DynamicImage {
        match variant {
            ImageVariant::Binarized => &self.binarized,
            ImageVariant::Grayscale => &self.grayscale,
            ImageVariant::Original => &self.original,
        }
    }
}

/// Converts to RGB, then derives the grayscale and binarized copies
///
/// Binarization maps luma strictly above `threshold` to white and
/// everything else to black.
pub fn prepare_for_ocr(image: &DynamicImage, threshold: u8) -> PreparedImages {
    let rgb: RgbImage = image.to_rgb8();
    let gray: GrayImage = DynamicImage::ImageRgb8(rgb.clone()).to_luma8();

    let mut binary = gray.clone();
    for pixel in binary.pixels_mut() {
        *pixel = if pixel.0[0] > threshold {
            Luma([255])
        } else {
            Luma([0])
        };
    }

    PreparedImages {
        original: DynamicImage::ImageRgb8(rgb),
        grayscale: DynamicImage::ImageLuma8(gray),
        binarized: DynamicImage::ImageLuma8(binary),
    }
}

/// Runs [`OCR_CASCADE`] and returns the first non-empty trimmed text
///
/// Engine errors count as an empty attempt.
pub fn run_ocr_cascade(engine: &dyn OcrEngine, images: &PreparedImages) -> Option<String> {
    for attempt in OCR_CASCADE {
        match engine.recognize(images.variant(attempt.variant), attempt.options) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
            Err(e) => {
                tracing::debug!(
                    "OCR attempt {:?} with {} failed: {}",
                    attempt.variant,
                    engine.name(),
                    e
                );
            }
        }
    }

    None
}

/// Tesseract through its command-line binary
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    fn run_tesseract(
        &self,
        image_path: &Path,
        options: OcrOptions,
    ) -> Result<String, ExtractError> {
        let mut command = Command::new(&self.binary);
        command
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language])
            .args(["--psm", &options.page_segmentation.to_string()]);
        if let Some(engine_mode) = options.engine_mode {
            command.args(["--oem", &engine_mode.to_string()]);
        }

        match command.output() {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractError::Ocr(format!("tesseract failed: {}", stderr.trim())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                ExtractError::OcrUnavailable(format!("{} not found", self.binary.display())),
            ),
            Err(e) => Err(ExtractError::Io(e)),
        }
    }
}

impl OcrEngine for TesseractOcr {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(
        &self,
        image: &DynamicImage,
        options: OcrOptions,
    ) -> Result<String, ExtractError> {
        let input = tempfile::Builder::new()
            .prefix("cert-sieve-ocr-")
            .suffix(".png")
            .tempfile()?;
        image.save_with_format(input.path(), ImageFormat::Png)?;

        self.run_tesseract(input.path(), options)
    }
}
