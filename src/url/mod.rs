//! URL handling utilities
//!
//! This module provides:
//! - Absolutization of references found in (often malformed) page markup
//! - Suffix checks used for document classification and candidate discovery
//! - Display-name inference for analysis results

mod absolutize;

pub use absolutize::absolutize;

/// Raster image extensions recognized by suffix (lowercase, with dot)
pub const RASTER_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tif", ".tiff"];

/// Returns the lowercased path portion of a URL string, without query or fragment
///
/// Works on arbitrary strings (relative references included), so it never fails.
///
/// # Examples
///
/// ```
/// use cert_sieve::url::path_suffix;
///
/// assert_eq!(path_suffix("https://Example.com/Cert.PDF?download=1"), "https://example.com/cert.pdf");
/// ```
pub fn path_suffix(url: &str) -> String {
    let end = url.find(|c: char| c == '?' || c == '#').unwrap_or(url.len());
    url[..end].to_lowercase()
}

/// Returns true if `url` ends with the lowercase `ext`, checking both the whole
/// string and its path
///
/// The whole-string check catches download scripts such as `get.php?file=cert.pdf`.
pub fn ends_with_extension(url: &str, ext: &str) -> bool {
    url.to_lowercase().ends_with(ext) || path_suffix(url).ends_with(ext)
}

/// Returns true if the URL or its path ends in `.pdf`
pub fn has_pdf_extension(url: &str) -> bool {
    ends_with_extension(url, ".pdf")
}

/// Returns true if the URL or its path ends in a known raster image extension
pub fn has_raster_extension(url: &str) -> bool {
    RASTER_EXTENSIONS
        .iter()
        .any(|ext| ends_with_extension(url, ext))
}

/// Infers a human-readable name from the last `/`-separated segment of a URL
///
/// Falls back to `"certificate"` when the URL ends with a slash.
pub fn infer_name_from_url(url: &str) -> String {
    match url.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_string(),
        _ => "certificate".to_string(),
    }
}
