//! Candidate discovery for HTML landing pages
//!
//! Certificate pages rarely serve the document directly. This module parses
//! the markup to find:
//! - PDF references (`<embed>`, `<iframe>`, `<a>`)
//! - Likely certificate images (`<img>`)
//! - The page's visible text, used as the last-resort email source

use crate::pipeline::DocumentKind;
use crate::url::{absolutize, has_raster_extension};
use scraper::{Html, Selector};
use std::collections::HashSet;

/// Substrings of `alt` text that mark an image as a probable certificate
const CERTIFICATE_ALT_MARKERS: &[&str] = &["certificate", "cert", "cb", "ce", "gs"];

/// Elements whose text content is never rendered
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// A reference discovered inside a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReference {
    /// Attribute value as written in the markup
    pub raw_href: String,

    /// Absolute URL after resolution and repair
    pub absolute_url: String,

    /// What the reference is expected to point at
    pub source_kind_hint: DocumentKind,
}

/// Everything extracted from a landing page
#[derive(Debug, Clone, Default)]
pub struct DiscoveredPage {
    /// PDF candidates in priority order, deduplicated and capped
    pub pdf_candidates: Vec<CandidateReference>,

    /// Image candidates in document order, deduplicated and capped
    pub image_candidates: Vec<CandidateReference>,

    /// Visible text nodes joined with single spaces
    pub visible_text: String,
}

/// Parses a landing page and collects candidate documents
///
/// # PDF Priority Order
///
/// 1. The first `<embed>` whose `type` declares a PDF
/// 2. Every `<iframe>` whose `src` contains `.pdf`
/// 3. Every `<a>` whose `href` contains `.pdf`
///
/// # Image Candidates
///
/// `<img>` elements whose `alt` contains a certificate marker
/// (`certificate`, `cert`, `cb`, `ce`, `gs`) or whose `src` ends in a
/// raster extension.
///
/// Each list is deduplicated by absolute URL (first occurrence wins) and
/// then truncated to `max_candidates`. References that do not resolve to
/// `http`/`https` are dropped.
///
/// # Example
///
/// ```
/// use cert_sieve::pipeline::discover_candidates;
///
/// let html = r#"<html><body><a href="/iso.pdf">ISO</a><p>Mail sales@example.com</p></body></html>"#;
/// let page = discover_candidates(html, "https://example.com/company", 3);
/// assert_eq!(page.pdf_candidates[0].absolute_url, "https://example.com/iso.pdf");
/// assert!(page.visible_text.contains("sales@example.com"));
/// ```
pub fn discover_candidates(html: &str, base_url: &str, max_candidates: usize) -> DiscoveredPage {
    let document = Html::parse_document(html);

    let pdf_refs = collect_pdf_references(&document);
    let image_refs = collect_image_references(&document);

    DiscoveredPage {
        pdf_candidates: resolve_candidates(pdf_refs, base_url, DocumentKind::Pdf, max_candidates),
        image_candidates: resolve_candidates(
            image_refs,
            base_url,
            DocumentKind::Image,
            max_candidates,
        ),
        visible_text: extract_visible_text(&document),
    }
}

/// Collects raw PDF references in priority order
fn collect_pdf_references(document: &Html) -> Vec<String> {
    let mut refs = Vec::new();

    if let Ok(embed_selector) = Selector::parse("embed[type]") {
        let first_pdf_embed = document.select(&embed_selector).find(|element| {
            element
                .value()
                .attr("type")
                .map(|t| t.to_lowercase().contains("application/pdf"))
                .unwrap_or(false)
        });

        if let Some(src) = first_pdf_embed.and_then(|e| e.value().attr("src")) {
            refs.push(src.to_string());
        }
    }

    if let Ok(iframe_selector) = Selector::parse("iframe[src]") {
        for element in document.select(&iframe_selector) {
            if let Some(src) = element.value().attr("src") {
                if src.to_lowercase().contains(".pdf") {
                    refs.push(src.to_string());
                }
            }
        }
    }

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if href.to_lowercase().contains(".pdf") {
                    refs.push(href.to_string());
                }
            }
        }
    }

    refs
}

/// Collects raw references to images that look like certificates
fn collect_image_references(document: &Html) -> Vec<String> {
    let mut refs = Vec::new();

    if let Ok(img_selector) = Selector::parse("img[src]") {
        for element in document.select(&img_selector) {
            let Some(src) = element.value().attr("src") else {
                continue;
            };

            let alt = element.value().attr("alt").unwrap_or("").to_lowercase();
            let alt_matches = CERTIFICATE_ALT_MARKERS
                .iter()
                .any(|marker| alt.contains(marker));

            if alt_matches || has_raster_extension(src) {
                refs.push(src.to_string());
            }
        }
    }

    refs
}

/// Absolutizes, filters, deduplicates and caps raw references
fn resolve_candidates(
    raw_refs: Vec<String>,
    base_url: &str,
    kind: DocumentKind,
    max_candidates: usize,
) -> Vec<CandidateReference> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for raw_href in raw_refs {
        if raw_href.trim().is_empty() {
            continue;
        }

        let absolute_url = absolutize(base_url, &raw_href);
        if !is_http_url(&absolute_url) {
            tracing::debug!("Skipping non-HTTP candidate '{}'", raw_href);
            continue;
        }

        if seen.insert(absolute_url.clone()) {
            candidates.push(CandidateReference {
                raw_href,
                absolute_url,
                source_kind_hint: kind,
            });
        }
    }

    candidates.truncate(max_candidates);
    candidates
}

fn is_http_url(candidate: &str) -> bool {
    match url::Url::parse(candidate) {
        Ok(parsed) => parsed.scheme() == "http" || parsed.scheme() == "https",
        Err(_) => false,
    }
}

/// Extracts rendered text: every text node outside invisible elements
fn extract_visible_text(document: &Html) -> String {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent()?;
            let parent_name = parent.value().as_element().map(|e| e.name()).unwrap_or("");
            if INVISIBLE_ELEMENTS.contains(&parent_name) {
                None
            } else {
                Some(text.trim())
            }
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
