//! Integration tests for the analyzer
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, discover, decode and persist cycle end-to-end. PDF text and OCR
//! are replaced with in-test backends; QR decoding uses the real decoder.

use cert_sieve::config::{DiscoveryConfig, FetchConfig};
use cert_sieve::extract::{ExtractError, OcrEngine, OcrOptions, PdfTextBackend, RqrrDecoder};
use cert_sieve::pipeline::HttpFetcher;
use cert_sieve::{AnalysisRequest, Analyzer, AssetStore, DocumentKind, ExtractionEngine};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Reads "PDF" bytes as plain UTF-8 text
struct PlainTextPdf;

impl PdfTextBackend for PlainTextPdf {
    fn name(&self) -> &'static str {
        "plain-text"
    }

    fn page_texts(&self, bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
        Ok(vec![String::from_utf8_lossy(bytes).into_owned()])
    }
}

/// Returns the same text for every image
struct FixedOcr(&'static str);

impl OcrEngine for FixedOcr {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn recognize(
        &self,
        _image: &DynamicImage,
        _options: OcrOptions,
    ) -> Result<String, ExtractError> {
        Ok(self.0.to_string())
    }
}

/// Creates an analyzer talking real HTTP with stubbed decoders
fn create_analyzer(data_dir: &Path, max_candidates: usize, ocr_text: &'static str) -> Analyzer {
    let fetcher = HttpFetcher::new(&FetchConfig::default()).expect("Failed to build fetcher");
    let engine = ExtractionEngine::new(
        vec![Box::new(PlainTextPdf)],
        Box::new(FixedOcr(ocr_text)),
        Box::new(RqrrDecoder),
        180,
    );
    let store = AssetStore::open(data_dir).expect("Failed to open asset store");

    Analyzer::from_parts(
        Arc::new(fetcher),
        Arc::new(engine),
        Arc::new(store),
        DiscoveryConfig {
            max_candidates,
            politeness_delay_ms: 0,
        },
    )
}

fn white_png() -> Vec<u8> {
    let image = RgbImage::from_pixel(32, 32, Rgb([255, 255, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode PNG");
    bytes
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn pdf(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(text.as_bytes().to_vec())
        .insert_header("content-type", "application/pdf")
}

#[tokio::test]
async fn test_primary_404_fails_analysis() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/cert.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let analyzer = create_analyzer(dir.path(), 3, "");
    let url = format!("{}/cert.pdf", mock_server.uri());
    let result = analyzer.analyze_url(AnalysisRequest::new(&url)).await;

    assert!(result.error.is_some());
    assert!(result.error.as_deref().unwrap_or("").contains("404"));
    assert!(result.emails.is_empty());
    assert_eq!(result.name, "cert.pdf");
    assert!(result.stored_path.is_none());
}

#[tokio::test]
async fn test_direct_pdf() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/files/iso9001"))
        .respond_with(pdf("ISO 9001 holder. Contact contact@example.com for details."))
        .expect(1)
        .mount(&mock_server)
        .await;

    let analyzer = create_analyzer(dir.path(), 3, "");
    let url = format!("{}/files/iso9001", mock_server.uri());
    let result = analyzer
        .analyze_url(AnalysisRequest::new(&url).with_name("ISO 9001"))
        .await;

    assert_eq!(result.error, None);
    assert_eq!(result.emails, vec!["contact@example.com"]);
    assert_eq!(result.document_kind, DocumentKind::Pdf);
    assert_eq!(result.name, "ISO 9001");
    assert_eq!(result.url, url);
    assert_eq!(result.content_type.as_deref(), Some("application/pdf"));

    let stored = result.stored_path.expect("PDF should be persisted");
    assert!(stored.starts_with(dir.path().join("assets")));
    assert!(stored.to_string_lossy().ends_with(".pdf"));
    assert_eq!(
        stored.file_stem().and_then(|s| s.to_str()),
        result.content_hash.as_deref()
    );
}

#[tokio::test]
async fn test_page_without_candidates_uses_visible_text() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(
            r#"<h1>Factory</h1><p>Write to sales@factory.cn today</p>
               <script>var x = "hidden@factory.cn";</script>"#,
        ))
        .mount(&mock_server)
        .await;

    let analyzer = create_analyzer(dir.path(), 3, "");
    let url = format!("{}/about", mock_server.uri());
    let result = analyzer.analyze_url(AnalysisRequest::new(&url)).await;

    assert_eq!(result.error, None);
    assert_eq!(result.emails, vec!["sales@factory.cn"]);
    assert_eq!(result.document_kind, DocumentKind::HtmlPage);
    assert_eq!(result.url, url);
    assert!(result.stored_path.is_none());
}

#[tokio::test]
async fn test_fourth_pdf_candidate_wins() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/certs"))
        .respond_with(html(
            r#"<a href="/docs/c1.pdf">1</a>
               <a href="/docs/c2.pdf">2</a>
               <a href="/docs/c3.pdf">3</a>
               <a href="/docs/c4.pdf">4</a>
               <a href="/docs/c5.pdf">5</a>
               <p>page@fallback.test</p>"#,
        ))
        .mount(&mock_server)
        .await;

    for name in ["c1", "c2", "c3"] {
        Mock::given(method("GET"))
            .and(path(format!("/docs/{}.pdf", name)))
            .respond_with(pdf("Certificate without contact details"))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/docs/c4.pdf"))
        .respond_with(pdf("Issued to ACME, quality@acme.test"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/c5.pdf"))
        .respond_with(pdf("never@reached.test"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let analyzer = create_analyzer(dir.path(), 5, "");
    let result = analyzer
        .analyze_url(AnalysisRequest::new(format!("{}/certs", mock_server.uri())))
        .await;

    assert_eq!(result.error, None);
    assert_eq!(result.emails, vec!["quality@acme.test"]);
    assert_eq!(result.document_kind, DocumentKind::Pdf);
    assert_eq!(result.url, format!("{}/docs/c4.pdf", mock_server.uri()));
    assert!(result.stored_path.is_some());
}

#[tokio::test]
async fn test_default_cap_never_reaches_fourth_candidate() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/certs"))
        .respond_with(html(
            r#"<a href="/docs/c1.pdf">1</a>
               <a href="/docs/c2.pdf">2</a>
               <a href="/docs/c3.pdf">3</a>
               <a href="/docs/c4.pdf">4</a>
               <a href="/docs/c5.pdf">5</a>
               <p>Office: page@fallback.test</p>"#,
        ))
        .mount(&mock_server)
        .await;

    for name in ["c1", "c2", "c3"] {
        Mock::given(method("GET"))
            .and(path(format!("/docs/{}.pdf", name)))
            .respond_with(pdf("No contact"))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    for name in ["c4", "c5"] {
        Mock::given(method("GET"))
            .and(path(format!("/docs/{}.pdf", name)))
            .respond_with(pdf("hidden@acme.test"))
            .expect(0)
            .mount(&mock_server)
            .await;
    }

    let analyzer = create_analyzer(dir.path(), 3, "");
    let url = format!("{}/certs", mock_server.uri());
    let result = analyzer.analyze_url(AnalysisRequest::new(&url)).await;

    assert_eq!(result.emails, vec!["page@fallback.test"]);
    assert_eq!(result.document_kind, DocumentKind::HtmlPage);
    assert_eq!(result.url, url);
}

#[tokio::test]
async fn test_image_candidate_after_pdf_candidates() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/company"))
        .respond_with(html(
            r#"<a href="/docs/brochure.pdf">Brochure</a>
               <img src="/logo.svg" alt="logo">
               <img src="/media/scan?id=7" alt="CE Certificate">"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/brochure.pdf"))
        .respond_with(pdf("Our products"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/media/scan"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(white_png())
                .insert_header("content-type", "image/png"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let analyzer = create_analyzer(dir.path(), 3, "Certificate holder: export@mill.test");
    let result = analyzer
        .analyze_url(AnalysisRequest::new(format!("{}/company", mock_server.uri())))
        .await;

    assert_eq!(result.emails, vec!["export@mill.test"]);
    assert_eq!(result.document_kind, DocumentKind::Image);
    assert_eq!(result.url, format!("{}/media/scan?id=7", mock_server.uri()));
    assert!(result
        .stored_path
        .as_ref()
        .map(|p| p.to_string_lossy().ends_with(".png"))
        .unwrap_or(false));
}

#[tokio::test]
async fn test_blank_image_completes_without_emails() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/scan.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(white_png())
                .insert_header("content-type", "image/png"),
        )
        .mount(&mock_server)
        .await;

    let analyzer = create_analyzer(dir.path(), 3, "   ");
    let result = analyzer
        .analyze_url(AnalysisRequest::new(format!("{}/scan.png", mock_server.uri())))
        .await;

    assert_eq!(result.error, None);
    assert!(result.emails.is_empty());
    assert!(result.qr_payloads.is_empty());
    assert_eq!(result.text_preview, None);
    assert_eq!(result.document_kind, DocumentKind::Image);
    assert!(result.stored_path.is_some());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    for route in ["/a/cert.pdf", "/b/copy.pdf"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(pdf("Registrar: registry@cert.test"))
            .mount(&mock_server)
            .await;
    }

    let analyzer = create_analyzer(dir.path(), 3, "");
    let first = analyzer
        .analyze_url(AnalysisRequest::new(format!("{}/a/cert.pdf", mock_server.uri())))
        .await;
    let second = analyzer
        .analyze_url(AnalysisRequest::new(format!("{}/a/cert.pdf", mock_server.uri())))
        .await;
    let copy = analyzer
        .analyze_url(AnalysisRequest::new(format!("{}/b/copy.pdf", mock_server.uri())))
        .await;

    assert_eq!(first.emails, second.emails);
    assert!(first.content_hash.is_some());
    assert_eq!(first.content_hash, second.content_hash);
    assert_eq!(first.content_hash, copy.content_hash);
    assert_eq!(first.stored_path, copy.stored_path);

    let stored_files = std::fs::read_dir(analyzer.store().assets_dir())
        .unwrap()
        .count();
    assert_eq!(stored_files, 1);
}

#[tokio::test]
async fn test_emails_deduplicated_case_sensitively() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/contacts.pdf"))
        .respond_with(pdf(
            "Sales@Acme.test, sales@acme.test; Sales@Acme.test and support@acme.test",
        ))
        .mount(&mock_server)
        .await;

    let analyzer = create_analyzer(dir.path(), 3, "");
    let result = analyzer
        .analyze_url(AnalysisRequest::new(format!("{}/contacts.pdf", mock_server.uri())))
        .await;

    assert_eq!(
        result.emails,
        vec!["Sales@Acme.test", "sales@acme.test", "support@acme.test"]
    );
}

#[tokio::test]
async fn test_cancel_during_candidate_scan_falls_back_to_page_text() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html(
            r#"<a href="/docs/slow.pdf">slow</a>
               <a href="/docs/next.pdf">next</a>
               <p>desk@plant.test</p>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/slow.pdf"))
        .respond_with(pdf("late@plant.test").set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/next.pdf"))
        .respond_with(pdf("next@plant.test"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let analyzer = create_analyzer(dir.path(), 3, "");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let result = analyzer
        .analyze_url_with_cancel(
            AnalysisRequest::new(format!("{}/slow", mock_server.uri())),
            &cancel,
        )
        .await;

    assert_eq!(result.error, None);
    assert_eq!(result.emails, vec!["desk@plant.test"]);
    assert_eq!(result.document_kind, DocumentKind::HtmlPage);
}

#[tokio::test]
async fn test_analyze_all_keeps_request_order() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/one.pdf"))
        .respond_with(pdf("one@first.test"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(html("<p>two@second.test</p>"))
        .mount(&mock_server)
        .await;

    let analyzer = create_analyzer(dir.path(), 3, "");
    let requests = vec![
        AnalysisRequest::new(format!("{}/one.pdf", mock_server.uri())),
        AnalysisRequest::new(format!("{}/missing", mock_server.uri())),
        AnalysisRequest::new(format!("{}/two", mock_server.uri())),
    ];
    let results = analyzer.analyze_all(requests, 2).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].emails, vec!["one@first.test"]);
    assert!(results[1].error.is_some());
    assert_eq!(results[2].emails, vec!["two@second.test"]);
}
