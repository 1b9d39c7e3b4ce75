//! Analysis coordinator - the single-URL orchestration logic
//!
//! This module ties the pipeline together for one URL:
//! - Fetching the primary URL
//! - Decoding it directly when it is a PDF or an image
//! - Otherwise trying the page's PDF and image candidates in order
//! - Falling back to the page's own visible text
//! - Persisting whatever artifact the emails came from

use crate::config::{Config, DiscoveryConfig};
use crate::extract::{extract_emails, ExtractedText, ExtractionEngine};
use crate::pipeline::batch::BatchRunner;
use crate::pipeline::discover::{discover_candidates, CandidateReference};
use crate::pipeline::fetcher::{Fetch, FetchError, FetchedDocument, HttpFetcher};
use crate::pipeline::result::{text_preview, AnalysisRequest, AnalysisResult};
use crate::pipeline::{classify, DocumentKind};
use crate::storage::AssetStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Error message for analyses cancelled before the primary fetch completed
pub const CANCELLED: &str = "analysis cancelled";

/// A candidate that decoded to at least one email
type CandidateHit = (FetchedDocument, DocumentKind, ExtractedText, Vec<String>);

/// Analyzes URLs for contact emails
///
/// Cheap to clone; clones share the HTTP client, the decode backends and the
/// asset store.
#[derive(Clone)]
pub struct Analyzer {
    fetcher: Arc<dyn Fetch>,
    engine: Arc<ExtractionEngine>,
    store: Arc<AssetStore>,
    discovery: DiscoveryConfig,
}

/// An artifact whose text produced the result
struct Finding<'a> {
    kind: DocumentKind,
    url: &'a str,
    document: &'a FetchedDocument,
    extracted: ExtractedText,
    emails: Vec<String>,
}

impl Analyzer {
    /// Creates an analyzer with the default backends
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Analyzer)` - Ready to analyze
    /// * `Err(SieveError)` - The HTTP client or the asset directory could not be set up
    pub fn new(config: &Config) -> crate::Result<Self> {
        let fetcher = HttpFetcher::new(&config.fetch)?;
        let engine = ExtractionEngine::from_config(&config.ocr);
        let store = AssetStore::open(&config.storage.data_dir)?;

        tracing::debug!("Asset store at {}", store.assets_dir().display());

        Ok(Self::from_parts(
            Arc::new(fetcher),
            Arc::new(engine),
            Arc::new(store),
            config.discovery.clone(),
        ))
    }

    /// Creates an analyzer from explicit components
    pub fn from_parts(
        fetcher: Arc<dyn Fetch>,
        engine: Arc<ExtractionEngine>,
        store: Arc<AssetStore>,
        discovery: DiscoveryConfig,
    ) -> Self {
        Self {
            fetcher,
            engine,
            store,
            discovery,
        }
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Analyzes one URL
    ///
    /// Never fails: a primary fetch failure is reported through
    /// [`AnalysisResult::error`], every other failure just yields fewer emails.
    pub async fn analyze_url(&self, request: AnalysisRequest) -> AnalysisResult {
        self.analyze_url_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Analyzes one URL, stopping early when `cancel` fires
    ///
    /// Cancellation during the primary fetch fails the analysis. During the
    /// candidate scan it skips the remaining candidates and goes straight to
    /// the page-text fallback.
    pub async fn analyze_url_with_cancel(
        &self,
        request: AnalysisRequest,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        let result = AnalysisResult::new(&request);
        tracing::info!("Analyzing {}", request.url);

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Analysis of {} cancelled", request.url);
                return result.failed(CANCELLED);
            }
            fetched = self.fetcher.fetch(&request.url) => fetched,
        };

        let document = match fetched {
            Ok(document) => document,
            Err(e) => {
                tracing::info!("Failed to fetch {}: {}", request.url, e);
                return result.failed(e.to_string());
            }
        };

        let result = match classify(&document.content_type, &document.url) {
            kind @ (DocumentKind::Pdf | DocumentKind::Image) => {
                let finding = self.decode(kind, &request.url, &document).await;
                self.complete(result, finding).await
            }
            DocumentKind::HtmlPage => self.scan_page(result, &document, cancel).await,
        };

        tracing::info!(
            "Finished {}: {} email(s) from {} {}",
            request.url,
            result.emails.len(),
            result.document_kind,
            result.url
        );

        result
    }

    /// Analyzes many URLs with at most `max_concurrent` in flight
    ///
    /// Results come back in request order.
    pub async fn analyze_all(
        &self,
        requests: Vec<AnalysisRequest>,
        max_concurrent: usize,
    ) -> Vec<AnalysisResult> {
        BatchRunner::new(self.clone(), max_concurrent)
            .run(requests)
            .await
    }

    /// Tries candidates in order, then falls back to the page text
    async fn scan_page(
        &self,
        result: AnalysisResult,
        page: &FetchedDocument,
        cancel: &CancellationToken,
    ) -> AnalysisResult {
        let html = page.text();
        let discovered =
            discover_candidates(&html, &page.final_url, self.discovery.max_candidates);

        tracing::debug!(
            "{}: {} PDF candidate(s), {} image candidate(s)",
            page.url,
            discovered.pdf_candidates.len(),
            discovered.image_candidates.len()
        );

        let candidates = discovered
            .pdf_candidates
            .iter()
            .chain(discovered.image_candidates.iter());

        for candidate in candidates {
            if cancel.is_cancelled() {
                tracing::debug!("Candidate scan of {} cancelled", page.url);
                break;
            }

            match self.try_candidate(candidate, cancel).await {
                Ok(Some((document, kind, extracted, emails))) => {
                    let finding = Finding {
                        kind,
                        url: &candidate.absolute_url,
                        document: &document,
                        extracted,
                        emails,
                    };
                    return self.complete(result, finding).await;
                }
                Ok(None) => {
                    tracing::debug!("No emails in candidate {}", candidate.absolute_url);
                }
                Err(e) => {
                    tracing::debug!("Candidate {} failed: {}", candidate.absolute_url, e);
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.discovery.politeness_delay()) => {}
            }
        }

        // Visible text of the page itself
        let emails = extract_emails(&discovered.visible_text);
        let mut result = result;
        result.document_kind = DocumentKind::HtmlPage;
        result.emails = emails;
        result.content_type = non_empty(&page.content_type);
        result.size_bytes = page.size_bytes();
        result.text_preview = text_preview(&discovered.visible_text);
        result
    }

    /// Fetches and decodes one candidate
    ///
    /// Returns `Ok(None)` when the candidate decoded but held no email.
    async fn try_candidate(
        &self,
        candidate: &CandidateReference,
        cancel: &CancellationToken,
    ) -> Result<Option<CandidateHit>, FetchError> {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(None),
            fetched = self.fetcher.fetch(&candidate.absolute_url) => fetched,
        };
        let document = fetched?;

        let kind = match classify(&document.content_type, &candidate.absolute_url) {
            DocumentKind::HtmlPage => candidate.source_kind_hint,
            kind => kind,
        };

        let extracted = self.extract(kind, &document).await;
        let emails = extract_emails(&extracted.searchable_text());
        if emails.is_empty() {
            return Ok(None);
        }

        Ok(Some((document, kind, extracted, emails)))
    }

    /// Decodes a leaf artifact, keeping the result even without emails
    async fn decode<'a>(
        &self,
        kind: DocumentKind,
        url: &'a str,
        document: &'a FetchedDocument,
    ) -> Finding<'a> {
        let extracted = self.extract(kind, document).await;
        let emails = extract_emails(&extracted.searchable_text());
        Finding {
            kind,
            url,
            document,
            extracted,
            emails,
        }
    }

    /// Runs the decode backends on the blocking pool
    async fn extract(&self, kind: DocumentKind, document: &FetchedDocument) -> ExtractedText {
        let engine = Arc::clone(&self.engine);
        let body = Arc::clone(&document.body);

        match tokio::task::spawn_blocking(move || engine.extract(kind, &body)).await {
            Ok(extracted) => extracted,
            Err(e) => {
                tracing::warn!("Extraction task for {} failed: {}", document.url, e);
                ExtractedText::default()
            }
        }
    }

    /// Fills the result from a finding and persists its artifact
    async fn complete(&self, mut result: AnalysisResult, finding: Finding<'_>) -> AnalysisResult {
        let searchable = finding.extracted.searchable_text();

        result.document_kind = finding.kind;
        result.url = finding.url.to_string();
        result.emails = finding.emails;
        result.qr_payloads = finding.extracted.qr_payloads;
        result.content_type = non_empty(&finding.document.content_type);
        result.size_bytes = finding.document.size_bytes();
        result.text_preview = text_preview(&searchable);

        let store = Arc::clone(&self.store);
        let body = Arc::clone(&finding.document.body);
        let content_type = result.content_type.clone();
        let url_hint = result.url.clone();

        let persisted = tokio::task::spawn_blocking(move || {
            store.persist(&body, content_type.as_deref(), Some(&url_hint))
        })
        .await;

        match persisted {
            Ok(Ok(outcome)) => {
                let record = outcome.into_record();
                result.content_hash = Some(record.sha256);
                result.stored_path = Some(record.path);
            }
            Ok(Err(e)) => tracing::warn!("Failed to persist {}: {}", result.url, e),
            Err(e) => tracing::warn!("Persist task for {} failed: {}", result.url, e),
        }

        result
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
