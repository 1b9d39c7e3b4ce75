//! Analysis pipeline for certificate and contact documents
//!
//! This module contains the core analysis logic, including:
//! - HTTP fetching with a shared client
//! - Classification of fetched artifacts
//! - Candidate discovery on HTML landing pages
//! - Per-URL orchestration and batch execution

mod batch;
mod classify;
mod coordinator;
mod discover;
mod fetcher;
mod result;

pub use batch::BatchRunner;
pub use classify::{classify, DocumentKind};
pub use coordinator::{Analyzer, CANCELLED};
pub use discover::{discover_candidates, CandidateReference, DiscoveredPage};
pub use fetcher::{build_http_client, Fetch, FetchError, FetchedDocument, HttpFetcher};
pub use result::{text_preview, AnalysisRequest, AnalysisResult, TEXT_PREVIEW_CHARS};
