//! Cert-Sieve: contact harvesting from certificate documents
//!
//! This crate fetches a URL that is believed to reference a certificate or contact
//! document (a PDF, an image, or an HTML page embedding either), decodes it through
//! several best-effort backends (PDF text extraction, OCR, QR decoding), and extracts
//! the email addresses it contains. Fetched artifacts are cached on disk under their
//! SHA-256 hash.

pub mod config;
pub mod extract;
pub mod pipeline;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Cert-Sieve operations
#[derive(Debug, Error)]
pub enum SieveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] pipeline::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Cert-Sieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{extract_emails, ExtractionEngine};
pub use pipeline::{classify, AnalysisRequest, AnalysisResult, Analyzer, DocumentKind};
pub use storage::{AssetRecord, AssetStore};
