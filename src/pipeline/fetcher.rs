//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the pipeline, including:
//! - Building one shared HTTP client with a browser-like header profile
//! - GET requests returning raw bytes and the Content-Type header
//! - Error classification (status, timeout, transport)
//!
//! There is no retry here. The primary fetch fails the analysis and a failed
//! candidate fetch just moves the candidate loop along.

use crate::config::FetchConfig;
use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE,
    UPGRADE_INSECURE_REQUESTS,
};
use reqwest::Client;
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;

const ACCEPT_PROFILE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Errors produced by a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {status_code} for {url}")]
    Status { url: String, status_code: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid value for header {name}: '{value}'")]
    InvalidHeader { name: &'static str, value: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl FetchError {
    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Http {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

/// A successfully fetched artifact
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// The URL that was requested
    pub url: String,

    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code (always 2xx)
    pub status_code: u16,

    /// Content-Type header value, empty if absent
    pub content_type: String,

    /// Raw response body
    pub body: Arc<[u8]>,
}

impl FetchedDocument {
    pub fn size_bytes(&self) -> u64 {
        self.body.len() as u64
    }

    /// The `charset` parameter of the Content-Type, if any
    pub fn charset(&self) -> Option<&str> {
        self.content_type
            .split(';')
            .skip(1)
            .filter_map(|param| param.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, value)| value.trim().trim_matches('"'))
            .filter(|value| !value.is_empty())
    }

    /// Decodes the body as text
    ///
    /// Uses the declared charset, falling back to UTF-8 when it is missing or
    /// unknown. A byte order mark overrides both. Malformed sequences become
    /// U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        let encoding = self
            .charset()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, _, _) = encoding.decode(&self.body);
        text
    }
}

/// HTTP GET capability used by the analyzer
///
/// Implementations must be shareable across concurrently running analyses.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches `url`, failing on transport errors, timeouts and non-2xx statuses
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError>;
}

/// Builds an HTTP client with the shared header profile
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(FetchError)` - Invalid header value or client construction failure
///
/// # Example
///
/// ```no_run
/// use cert_sieve::config::FetchConfig;
/// use cert_sieve::pipeline::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, FetchError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_PROFILE));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language).map_err(|_| {
            FetchError::InvalidHeader {
                name: "accept-language",
                value: config.accept_language.clone(),
            }
        })?,
    );
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    let user_agent =
        HeaderValue::from_str(&config.user_agent).map_err(|_| FetchError::InvalidHeader {
            name: "user-agent",
            value: config.user_agent.clone(),
        })?;

    let client = Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// [`Fetch`] implementation backed by a pooled `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a freshly built client
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status_code: status.as_u16(),
            });
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        tracing::debug!(
            "Fetched {} ({} bytes, content-type '{}')",
            url,
            body.len(),
            content_type
        );

        Ok(FetchedDocument {
            url: url.to_string(),
            final_url,
            status_code: status.as_u16(),
            content_type,
            body: Arc::from(body.as_ref()),
        })
    }
}
