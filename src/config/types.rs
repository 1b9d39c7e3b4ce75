use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Browser-like user agent sent with every request unless overridden
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Cert-Sieve
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub discovery: DiscoveryConfig,
    pub ocr: OcrConfig,
    pub storage: StorageConfig,
    pub batch: BatchConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Total request timeout (seconds)
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// User-Agent header value
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            connect_timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
        }
    }
}

/// Candidate discovery behavior for HTML landing pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Maximum number of PDF candidates and of image candidates tried per page
    pub max_candidates: usize,

    /// Pause after each unsuccessful candidate attempt (milliseconds)
    pub politeness_delay_ms: u64,
}

impl DiscoveryConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_candidates: 3,
            politeness_delay_ms: 1000,
        }
    }
}

/// OCR engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OcrConfig {
    /// Name or path of the tesseract executable
    pub tesseract_binary: String,

    /// Tesseract language pack (e.g. "eng")
    pub language: String,

    /// Grayscale intensity above which a pixel becomes white when binarizing
    pub threshold: u8,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_binary: "tesseract".to_string(),
            language: "eng".to_string(),
            threshold: 180,
        }
    }
}

/// Asset storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Root directory; assets land in `{data_dir}/assets`
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Batch execution configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BatchConfig {
    /// Maximum number of analyses in flight at once
    pub max_concurrent: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}
