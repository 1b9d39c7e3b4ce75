//! Configuration module for Cert-Sieve
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; an empty file yields [`Config::default`].
//!
//! # Example
//!
//! ```no_run
//! use cert_sieve::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("cert-sieve.toml")).unwrap();
//! println!("Fetch timeout: {}s", config.fetch.timeout_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BatchConfig, Config, DiscoveryConfig, FetchConfig, OcrConfig, StorageConfig,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
