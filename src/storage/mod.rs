//! Storage module for analyzed artifacts
//!
//! Artifacts are kept in a flat, content-addressed directory:
//! `{data_dir}/assets/{sha256}{ext}`. Records are immutable once written and
//! never expire.

mod assets;

pub use assets::{guess_extension, sha256_hex, AssetRecord, AssetStore, PersistOutcome};

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid content hash: '{0}'")]
    InvalidHash(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
