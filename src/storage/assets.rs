//! Content-addressed asset store

use crate::storage::{StorageError, StorageResult};
use crate::url::ends_with_extension;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};

const ASSETS_DIR: &str = "assets";

/// Content-type fragments and the extension stored for them
const CONTENT_TYPE_EXTENSIONS: &[(&str, &str)] = &[
    ("png", ".png"),
    ("jpeg", ".jpg"),
    ("jpg", ".jpg"),
    ("webp", ".webp"),
    ("tiff", ".tiff"),
    ("gif", ".gif"),
    ("pdf", ".pdf"),
];

/// URL suffixes kept as-is when the content type says nothing useful
const URL_EXTENSIONS: &[&str] = &[
    ".pdf", ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tif", ".tiff", ".webp",
];

const FALLBACK_EXTENSION: &str = ".bin";

/// Every extension `persist` can choose
const STORED_EXTENSIONS: &[&str] = &[
    ".pdf", ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tif", ".tiff", ".webp", ".bin",
];

/// A persisted artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
    /// Lowercase hex SHA-256 of the stored bytes
    pub sha256: String,

    /// Location of the stored file
    pub path: PathBuf,
}

/// Whether a persist call wrote a new file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Created(AssetRecord),
    Existing(AssetRecord),
}

impl PersistOutcome {
    pub fn record(&self) -> &AssetRecord {
        match self {
            Self::Created(record) | Self::Existing(record) => record,
        }
    }

    pub fn into_record(self) -> AssetRecord {
        match self {
            Self::Created(record) | Self::Existing(record) => record,
        }
    }
}

/// Flat directory of artifacts named by their content hash
///
/// Safe to share between concurrent analyses: files are written to a
/// temporary name and linked into place without overwriting, so readers
/// never see a partial file.
#[derive(Debug, Clone)]
pub struct AssetStore {
    assets_dir: PathBuf,
}

impl AssetStore {
    /// Opens the store under `data_dir`, creating `data_dir/assets` if needed
    pub fn open(data_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let assets_dir = data_dir.as_ref().join(ASSETS_DIR);
        std::fs::create_dir_all(&assets_dir)?;
        Ok(Self { assets_dir })
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Stores `bytes` unless a file with the same hash already exists
    ///
    /// An existing file is returned as-is without re-checking its content.
    /// The path for this call's extension is checked first, then the other
    /// names the hash could be stored under.
    ///
    /// Two concurrent writers of the same bytes with different extensions can
    /// both miss and create `{sha}.pdf` and `{sha}.bin` side by side. Both hold
    /// identical bytes and [`lookup`](Self::lookup) returns one of them, so the
    /// duplicate is tolerated rather than serialized with a lock.
    pub fn persist(
        &self,
        bytes: &[u8],
        content_type: Option<&str>,
        url_hint: Option<&str>,
    ) -> StorageResult<PersistOutcome> {
        let sha256 = sha256_hex(bytes);
        let extension = guess_extension(content_type, url_hint);
        let path = self.asset_path(&sha256, extension);

        let existing = if path.is_file() {
            Some(AssetRecord {
                sha256: sha256.clone(),
                path: path.clone(),
            })
        } else {
            self.lookup(&sha256)?
        };
        if let Some(existing) = existing {
            tracing::debug!("Asset {} already stored", sha256);
            return Ok(PersistOutcome::Existing(existing));
        }

        let mut temp = tempfile::Builder::new()
            .prefix(".incoming-")
            .tempfile_in(&self.assets_dir)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;

        let record = AssetRecord {
            sha256,
            path: path.clone(),
        };

        match temp.persist_noclobber(&path) {
            Ok(_) => {
                tracing::debug!("Stored asset {}", path.display());
                Ok(PersistOutcome::Created(record))
            }
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                Ok(PersistOutcome::Existing(record))
            }
            Err(e) => Err(StorageError::Io(e.error)),
        }
    }

    /// Finds the stored file for a hash, whatever its extension
    ///
    /// Checks each name `persist` could have used instead of listing the
    /// directory.
    pub fn lookup(&self, sha256: &str) -> StorageResult<Option<AssetRecord>> {
        if sha256.len() != 64 || !sha256.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(StorageError::InvalidHash(sha256.to_string()));
        }
        let sha256 = sha256.to_ascii_lowercase();

        let found = STORED_EXTENSIONS
            .iter()
            .map(|ext| self.asset_path(&sha256, ext))
            .find(|path| path.is_file());

        Ok(found.map(|path| AssetRecord { sha256, path }))
    }

    fn asset_path(&self, sha256: &str, extension: &str) -> PathBuf {
        self.assets_dir.join(format!("{}{}", sha256, extension))
    }
}

/// Lowercase hex SHA-256 digest
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Picks a file extension from the content type, then the URL, else `.bin`
pub fn guess_extension(content_type: Option<&str>, url_hint: Option<&str>) -> &'static str {
    if let Some(content_type) = content_type {
        let content_type = content_type.to_lowercase();
        if let Some((_, ext)) = CONTENT_TYPE_EXTENSIONS
            .iter()
            .find(|(fragment, _)| content_type.contains(fragment))
        {
            return *ext;
        }
    }

    if let Some(url) = url_hint {
        if let Some(ext) = URL_EXTENSIONS
            .iter()
            .find(|ext| ends_with_extension(url, ext))
        {
            return *ext;
        }
    }

    FALLBACK_EXTENSION
}
