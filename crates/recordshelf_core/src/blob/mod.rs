//! Blob storage boundary for record images.
//!
//! # Responsibility
//! - Define the `BlobStore` port used by image use-cases.
//! - Derive blob keys from record identity.
//!
//! # Invariants
//! - Keys are relative, `/`-separated, and contain no empty, `.` or `..`
//!   segments.
//! - A missing blob is reported as `BlobError::NotFound`, distinct from
//!   transport failures.

use crate::model::record::{Collection, RecordId};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod fs_store;

pub use fs_store::FsBlobStore;

pub type BlobResult<T> = Result<T, BlobError>;

/// Errors raised by blob store adapters.
#[derive(Debug)]
pub enum BlobError {
    NotFound(BlobKey),
    InvalidKey(String),
    Io(std::io::Error),
}

impl Display for BlobError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "blob not found: {key}"),
            Self::InvalidKey(key) => write!(f, "invalid blob key `{key}`"),
            Self::Io(err) => write!(f, "blob store i/o failure: {err}"),
        }
    }
}

impl Error for BlobError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::NotFound(_) | Self::InvalidKey(_) => None,
        }
    }
}

impl From<std::io::Error> for BlobError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Validated object key inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    /// Parses and validates a raw key.
    pub fn parse(raw: impl Into<String>) -> BlobResult<Self> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && !raw.starts_with('/')
            && raw
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if valid {
            Ok(Self(raw))
        } else {
            Err(BlobError::InvalidKey(raw))
        }
    }

    /// Key of the image attached to record `id`, e.g. `cat-images/7`.
    pub fn for_record(collection: Collection, id: RecordId) -> Self {
        Self(format!("{}{id}", collection.image_key_prefix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl Display for BlobKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object storage holding per-record images.
pub trait BlobStore {
    /// Stores `bytes` under `key`, replacing any previous blob, and returns
    /// the URL the blob is reachable at.
    fn put(&self, key: &BlobKey, bytes: &[u8]) -> BlobResult<String>;
    /// Loads the bytes stored under `key`.
    fn get(&self, key: &BlobKey) -> BlobResult<Vec<u8>>;
}

impl<T: BlobStore + ?Sized> BlobStore for &T {
    fn put(&self, key: &BlobKey, bytes: &[u8]) -> BlobResult<String> {
        (**self).put(key, bytes)
    }

    fn get(&self, key: &BlobKey) -> BlobResult<Vec<u8>> {
        (**self).get(key)
    }
}
