//! Record image use-cases.
//!
//! # Responsibility
//! - Upload image bytes for an existing record and remember the blob URL.
//! - Download a record image, separating "no image" from store failures.
//!
//! # Invariants
//! - The record must exist before the blob store is touched.
//! - Uploads must be non-empty `image/*` payloads.
//! - No retries; blob failures surface to the caller unchanged.

use crate::blob::{BlobError, BlobKey, BlobStore};
use crate::model::record::RecordId;
use crate::repo::record_repo::RecordRepository;
use crate::repo::RepoError;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static IMAGE_MIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^image/[a-z0-9][a-z0-9!#$&^_.+-]{0,126}$").expect("valid image mime regex")
});

/// Service error for image use-cases.
#[derive(Debug)]
pub enum ImageServiceError {
    RecordNotFound(RecordId),
    EmptyImage,
    InvalidContentType(String),
    /// Record exists but has no stored image.
    ImageNotFound(RecordId),
    Blob(BlobError),
    Repo(RepoError),
}

impl Display for ImageServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecordNotFound(id) => write!(f, "record not found: {id}"),
            Self::EmptyImage => write!(f, "image can't be empty"),
            Self::InvalidContentType(value) => {
                write!(f, "invalid content type `{value}`; only images are allowed")
            }
            Self::ImageNotFound(id) => write!(f, "image not found for record {id}"),
            Self::Blob(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ImageServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Blob(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ImageServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::RecordNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Image service over a record repository and a blob store.
pub struct ImageService<R: RecordRepository, B: BlobStore> {
    repo: R,
    store: B,
}

impl<R: RecordRepository, B: BlobStore> ImageService<R, B> {
    pub fn new(repo: R, store: B) -> Self {
        Self { repo, store }
    }

    /// Stores the image for record `id` and returns its URL.
    ///
    /// The URL is saved into the record's `image_url` column.
    pub fn upload_image(
        &self,
        id: RecordId,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, ImageServiceError> {
        let collection = self.repo.collection();
        let mut record = self
            .repo
            .get_record(id)?
            .ok_or(ImageServiceError::RecordNotFound(id))?;

        if bytes.is_empty() {
            warn!(
                "event=image_upload module=service status=rejected reason=empty collection={} id={id}",
                collection.label()
            );
            return Err(ImageServiceError::EmptyImage);
        }
        if !is_image_content_type(content_type) {
            warn!(
                "event=image_upload module=service status=rejected reason=content_type collection={} id={id}",
                collection.label()
            );
            return Err(ImageServiceError::InvalidContentType(
                content_type.to_string(),
            ));
        }

        let key = BlobKey::for_record(collection, id);
        let url = self.store.put(&key, bytes).map_err(|err| {
            error!(
                "event=image_upload module=service status=error collection={} id={id} error={err}",
                collection.label()
            );
            ImageServiceError::Blob(err)
        })?;

        record.set_image_url(Some(url.clone()));
        self.repo.update_record(&record)?;
        info!(
            "event=image_upload module=service status=ok collection={} id={id} size={}",
            collection.label(),
            bytes.len()
        );
        Ok(url)
    }

    /// Loads the image bytes for record `id`.
    pub fn download_image(&self, id: RecordId) -> Result<Vec<u8>, ImageServiceError> {
        let collection = self.repo.collection();
        if self.repo.get_record(id)?.is_none() {
            return Err(ImageServiceError::RecordNotFound(id));
        }

        let key = BlobKey::for_record(collection, id);
        match self.store.get(&key) {
            Ok(bytes) => Ok(bytes),
            Err(BlobError::NotFound(_)) => Err(ImageServiceError::ImageNotFound(id)),
            Err(err) => {
                error!(
                    "event=image_download module=service status=error collection={} id={id} error={err}",
                    collection.label()
                );
                Err(ImageServiceError::Blob(err))
            }
        }
    }
}

/// Accepts `image/<subtype>` with optional parameters, case-insensitively.
pub fn is_image_content_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    IMAGE_MIME_RE.is_match(essence)
}
