//! Filesystem-backed blob store.
//!
//! Blobs live at `<root>/<bucket>/<key>`. Writes go to a temporary sibling
//! file first and are renamed into place, so readers never observe a
//! partially written blob.

use super::{BlobError, BlobKey, BlobResult, BlobStore};
use log::{error, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct FsBlobStore {
    root: PathBuf,
    bucket: String,
}

impl FsBlobStore {
    /// Creates a store for `bucket` under `root`.
    ///
    /// The bucket must be a single valid key segment.
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> BlobResult<Self> {
        let bucket = bucket.into();
        let parsed = BlobKey::parse(bucket.as_str())?;
        if parsed.segments().count() != 1 {
            return Err(BlobError::InvalidKey(bucket));
        }
        Ok(Self {
            root: root.into(),
            bucket,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn blob_path(&self, key: &BlobKey) -> PathBuf {
        let mut path = self.root.join(&self.bucket);
        for segment in key.segments() {
            path.push(segment);
        }
        path
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &BlobKey, bytes: &[u8]) -> BlobResult<String> {
        let path = self.blob_path(key);
        if let Err(err) = write_atomically(&path, bytes) {
            error!(
                "event=blob_put module=blob status=error bucket={} key={key} error={err}",
                self.bucket
            );
            return Err(err.into());
        }

        info!(
            "event=blob_put module=blob status=ok bucket={} key={key} size={}",
            self.bucket,
            bytes.len()
        );
        Ok(format!("file://{}", path.display()))
    }

    fn get(&self, key: &BlobKey) -> BlobResult<Vec<u8>> {
        match fs::read(self.blob_path(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(
                    "event=blob_get module=blob status=not_found bucket={} key={key}",
                    self.bucket
                );
                Err(BlobError::NotFound(key.clone()))
            }
            Err(err) => {
                error!(
                    "event=blob_get module=blob status=error bucket={} key={key} error={err}",
                    self.bucket
                );
                Err(err.into())
            }
        }
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, "blob path has no parent"))?;
    fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = parent.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    fs::write(&temp_path, bytes)?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    Ok(())
}
