//! Uploaded image storage.
//!
//! Images attached to lost and found reports are written to a local
//! directory under a fresh object id and served back read-only under
//! `/uploads`. The returned URL is what gets stored on the report.

use std::path::{Path, PathBuf};

use crate::types::ObjectId;

/// Extensions accepted for uploaded images, lowercase.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// URL path prefix under which stored images are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    #[error("Image is required")]
    Empty,
    #[error("Unsupported image type '{0}'")]
    UnsupportedType(String),
    #[error("failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ImageStore {
    directory: PathBuf,
    public_url: String,
}

impl ImageStore {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            directory: directory.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Persist an uploaded image and return the URL it will be served at.
    ///
    /// # Errors
    ///
    /// - `Empty` if `bytes` is empty.
    /// - `UnsupportedType` if `file_name` has no allowed image extension.
    /// - `Io` if the file cannot be written.
    pub async fn store(&self, file_name: Option<&str>, bytes: &[u8]) -> Result<String, ImageStoreError> {
        if bytes.is_empty() {
            return Err(ImageStoreError::Empty);
        }
        let extension = image_extension(file_name)?;

        let stored_name = format!("{}.{extension}", ObjectId::new());
        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(self.directory.join(&stored_name), bytes).await?;

        tracing::debug!("stored image {stored_name} ({} bytes)", bytes.len());
        Ok(format!("{}{UPLOADS_ROUTE}/{stored_name}", self.public_url))
    }

    /// Remove an image previously returned by `store`.
    ///
    /// URLs that do not point into this store are ignored. Failures are
    /// logged and otherwise swallowed.
    pub async fn discard(&self, url: &str) {
        let prefix = format!("{}{UPLOADS_ROUTE}/", self.public_url);
        let Some(stored_name) = url.strip_prefix(&prefix) else {
            return;
        };
        if stored_name.is_empty()
            || stored_name.contains(['/', '\\'])
            || stored_name.starts_with('.')
        {
            return;
        }
        match tokio::fs::remove_file(self.directory.join(stored_name)).await {
            Ok(()) => tracing::debug!("discarded image {stored_name}"),
            Err(e) => tracing::warn!("failed to discard image {stored_name}: {e}"),
        }
    }
}

fn image_extension(file_name: Option<&str>) -> Result<String, ImageStoreError> {
    let name = file_name.unwrap_or_default();
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ImageStoreError::UnsupportedType(name.to_string()))
    }
}
