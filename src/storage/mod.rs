//! Object storage for catalog images and data sheets.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` at `bucket/path`, replacing nothing: an existing object is an error.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Files under a local directory, served by the HTTP layer at `public_base_url`.
pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(bucket).join(path);
        let clean = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !clean || bucket.is_empty() || path.is_empty() {
            return Err(StorageError::InvalidPath(format!("{bucket}/{path}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let target = self.object_path(bucket, path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let size = bytes.len();
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        info!(
            path = %target.display(),
            size,
            content_type,
            "Stored object"
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, bucket, path)
    }
}

/// Object name for an uploaded file: `{unix_millis}-{sanitized name}`.
#[must_use]
pub fn object_name(file_name: &str) -> String {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let sanitized = if sanitized.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        sanitized
    };

    format!("{}-{}", chrono::Utc::now().timestamp_millis(), sanitized)
}
