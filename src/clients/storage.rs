use crate::clients::rest::error_message;
use crate::storage::{ObjectStorage, StorageError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

/// Object storage of the hosted data service (`/storage/v1/object`).
#[derive(Debug, Clone)]
pub struct RemoteStorage {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RemoteStorage {
    #[must_use]
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            urlencoding::encode(bucket),
            urlencoding::encode(path)
        )
    }
}

#[async_trait]
impl ObjectStorage for RemoteStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if bucket.is_empty() || path.is_empty() || path.contains("..") {
            return Err(StorageError::InvalidPath(format!("{bucket}/{path}")));
        }

        let size = bytes.len();
        let response = self
            .client
            .post(self.object_url(bucket, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        info!(bucket, path, size, "Uploaded object");
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            urlencoding::encode(bucket),
            urlencoding::encode(path)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url() {
        let storage = RemoteStorage::new(Client::new(), "https://project.example.co/", "anon");
        assert_eq!(
            storage.public_url("images", "17-gel cell.png"),
            "https://project.example.co/storage/v1/object/public/images/17-gel%20cell.png"
        );
    }

    #[tokio::test]
    async fn test_rejects_parent_paths() {
        let storage = RemoteStorage::new(Client::new(), "https://project.example.co", "anon");
        let err = storage
            .upload("images", "../x.png", Vec::new(), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }
}
