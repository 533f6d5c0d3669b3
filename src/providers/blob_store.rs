//! Blob storage for original manual PDFs
//!
//! Two implementations: a filesystem store for local deployments and an
//! HTTP media-store client for hosted object storage. Both return a durable
//! URI plus an opaque deletion handle.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::BlobStoreConfig;
use crate::error::{Error, Result};

/// A stored blob: its durable URI and deletion handle.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub uri: String,
    pub public_id: String,
}

/// Blob storage provider.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a file under the given public id, returning its URI and
    /// deletion handle.
    async fn store(&self, public_id: &str, data: &[u8]) -> Result<StoredBlob>;

    /// Delete a blob by its deletion handle. Returns false when the blob
    /// was already gone.
    async fn delete(&self, public_id: &str) -> Result<bool>;

    /// Whether the store is reachable.
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

/// Build the configured blob store: HTTP when a URL is set, filesystem
/// otherwise.
pub fn from_config(config: &BlobStoreConfig) -> Box<dyn BlobStore> {
    match config.url {
        Some(ref url) => Box::new(HttpBlobStore::new(url, config.api_key.clone())),
        None => Box::new(LocalBlobStore::new(config.root.clone())),
    }
}

/// Filesystem-backed blob store.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, public_id: &str) -> PathBuf {
        // Public ids may contain separators; keep them inside the root.
        let sanitized: String = public_id
            .chars()
            .map(|c| if c == '/' || c == '\\' || c == ':' { '_' } else { c })
            .collect();
        self.root.join(sanitized)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn store(&self, public_id: &str, data: &[u8]) -> Result<StoredBlob> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| Error::storage(format!("Failed to create blob root: {e}")))?;

        let path = self.path_for(public_id);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| Error::storage(format!("Failed to write blob: {e}")))?;

        Ok(StoredBlob {
            uri: format!("file://{}", path.display()),
            public_id: public_id.to_string(),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<bool> {
        let path = self.path_for(public_id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage(format!("Failed to delete blob: {e}"))),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "local-fs"
    }
}

#[derive(Deserialize)]
struct UploadReply {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct DestroyReply {
    result: String,
}

/// HTTP media-store client: multipart upload, delete by public id.
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpBlobStore {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn store(&self, public_id: &str, data: &[u8]) -> Result<StoredBlob> {
        let url = format!("{}/upload", self.base_url);
        let form = reqwest::multipart::Form::new()
            .text("public_id", public_id.to_string())
            .text("resource_type", "raw")
            .part(
                "file",
                reqwest::multipart::Part::bytes(data.to_vec()).file_name(public_id.to_string()),
            );

        let response = self
            .authorized(self.client.post(&url).multipart(form))
            .send()
            .await
            .map_err(|e| Error::storage(format!("Blob upload request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::storage(format!(
                "Blob upload failed: HTTP {status} - {body}"
            )));
        }

        let reply: UploadReply = response
            .json()
            .await
            .map_err(|e| Error::storage(format!("Failed to parse upload reply: {e}")))?;

        Ok(StoredBlob {
            uri: reply.secure_url,
            public_id: reply.public_id,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<bool> {
        let url = format!("{}/destroy", self.base_url);
        let response = self
            .authorized(self.client.post(&url).json(&serde_json::json!({
                "public_id": public_id,
                "resource_type": "raw",
            })))
            .send()
            .await
            .map_err(|e| Error::storage(format!("Blob delete request failed: {e}")))?;

        if !response.status().is_success() {
            return Ok(false);
        }

        let reply: DestroyReply = response
            .json()
            .await
            .map_err(|e| Error::storage(format!("Failed to parse destroy reply: {e}")))?;

        Ok(reply.result == "ok")
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.get(&self.base_url).send().await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "http-media"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_path_buf());

        let blob = store
            .store("Acme_Widget_manual.pdf", b"%PDF-1.4 test")
            .await
            .unwrap();
        assert!(blob.uri.starts_with("file://"));
        assert_eq!(blob.public_id, "Acme_Widget_manual.pdf");

        assert!(store.delete(&blob.public_id).await.unwrap());
        assert!(!store.delete(&blob.public_id).await.unwrap());
    }

    #[tokio::test]
    async fn local_store_sanitizes_separators() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_path_buf());

        let blob = store.store("pdf_manuals/acme.pdf", b"data").await.unwrap();
        assert!(!blob.uri.contains("pdf_manuals/"));
        assert!(store.delete("pdf_manuals/acme.pdf").await.unwrap());
    }
}
