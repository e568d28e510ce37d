//! Publishing packaged boxes to the artifact store.

use std::path::Path;

use async_trait::async_trait;
use boxes_core::error::{BoxError, Result};
use boxes_core::naming;
use boxes_core::StoreConfig;
use chrono::{DateTime, Local};

/// Header carrying the source key of a server-side copy.
const COPY_SOURCE_HEADER: &str = "x-amz-copy-source";

/// Remote object store the runtime publishes into.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload a local file under `key`.
    async fn put(&self, local: &Path, key: &str) -> Result<()>;

    /// Create or replace `alias` so that it points at `key`.
    async fn alias(&self, key: &str, alias: &str) -> Result<()>;
}

/// Artifact store reached over HTTP.
///
/// Uploads are `PUT {endpoint}/{key}` with the file streamed as the body;
/// aliases are `PUT {endpoint}/{alias}` with a server-side copy header.
pub struct HttpArtifactStore {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpArtifactStore {
    /// Create a client for the configured endpoint.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(|e| e.trim().trim_end_matches('/'))
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                BoxError::ConfigError("No artifact store endpoint configured (store.endpoint)".to_string())
            })?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            token: config.resolved_token(),
        })
    }

    /// Full URL of an object key.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.endpoint, key.trim_start_matches('/'))
    }

    fn request(&self, key: &str) -> reqwest::RequestBuilder {
        let builder = self.client.put(self.object_url(key));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, key: &str, builder: reqwest::RequestBuilder) -> Result<()> {
        let response = builder.send().await.map_err(|e| BoxError::StoreError {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BoxError::StoreError {
                key: key.to_string(),
                message: format!("{status} {}", body.trim()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn put(&self, local: &Path, key: &str) -> Result<()> {
        let file = tokio::fs::File::open(local).await?;
        let size = file.metadata().await?.len();

        let builder = self
            .request(key)
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(reqwest::Body::from(file));
        self.send(key, builder).await?;

        tracing::debug!(key, size, "Object uploaded");
        Ok(())
    }

    async fn alias(&self, key: &str, alias: &str) -> Result<()> {
        let builder = self
            .request(alias)
            .header(COPY_SOURCE_HEADER, format!("/{}", key.trim_start_matches('/')))
            .header(reqwest::header::CONTENT_LENGTH, 0u64)
            .body(Vec::new());
        self.send(alias, builder).await?;

        tracing::debug!(key, alias, "Alias updated");
        Ok(())
    }
}

/// Hands packaged boxes to the artifact store.
pub struct Publisher<'a> {
    store: &'a dyn ArtifactStore,
}

impl<'a> Publisher<'a> {
    pub fn new(store: &'a dyn ArtifactStore) -> Self {
        Self { store }
    }

    /// Upload under a key stamped with the current local time and repoint
    /// the latest alias at it. Returns the timestamped key.
    pub async fn publish(&self, box_name: &str, archive: &Path) -> Result<String> {
        self.publish_at(box_name, archive, &Local::now()).await
    }

    /// Same as [`Publisher::publish`] with an explicit timestamp.
    ///
    /// A failed alias update is returned as an error, but the uploaded
    /// object stays published.
    pub async fn publish_at(
        &self,
        box_name: &str,
        archive: &Path,
        at: &DateTime<Local>,
    ) -> Result<String> {
        let key = naming::timestamped_key(box_name, at);
        let alias = naming::latest_alias(box_name);

        println!("Uploading {} to {}", archive.display(), key);
        self.store.put(archive, &key).await?;
        tracing::info!(box_name, key = %key, "Box uploaded");

        if let Err(e) = self.store.alias(&key, &alias).await {
            tracing::error!(key = %key, alias = %alias, error = %e, "Uploaded box but could not update latest alias");
            return Err(e);
        }
        tracing::info!(key = %key, alias = %alias, "Latest alias updated");

        Ok(key)
    }
}
