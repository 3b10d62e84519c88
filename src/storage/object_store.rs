//! Object store abstraction for the remote backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A stored object as reported by a prefix listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    /// Full key, including any prefix
    pub pathname: String,
    /// Public URL of the object
    #[serde(default)]
    pub url: String,
    /// Retrieval handle used to fetch the object's content
    pub download_url: String,
}

/// The four primitives the remote backend needs from an object store.
///
/// There is no "get by key": readers list by prefix and fetch through the
/// returned handle.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// All objects whose key starts with `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>>;

    /// Fetch an object's content through its retrieval handle
    async fn fetch(&self, object: &BlobObject) -> Result<String>;

    /// Create or overwrite an object
    async fn put(&self, pathname: &str, content: String) -> Result<()>;

    /// Remove an object
    async fn delete(&self, pathname: &str) -> Result<()>;
}

/// Page of a blob listing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    blobs: Vec<BlobObject>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    has_more: bool,
}

/// Client for a bearer-token blob HTTP API
pub struct HttpBlobStore {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpBlobStore {
    /// Creates a new blob store client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, e.g. `https://blob.vercel-storage.com`
    /// * `token` - read/write token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn object_url(&self, pathname: &str) -> String {
        format!("{}/{}", self.base_url, pathname.trim_start_matches('/'))
    }
}

/// Turn a non-success response into an error carrying the body text
async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(Error::not_found(what));
    }
    Err(Error::remote(format!("{} failed with {}: {}", what, status, body)))
}

#[async_trait]
impl ObjectStore for HttpBlobStore {
    async fn list(&self, prefix: &str) -> Result<Vec<BlobObject>> {
        let mut blobs = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&self.base_url)
                .bearer_auth(&self.token)
                .query(&[("prefix", prefix)]);
            if let Some(cursor) = &cursor {
                request = request.query(&[("cursor", cursor.as_str())]);
            }

            let response = check(request.send().await?, "list blobs").await?;
            let page: ListPage = response.json().await?;
            blobs.extend(page.blobs);

            match page.cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }

        Ok(blobs)
    }

    async fn fetch(&self, object: &BlobObject) -> Result<String> {
        let response = self.client.get(&object.download_url).send().await?;
        let response = check(response, &object.pathname).await?;
        Ok(response.text().await?)
    }

    async fn put(&self, pathname: &str, content: String) -> Result<()> {
        let response = self
            .client
            .put(self.object_url(pathname))
            .bearer_auth(&self.token)
            .header("x-content-type", "text/markdown")
            .header("x-add-random-suffix", "0")
            .header("x-allow-overwrite", "1")
            .body(content)
            .send()
            .await?;
        check(response, &format!("put {}", pathname)).await?;
        Ok(())
    }

    async fn delete(&self, pathname: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/delete", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "urls": [pathname] }))
            .send()
            .await?;
        check(response, &format!("delete {}", pathname)).await?;
        Ok(())
    }
}
