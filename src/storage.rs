//! Object storage read boundary
//!
//! The import pipeline only ever reads the uploaded object; writes and
//! lifecycle belong to the uploading side. A read failure is a fatal fault
//! for the run.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};

/// Collaborator seam for reading uploaded objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full contents of one stored object
    ///
    /// # Errors
    /// Returns [`Error::Storage`] if the object cannot be read; the
    /// orchestrator treats this as a fatal fault for the run.
    async fn fetch(&self, bucket: &str, name: &str) -> Result<Vec<u8>>;
}

/// HTTP-backed object store client (`{base_url}/{bucket}/{name}`)
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpObjectStore {
    /// Create a store client for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn fetch(&self, bucket: &str, name: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            bucket,
            name
        );
        debug!(%url, "fetching uploaded object");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Storage(format!(
                "fetching {} returned status {}",
                url, status
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
