//! Downstream task queue boundary
//!
//! Every downstream effect of a run — content fetches, direct saves, the
//! terminal email — goes through one enqueue seam. The default
//! implementation POSTs the task payload to the target endpoint; delivery
//! beyond a successful enqueue is the queue's contract, not ours.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Collaborator seam for enqueueing downstream tasks
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueue one task
    ///
    /// Returns the queue's task id when the queue reports one.
    ///
    /// # Errors
    /// Returns an error if the task could not be accepted by the queue; the
    /// caller decides whether that fails an item or the whole run.
    async fn enqueue(
        &self,
        target: &str,
        payload: serde_json::Value,
        headers: Option<HeaderMap>,
    ) -> Result<Option<String>>;
}

/// Shape of the queue's enqueue response, when it returns one
#[derive(Debug, Deserialize)]
struct EnqueueResponse {
    #[serde(rename = "taskId")]
    task_id: Option<String>,
}

/// HTTP-backed task queue client
pub struct HttpTaskQueue {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTaskQueue {
    /// Create a queue client with the given per-request timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl TaskQueue for HttpTaskQueue {
    async fn enqueue(
        &self,
        target: &str,
        payload: serde_json::Value,
        headers: Option<HeaderMap>,
    ) -> Result<Option<String>> {
        let mut request = self
            .client
            .post(target)
            .json(&payload)
            .timeout(self.timeout);
        if let Some(headers) = headers {
            request = request.headers(headers);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(target, %status, "task enqueue rejected");
            return Err(Error::TaskQueue(format!(
                "enqueue to {} returned status {}: {}",
                target, status, body
            )));
        }

        // Task id is optional; queues that respond with an empty body are fine
        let task_id = response
            .json::<EnqueueResponse>()
            .await
            .ok()
            .and_then(|r| r.task_id);
        debug!(target, ?task_id, "task enqueued");
        Ok(task_id)
    }
}
