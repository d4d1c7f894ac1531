//! Dispatch context and handler capabilities
//!
//! Handlers are the seam between this crate and the downstream fetch/save
//! system. The orchestrator invokes exactly one handler per discovered item
//! and owns the accounting: a handler `Ok` counts the item as imported, a
//! handler `Err` counts it as failed and the run continues.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::Result;
use crate::tasks::TaskQueue;
use crate::types::{ContentItem, FetchTaskPayload, SavePagePayload};

/// Source tag attached to every dispatched fetch/save task
pub const IMPORT_SOURCE: &str = "csv-importer";

/// Shared state of one import run
///
/// Counters are zeroed at construction, mutated only by the orchestrator
/// loop, and discarded once the terminal notification is sent. Within a run
/// they only ever increase, and `imported + failed` never exceeds the number
/// of items discovered.
#[derive(Clone, Debug)]
pub struct ImportContext {
    /// The user who uploaded the file
    pub user_id: String,
    /// Items successfully dispatched downstream
    pub imported: u32,
    /// Items that failed to parse, resolve, or dispatch
    pub failed: u32,
}

impl ImportContext {
    /// Create the context for a fresh run, counters zeroed
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            imported: 0,
            failed: 0,
        }
    }
}

/// Handler capability for URL-only items
#[async_trait]
pub trait UrlHandler: Send + Sync {
    /// Dispatch one URL downstream
    ///
    /// # Errors
    /// An error fails this item only; the orchestrator logs it, counts it,
    /// and moves on.
    async fn handle(&self, ctx: &ImportContext, url: &Url) -> Result<()>;
}

/// Handler capability for full-content items
#[async_trait]
pub trait ContentHandler: Send + Sync {
    /// Persist one already-extracted item downstream
    ///
    /// # Errors
    /// An error fails this item only; the orchestrator logs it, counts it,
    /// and moves on.
    async fn handle(&self, ctx: &ImportContext, item: &ContentItem) -> Result<()>;
}

/// Default URL handler: enqueues a content-fetch task
///
/// Each dispatch carries a freshly generated request id so the downstream
/// pipeline can deduplicate redelivered tasks.
pub struct FetchTaskUrlHandler {
    queue: Arc<dyn TaskQueue>,
    content_fetch_url: String,
}

impl FetchTaskUrlHandler {
    /// Create a handler targeting the given content-fetch endpoint
    pub fn new(queue: Arc<dyn TaskQueue>, content_fetch_url: impl Into<String>) -> Self {
        Self {
            queue,
            content_fetch_url: content_fetch_url.into(),
        }
    }
}

#[async_trait]
impl UrlHandler for FetchTaskUrlHandler {
    async fn handle(&self, ctx: &ImportContext, url: &Url) -> Result<()> {
        let payload = FetchTaskPayload {
            user_id: ctx.user_id.clone(),
            source: IMPORT_SOURCE.to_string(),
            url: url.to_string(),
            request_id: Uuid::new_v4().to_string(),
        };
        let task_id = self
            .queue
            .enqueue(
                &self.content_fetch_url,
                serde_json::to_value(&payload)?,
                None,
            )
            .await?;
        debug!(url = %url, ?task_id, "fetch task enqueued");
        Ok(())
    }
}

/// Default content handler: enqueues a direct save task
///
/// The content was already extracted from the archive, so the downstream
/// pipeline persists it as-is instead of re-fetching the page.
pub struct SavePageContentHandler {
    queue: Arc<dyn TaskQueue>,
    save_page_url: String,
}

impl SavePageContentHandler {
    /// Create a handler targeting the given save endpoint
    pub fn new(queue: Arc<dyn TaskQueue>, save_page_url: impl Into<String>) -> Self {
        Self {
            queue,
            save_page_url: save_page_url.into(),
        }
    }
}

#[async_trait]
impl ContentHandler for SavePageContentHandler {
    async fn handle(&self, ctx: &ImportContext, item: &ContentItem) -> Result<()> {
        let payload = SavePagePayload {
            user_id: ctx.user_id.clone(),
            url: item.url.to_string(),
            title: item.title.clone(),
            original_content: item.raw_content.clone(),
            content: item.parsed.text.clone(),
            request_id: Uuid::new_v4().to_string(),
        };
        let task_id = self
            .queue
            .enqueue(&self.save_page_url, serde_json::to_value(&payload)?, None)
            .await?;
        debug!(url = %item.url, ?task_id, "save task enqueued");
        Ok(())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParsedArticle;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use crate::tasks::HttpTaskQueue;
    use std::time::Duration;

    fn queue_for(server: &MockServer) -> (Arc<dyn TaskQueue>, String) {
        let queue: Arc<dyn TaskQueue> = Arc::new(HttpTaskQueue::new(Duration::from_secs(5)));
        (queue, server.uri())
    }

    #[tokio::test]
    async fn url_handler_enqueues_fetch_task_with_fresh_request_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fetch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"taskId": "t1"})))
            .expect(2)
            .mount(&server)
            .await;

        let (queue, base) = queue_for(&server);
        let handler = FetchTaskUrlHandler::new(queue, format!("{}/fetch", base));
        let ctx = ImportContext::new("user-1");
        let url = Url::parse("https://example.com/a").unwrap();

        handler.handle(&ctx, &url).await.unwrap();
        handler.handle(&ctx, &url).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let bodies: Vec<serde_json::Value> = requests
            .iter()
            .map(|r: &Request| serde_json::from_slice(&r.body).unwrap())
            .collect();
        assert_eq!(bodies[0]["userId"], "user-1");
        assert_eq!(bodies[0]["source"], IMPORT_SOURCE);
        assert_eq!(bodies[0]["url"], "https://example.com/a");
        // Each dispatch carries its own request id
        assert_ne!(bodies[0]["requestId"], bodies[1]["requestId"]);
    }

    #[tokio::test]
    async fn url_handler_surfaces_enqueue_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/fetch"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (queue, base) = queue_for(&server);
        let handler = FetchTaskUrlHandler::new(queue, format!("{}/fetch", base));
        let ctx = ImportContext::new("user-1");
        let url = Url::parse("https://example.com/a").unwrap();

        assert!(handler.handle(&ctx, &url).await.is_err());
    }

    #[tokio::test]
    async fn content_handler_ships_the_extracted_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/save"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (queue, base) = queue_for(&server);
        let handler = SavePageContentHandler::new(queue, format!("{}/save", base));
        let ctx = ImportContext::new("user-1");
        let item = ContentItem {
            url: Url::parse("https://example.com/a").unwrap(),
            title: "Saved A".to_string(),
            raw_content: "<html><body><p>hi</p></body></html>".to_string(),
            parsed: ParsedArticle {
                title: Some("Saved A".to_string()),
                content_html: "<p>hi</p>".to_string(),
                text: "hi".to_string(),
            },
        };

        handler.handle(&ctx, &item).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["title"], "Saved A");
        assert_eq!(body["content"], "hi");
        assert_eq!(body["originalContent"], item.raw_content);
    }
}
