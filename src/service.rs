//! Import orchestration
//!
//! One run per qualifying storage event: classify the upload, fetch its
//! bytes, walk the parsed item sequence dispatching each item to the
//! matching handler, then send exactly one terminal email. The run is a
//! single linear traversal — counters are only read for the notification
//! after every handler call has settled, and nothing is retried, so the
//! exactly-once notification invariant holds by construction.

use regex::Regex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::classify::{ParserKind, classify};
use crate::config::ImportConfig;
use crate::error::{Error, ParseError, Result};
use crate::extract::{ContentExtractor, ReadabilityExtractor};
use crate::handlers::{
    ContentHandler, FetchTaskUrlHandler, ImportContext, SavePageContentHandler, UrlHandler,
};
use crate::notify::Notifier;
use crate::parsers::parser_for;
use crate::storage::ObjectStore;
use crate::tasks::TaskQueue;
use crate::types::{DiscoveredItem, ImportOutcome, StorageEvent};

/// Storage path prefix that marks an object as an import upload
pub const IMPORT_PATH_PREFIX: &str = "imports/";

/// Content types accepted by the trigger boundary
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &["text/csv", "application/zip"];

/// More than this many imported items counts as a successful run
const FAILURE_THRESHOLD: u32 = 1;

/// Top-level driver of the import dispatch pipeline
pub struct ImportService {
    store: Arc<dyn ObjectStore>,
    url_handler: Arc<dyn UrlHandler>,
    content_handler: Arc<dyn ContentHandler>,
    extractor: Arc<dyn ContentExtractor>,
    notifier: Notifier,
    user_id_pattern: Regex,
}

impl ImportService {
    /// Create a service with explicit handler capabilities
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the configuration is incomplete — most
    /// notably a missing notification signing secret, which is a deployment
    /// error and must not surface mid-run.
    pub fn new(
        config: ImportConfig,
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn TaskQueue>,
        url_handler: Arc<dyn UrlHandler>,
        content_handler: Arc<dyn ContentHandler>,
    ) -> Result<Self> {
        config.validate()?;
        let notifier = Notifier::new(queue, &config)?;
        let user_id_pattern = Regex::new(r"^imports/([^/]+)/")
            .map_err(|e| Error::Other(format!("invalid user id pattern: {}", e)))?;

        Ok(Self {
            store,
            url_handler,
            content_handler,
            extractor: Arc::new(ReadabilityExtractor),
            notifier,
            user_id_pattern,
        })
    }

    /// Create a service wired to the default task-enqueueing handlers
    pub fn with_default_handlers(
        config: ImportConfig,
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn TaskQueue>,
    ) -> Result<Self> {
        let url_handler = Arc::new(FetchTaskUrlHandler::new(
            queue.clone(),
            config.tasks.content_fetch_url.clone(),
        ));
        let content_handler = Arc::new(SavePageContentHandler::new(
            queue.clone(),
            config.tasks.save_page_url.clone(),
        ));
        Self::new(config, store, queue, url_handler, content_handler)
    }

    /// Replace the content-extraction collaborator
    pub fn with_extractor(mut self, extractor: Arc<dyn ContentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Process one object-storage write event
    ///
    /// Events that do not qualify (wrong path prefix, unaccepted content
    /// type, unknown file name pattern, no extractable user id) are ignored
    /// silently and return `Ok(None)` with no side effects.
    ///
    /// For qualifying events the run proceeds to completion or fatal fault
    /// and always sends exactly one terminal email; the returned outcome
    /// carries the final counters.
    ///
    /// # Errors
    /// Returns an error only for faults outside the run's own accounting,
    /// e.g. the notification enqueue itself failing.
    pub async fn handle_event(&self, event: &StorageEvent) -> Result<Option<ImportOutcome>> {
        if !self.should_handle(event) {
            debug!(name = %event.name, content_type = %event.content_type, "ignoring storage event");
            return Ok(None);
        }
        let Some(kind) = classify(&event.name) else {
            debug!(name = %event.name, "no parser for file, ignoring");
            return Ok(None);
        };
        let Some(user_id) = self.user_id_from_path(&event.name) else {
            debug!(name = %event.name, "could not extract user id, ignoring");
            return Ok(None);
        };

        info!(user = %user_id, name = %event.name, ?kind, "starting import run");
        let mut ctx = ImportContext::new(user_id);

        // The run has reached parsing: from here on exactly one terminal
        // email is owed, whatever happens.
        let fatal = match self.store.fetch(&event.bucket, &event.name).await {
            Ok(data) => self.dispatch_items(&mut ctx, kind, &data).await,
            Err(e) => {
                error!(name = %event.name, error = %e, "failed to read uploaded object");
                true
            }
        };

        // Every dispatched handler call has settled; counters are final
        let outcome = ImportOutcome {
            imported: ctx.imported,
            failed: ctx.failed,
            fatal,
        };
        if outcome.imported <= FAILURE_THRESHOLD {
            self.notifier.send_failed(&ctx.user_id).await?;
        } else {
            self.notifier
                .send_completed(&ctx.user_id, outcome.imported, outcome.failed)
                .await?;
        }

        info!(
            user = %ctx.user_id,
            imported = outcome.imported,
            failed = outcome.failed,
            fatal = outcome.fatal,
            "import run finished"
        );
        Ok(Some(outcome))
    }

    /// Walk the parse sequence, dispatching items and counting outcomes
    ///
    /// Returns whether the sequence ended on a fatal fault. Dispatch is
    /// sequential, so by the time this returns every handler call has
    /// settled.
    async fn dispatch_items(
        &self,
        ctx: &mut ImportContext,
        kind: ParserKind,
        data: &[u8],
    ) -> bool {
        let parser = parser_for(kind, self.extractor.clone());
        for item in parser.parse(data) {
            match item {
                Ok(DiscoveredItem::Url(item)) => {
                    match self.url_handler.handle(ctx, &item.url).await {
                        Ok(()) => ctx.imported += 1,
                        Err(e) => {
                            warn!(url = %item.url, error = %e, "URL dispatch failed");
                            ctx.failed += 1;
                        }
                    }
                }
                Ok(DiscoveredItem::Content(item)) => {
                    match self.content_handler.handle(ctx, &item).await {
                        Ok(()) => ctx.imported += 1,
                        Err(e) => {
                            warn!(url = %item.url, error = %e, "content dispatch failed");
                            ctx.failed += 1;
                        }
                    }
                }
                Err(ParseError::Item { reason }) => {
                    warn!(%reason, "skipping item");
                    ctx.failed += 1;
                }
                Err(ParseError::Fatal { reason }) => {
                    error!(%reason, "import run ended on a fatal parse fault");
                    return true;
                }
            }
        }
        false
    }

    /// Trigger-acceptance predicate: path prefix plus accepted content type
    fn should_handle(&self, event: &StorageEvent) -> bool {
        event.name.starts_with(IMPORT_PATH_PREFIX)
            && ACCEPTED_CONTENT_TYPES.contains(&event.content_type.to_lowercase().as_str())
    }

    /// Extract the owning user id from `imports/{user_id}/...`
    fn user_id_from_path(&self, name: &str) -> Option<String> {
        self.user_id_pattern
            .captures(name)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|id| !id.is_empty())
    }
}
