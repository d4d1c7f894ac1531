//! # bulk-import
//!
//! Import dispatch pipeline for bulk link-list and read-it-later archive
//! uploads.
//!
//! A user uploads an export file (a delimited URL list or a ZIP archive
//! bundle) to object storage; the storage write event triggers one import
//! run. The run classifies the file by name, parses it into a lazy sequence
//! of discovered items, dispatches each item into the downstream fetch/save
//! pipeline, and ends with exactly one email summarizing the outcome.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or transport layer; the embedding
//!   application decodes its trigger and calls [`ImportService::handle_event`]
//! - **Per-item isolation** - A malformed row, missing document, or rejected
//!   dispatch fails that item only; the run continues
//! - **Explicit collaborators** - Object storage, the task queue, content
//!   extraction, and both dispatch handlers are traits, wired in at
//!   construction
//!
//! ## Quick Start
//!
//! ```no_run
//! use bulk_import::{ImportConfig, ImportService, StorageEvent};
//! use bulk_import::storage::HttpObjectStore;
//! use bulk_import::tasks::HttpTaskQueue;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = ImportConfig::default();
//!     config.tasks.content_fetch_url = "https://tasks.internal/fetch".into();
//!     config.tasks.save_page_url = "https://tasks.internal/save".into();
//!     config.tasks.email_user_url = "https://tasks.internal/email".into();
//!     config.notify.jwt_secret = Some("signing-secret".into());
//!
//!     let store = Arc::new(HttpObjectStore::new("https://storage.internal"));
//!     let queue = Arc::new(HttpTaskQueue::new(config.tasks.request_timeout));
//!     let service = ImportService::with_default_handlers(config, store, queue)?;
//!
//!     let event = StorageEvent {
//!         name: "imports/user-1/URL_LIST-3f2a.csv".into(),
//!         bucket: "uploads".into(),
//!         content_type: "text/csv".into(),
//!     };
//!     if let Some(outcome) = service.handle_event(&event).await? {
//!         println!("imported {} / failed {}", outcome.imported, outcome.failed);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Upload format classification
pub mod classify;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Readability-style content extraction
pub mod extract;
/// Dispatch context and handler capabilities
pub mod handlers;
/// Terminal run notifications
pub mod notify;
/// Import parsers (URL list, archive bundle)
pub mod parsers;
/// Import orchestration
pub mod service;
/// Object storage read boundary
pub mod storage;
/// Downstream task queue boundary
pub mod tasks;
/// Core types
pub mod types;

// Re-export commonly used types
pub use classify::{ParserKind, classify};
pub use config::{ImportConfig, NotifyConfig, TaskQueueConfig};
pub use error::{Error, ExtractError, ParseError, Result};
pub use extract::{ContentExtractor, ReadabilityExtractor};
pub use handlers::{ContentHandler, ImportContext, UrlHandler};
pub use parsers::{ImportParser, ParseEvent};
pub use service::ImportService;
pub use storage::ObjectStore;
pub use tasks::TaskQueue;
pub use types::{
    ContentItem, DiscoveredItem, ImportOutcome, ParsedArticle, StorageEvent, UrlItem,
};
