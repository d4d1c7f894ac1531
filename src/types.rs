//! Core types for bulk-import

use serde::{Deserialize, Serialize};
use url::Url;

/// An object-storage write event, as delivered by the trigger boundary
///
/// The embedding application decodes its transport (HTTP push, pubsub, ...)
/// and hands the decoded event to
/// [`ImportService::handle_event`](crate::ImportService::handle_event).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageEvent {
    /// Object path within the bucket (e.g. `imports/<user id>/URL_LIST-1.csv`)
    pub name: String,
    /// Bucket the object was written to
    pub bucket: String,
    /// MIME type the object was uploaded with
    pub content_type: String,
}

/// One unit of importable work discovered by a parser
#[derive(Clone, Debug)]
pub enum DiscoveredItem {
    /// A bare URL; the downstream pipeline fetches and saves it
    Url(UrlItem),
    /// A URL with full saved content; persisted directly, no re-fetch
    Content(ContentItem),
}

/// A discovered item carrying only a source URL
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlItem {
    /// The URL to fetch and save downstream
    pub url: Url,
}

/// A discovered item carrying full saved content
#[derive(Clone, Debug)]
pub struct ContentItem {
    /// The original source URL
    pub url: Url,
    /// Document title (manifest title, falling back to the extracted one)
    pub title: String,
    /// The raw saved document as found in the archive
    pub raw_content: String,
    /// Structured article representation produced by extraction
    pub parsed: ParsedArticle,
}

/// Structured article representation produced by the content extractor
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedArticle {
    /// Title found in the document, if any
    pub title: Option<String>,
    /// Readable body as HTML
    pub content_html: String,
    /// Readable body as plain text
    pub text: String,
}

/// Final counters of a completed (or fatally ended) import run
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Items successfully dispatched downstream
    pub imported: u32,
    /// Items that failed to parse, resolve, or dispatch
    pub failed: u32,
    /// Whether the run ended early on a fatal fault
    pub fatal: bool,
}

/// Payload of a content-fetch task enqueued for a URL item
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTaskPayload {
    /// Owning user
    pub user_id: String,
    /// Where the URL came from (e.g. `csv-importer`)
    pub source: String,
    /// The URL to fetch
    pub url: String,
    /// Fresh idempotency identifier for this dispatch
    pub request_id: String,
}

/// Payload of a direct save task enqueued for a content item
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePagePayload {
    /// Owning user
    pub user_id: String,
    /// The original source URL
    pub url: String,
    /// Document title
    pub title: String,
    /// The raw saved document
    pub original_content: String,
    /// Readable body as plain text
    pub content: String,
    /// Fresh idempotency identifier for this dispatch
    pub request_id: String,
}

/// Payload of a user email task
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailTaskPayload {
    /// Email subject line
    pub subject: String,
    /// Email body
    pub body: String,
}
