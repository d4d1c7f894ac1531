//! Archive bundle parser
//!
//! An archive bundle is a ZIP container holding a manifest (`_history.csv`)
//! plus one saved HTML document per item. Archive entry order is not
//! guaranteed — the manifest may appear before or after the documents it
//! references — so the parser indexes every entry first and resolves
//! manifest rows against the index afterwards (deferred resolution keyed by
//! archive path, bounded by the archive size).
//!
//! Per-entry problems (bad URL, missing or orphaned document, extraction
//! failure) are yielded as per-item failures. Only an unreadable container
//! or manifest is fatal; items resolved before the fault still stand.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::{ImportParser, ParseEvent};
use crate::error::ParseError;
use crate::extract::ContentExtractor;
use crate::types::{ContentItem, DiscoveredItem, UrlItem};

/// File name of the manifest entry inside an archive bundle
pub const MANIFEST_FILE_NAME: &str = "_history.csv";

/// One manifest row, correlating a source URL to its saved document
#[derive(Debug, Deserialize)]
struct ManifestRow {
    url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    saved_at: Option<String>,
    #[serde(default)]
    content_file: Option<String>,
}

/// A manifest row with its fields normalized for resolution
#[derive(Debug)]
struct ManifestEntry {
    url: Url,
    title: Option<String>,
    saved_at: Option<DateTime<Utc>>,
    content_path: Option<String>,
}

/// Parser for `ARCHIVE` bundle exports
pub struct ArchiveBundleParser {
    extractor: Arc<dyn ContentExtractor>,
}

impl ArchiveBundleParser {
    /// Create a parser using the given content-extraction collaborator
    pub fn new(extractor: Arc<dyn ContentExtractor>) -> Self {
        Self { extractor }
    }

    /// Index the archive and resolve manifest rows against it
    ///
    /// Returns the full event sequence for the run. A fatal fault stops the
    /// indexing pass; whatever was indexed before it is still resolved, and
    /// the fault is appended as the final event.
    fn scan(&self, data: &[u8]) -> Vec<ParseEvent> {
        let mut archive = match zip::ZipArchive::new(Cursor::new(data)) {
            Ok(archive) => archive,
            Err(e) => {
                return vec![Err(ParseError::Fatal {
                    reason: format!("unreadable archive: {}", e),
                })];
            }
        };

        let mut rows: Vec<Result<ManifestRow, String>> = Vec::new();
        let mut manifest_seen = false;
        let mut documents: HashMap<String, Result<String, String>> = HashMap::new();
        let mut fatal: Option<ParseError> = None;

        for index in 0..archive.len() {
            let mut entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(e) => {
                    fatal = Some(ParseError::Fatal {
                        reason: format!("unreadable archive entry {}: {}", index, e),
                    });
                    break;
                }
            };
            if entry.is_dir() {
                continue;
            }

            let path = entry.name().to_string();
            if is_manifest(&path) {
                let mut raw = String::new();
                if let Err(e) = entry.read_to_string(&mut raw) {
                    fatal = Some(ParseError::Fatal {
                        reason: format!("unreadable manifest {}: {}", path, e),
                    });
                    break;
                }
                manifest_seen = true;
                rows.extend(read_manifest(&raw));
            } else if is_document(&path) {
                // An undecodable document fails only the rows that
                // reference it; indexing continues.
                let mut raw = String::new();
                match entry.read_to_string(&mut raw) {
                    Ok(_) => {
                        documents.insert(path, Ok(raw));
                    }
                    Err(e) => {
                        warn!(%path, error = %e, "undecodable document");
                        documents.insert(path, Err(e.to_string()));
                    }
                }
            }
            // Entries matching neither pattern are ignored
        }

        if !manifest_seen && fatal.is_none() && !documents.is_empty() {
            warn!(documents = documents.len(), "archive has no manifest");
        }

        let mut events = self.resolve(rows, &documents, fatal.is_none());
        if let Some(fault) = fatal {
            events.push(Err(fault));
        }
        events
    }

    /// Resolve manifest rows against the indexed documents
    fn resolve(
        &self,
        rows: Vec<Result<ManifestRow, String>>,
        documents: &HashMap<String, Result<String, String>>,
        complete: bool,
    ) -> Vec<ParseEvent> {
        let mut events = Vec::new();
        let mut referenced: HashSet<String> = HashSet::new();

        for row in &rows {
            let row = match row {
                Ok(row) => row,
                Err(reason) => {
                    events.push(Err(ParseError::Item {
                        reason: format!("bad manifest row: {}", reason),
                    }));
                    continue;
                }
            };

            let entry = match normalize(row) {
                Ok(entry) => entry,
                Err(e) => {
                    events.push(Err(e));
                    continue;
                }
            };
            debug!(url = %entry.url, saved_at = ?entry.saved_at, "resolving manifest entry");

            match &entry.content_path {
                // URL-only rows are complete as they stand
                None => events.push(Ok(DiscoveredItem::Url(UrlItem { url: entry.url }))),
                Some(path) => {
                    referenced.insert(path.clone());
                    match documents.get(path) {
                        None => events.push(Err(ParseError::Item {
                            reason: format!("content file {} missing from archive", path),
                        })),
                        Some(Err(reason)) => events.push(Err(ParseError::Item {
                            reason: format!("content file {} unreadable: {}", path, reason),
                        })),
                        Some(Ok(raw)) => match self.extractor.extract(&entry.url, raw) {
                            Ok(parsed) => {
                                let title = entry
                                    .title
                                    .clone()
                                    .or_else(|| parsed.title.clone())
                                    .unwrap_or_else(|| entry.url.to_string());
                                events.push(Ok(DiscoveredItem::Content(ContentItem {
                                    url: entry.url,
                                    title,
                                    raw_content: raw.clone(),
                                    parsed,
                                })));
                            }
                            Err(e) => events.push(Err(ParseError::Item {
                                reason: format!("extraction failed for {}: {}", path, e),
                            })),
                        },
                    }
                }
            }
        }

        // Orphaned documents only count once the whole archive was walked;
        // after a fatal fault the manifest rows referencing them may simply
        // not have been reached.
        if complete {
            let mut orphans: Vec<&String> = documents
                .keys()
                .filter(|path| !referenced.contains(*path))
                .collect();
            orphans.sort();
            for path in orphans {
                events.push(Err(ParseError::Item {
                    reason: format!("document {} not referenced by any manifest entry", path),
                }));
            }
        }

        events
    }
}

impl ImportParser for ArchiveBundleParser {
    fn parse<'a>(&'a self, data: &'a [u8]) -> Box<dyn Iterator<Item = ParseEvent> + Send + 'a> {
        Box::new(self.scan(data).into_iter())
    }
}

/// Validate and normalize one manifest row
fn normalize(row: &ManifestRow) -> Result<ManifestEntry, ParseError> {
    let url = Url::parse(row.url.trim()).map_err(|e| ParseError::Item {
        reason: format!("invalid manifest URL {:?}: {}", row.url, e),
    })?;

    // Timestamps are informational; a malformed one does not fail the row
    let saved_at = row
        .saved_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(ManifestEntry {
        url,
        title: row.title.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(String::from),
        saved_at,
        content_path: row
            .content_file
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from),
    })
}

/// Decode manifest CSV rows, keeping row-level errors for later accounting
fn read_manifest(raw: &str) -> Vec<Result<ManifestRow, String>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes())
        .into_deserialize::<ManifestRow>()
        .map(|row| row.map_err(|e| e.to_string()))
        .collect()
}

fn is_manifest(path: &str) -> bool {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == MANIFEST_FILE_NAME)
}

fn is_document(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}
