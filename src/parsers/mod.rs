//! Import parsers
//!
//! Both upload formats share one contract: a parser is a pure function of
//! its input bytes yielding a lazy, finite, single-pass sequence of
//! discovered items. Per-item problems are yielded inline as
//! [`ParseError::Item`] so the orchestrator can count them without aborting;
//! an unreadable input yields [`ParseError::Fatal`] and ends the sequence.

/// Archive bundle (ZIP + manifest) parser
pub mod archive;
/// Delimited URL list parser
pub mod url_list;

pub use archive::ArchiveBundleParser;
pub use url_list::UrlListParser;

use std::sync::Arc;

use crate::classify::ParserKind;
use crate::error::ParseError;
use crate::extract::ContentExtractor;
use crate::types::DiscoveredItem;

/// One event in a parse sequence: a discovered item or a parse failure
pub type ParseEvent = Result<DiscoveredItem, ParseError>;

/// Common contract for both import parsers
///
/// Implementations must be deterministic over identical input bytes; the
/// returned iterator is consumed exactly once per run. The iterator is
/// `Send` so a run can be driven from a spawned task.
pub trait ImportParser: Send + Sync {
    /// Parse the uploaded bytes into a lazy sequence of discovered items
    fn parse<'a>(&'a self, data: &'a [u8]) -> Box<dyn Iterator<Item = ParseEvent> + Send + 'a>;
}

/// Construct the parser for a classified upload
pub fn parser_for(kind: ParserKind, extractor: Arc<dyn ContentExtractor>) -> Box<dyn ImportParser> {
    match kind {
        ParserKind::UrlList => Box::new(UrlListParser),
        ParserKind::ArchiveBundle => Box::new(ArchiveBundleParser::new(extractor)),
    }
}
