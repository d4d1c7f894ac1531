//! Delimited URL list parser
//!
//! Reads a simple tabular export with one URL per record (first column).
//! The sequence is lazy: records are decoded as the caller advances the
//! iterator, so arbitrarily long lists never sit in memory as rows.

use tracing::trace;
use url::Url;

use super::{ImportParser, ParseEvent};
use crate::error::ParseError;
use crate::types::{DiscoveredItem, UrlItem};

/// Parser for `URL_LIST` exports
pub struct UrlListParser;

impl ImportParser for UrlListParser {
    fn parse<'a>(&'a self, data: &'a [u8]) -> Box<dyn Iterator<Item = ParseEvent> + Send + 'a> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(data);

        // Header detection: a leading record whose URL field is not a URL is
        // treated as a header and skipped silently, not counted as failed.
        let mut first = true;

        Box::new(reader.into_records().filter_map(move |record| {
            let lead = std::mem::replace(&mut first, false);
            match record {
                Err(e) => Some(Err(ParseError::Item {
                    reason: format!("unreadable record: {}", e),
                })),
                Ok(record) => {
                    let field = record.get(0).map(str::trim).unwrap_or_default();
                    if field.is_empty() {
                        return None;
                    }
                    match Url::parse(field) {
                        Ok(url) => {
                            trace!(%url, "discovered URL record");
                            Some(Ok(DiscoveredItem::Url(UrlItem { url })))
                        }
                        Err(_) if lead => {
                            trace!(field, "skipping header record");
                            None
                        }
                        Err(e) => Some(Err(ParseError::Item {
                            reason: format!("invalid URL {:?}: {}", field, e),
                        })),
                    }
                }
            }
        }))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &str) -> Vec<ParseEvent> {
        UrlListParser.parse(input.as_bytes()).collect()
    }

    fn urls(events: &[ParseEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                Ok(DiscoveredItem::Url(item)) => Some(item.url.to_string()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn valid_rows_yield_urls_in_file_order() {
        let events = parse_all("https://a.example/1\nhttps://b.example/2\nhttps://c.example/3\n");
        assert_eq!(events.len(), 3);
        assert_eq!(
            urls(&events),
            vec![
                "https://a.example/1",
                "https://b.example/2",
                "https://c.example/3"
            ]
        );
    }

    #[test]
    fn invalid_url_row_is_a_per_item_failure() {
        // Two good rows and one bad one: the bad row is reported, not fatal
        let events = parse_all("https://a.example/1\nhttps://b.example/2\nnot-a-url\n");
        assert_eq!(urls(&events).len(), 2);
        let failures: Vec<_> = events.iter().filter(|e| e.is_err()).collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            failures[0],
            Err(ParseError::Item { reason }) if reason.contains("not-a-url")
        ));
    }

    #[test]
    fn header_record_is_skipped_without_counting_failed() {
        let events = parse_all("url\nhttps://a.example/1\nhttps://b.example/2\n");
        assert_eq!(events.len(), 2);
        assert_eq!(urls(&events).len(), 2);
    }

    #[test]
    fn a_leading_valid_url_is_not_mistaken_for_a_header() {
        let events = parse_all("https://a.example/1\nhttps://b.example/2\n");
        assert_eq!(urls(&events).len(), 2);
    }

    #[test]
    fn only_the_first_column_is_read() {
        let events = parse_all("https://a.example/1,Some Title,2023-01-01\n");
        assert_eq!(urls(&events), vec!["https://a.example/1"]);
    }

    #[test]
    fn blank_records_are_skipped_silently() {
        let events = parse_all("https://a.example/1\n\n   \nhttps://b.example/2\n");
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.is_ok()));
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_all("").is_empty());
    }

    #[test]
    fn parsing_is_deterministic_over_the_same_bytes() {
        let input = "https://a.example/1\nbad\nhttps://b.example/2\n";
        let first = parse_all(input);
        let second = parse_all(input);
        assert_eq!(urls(&first), urls(&second));
        assert_eq!(
            first.iter().filter(|e| e.is_err()).count(),
            second.iter().filter(|e| e.is_err()).count()
        );
    }
}
