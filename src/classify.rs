//! Upload format classification
//!
//! Maps an uploaded file name to the parser that understands it. Purely a
//! naming convention: the directory and extension are stripped and the
//! remaining stem is matched against known prefixes.

use std::path::Path;

/// File-name prefix that selects the archive bundle parser
pub const ARCHIVE_PREFIX: &str = "ARCHIVE";

/// File-name prefix that selects the delimited URL list parser
pub const URL_LIST_PREFIX: &str = "URL_LIST";

/// The parser selected for an uploaded file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserKind {
    /// Compressed container with a manifest plus per-item documents
    ArchiveBundle,
    /// Tabular export with one URL per record
    UrlList,
}

/// Select a parser for an uploaded file name
///
/// Returns `None` for unsupported names; the caller ignores those events.
/// The prefix match is case-sensitive: exports are produced with upper-case
/// stems, and a lower-cased name is treated as unsupported.
pub fn classify(file_name: &str) -> Option<ParserKind> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    if stem.starts_with(ARCHIVE_PREFIX) {
        Some(ParserKind::ArchiveBundle)
    } else if stem.starts_with(URL_LIST_PREFIX) {
        Some(ParserKind::UrlList)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_prefix_selects_archive_parser() {
        assert_eq!(
            classify("imports/u1/ARCHIVE-3f2a.zip"),
            Some(ParserKind::ArchiveBundle)
        );
    }

    #[test]
    fn url_list_prefix_selects_list_parser() {
        assert_eq!(
            classify("imports/u1/URL_LIST-3f2a.csv"),
            Some(ParserKind::UrlList)
        );
    }

    #[test]
    fn directory_components_are_ignored() {
        assert_eq!(
            classify("URL_LIST-plain.csv"),
            Some(ParserKind::UrlList)
        );
        assert_eq!(
            classify("deeply/nested/dirs/ARCHIVE-1.zip"),
            Some(ParserKind::ArchiveBundle)
        );
    }

    #[test]
    fn extension_does_not_drive_classification() {
        // The stem decides, not the extension
        assert_eq!(classify("imports/u1/ARCHIVE-1.csv"), Some(ParserKind::ArchiveBundle));
        assert_eq!(classify("imports/u1/notes.zip"), None);
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        // Pins the documented behavior: lower-cased names are unsupported
        assert_eq!(classify("imports/u1/archive-1.zip"), None);
        assert_eq!(classify("imports/u1/url_list-1.csv"), None);
    }

    #[test]
    fn unknown_names_are_unsupported() {
        assert_eq!(classify("imports/u1/export.csv"), None);
        assert_eq!(classify(""), None);
    }
}
