//! Readability-style content extraction
//!
//! Saved documents inside archive bundles are full HTML pages. Before a
//! content item is dispatched downstream, the readable article has to be
//! pulled out of the page chrome. Extraction is a collaborator seam: the
//! default implementation is deliberately lightweight, and embedders can
//! swap in a heavier engine through the trait.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::ExtractError;
use crate::types::ParsedArticle;

/// Collaborator seam for turning a saved document into a structured article
pub trait ContentExtractor: Send + Sync {
    /// Extract the readable article from a saved HTML document
    ///
    /// # Errors
    /// Returns an error when the document yields no readable body text;
    /// the caller counts that item as failed and continues the run.
    fn extract(&self, url: &Url, html: &str) -> Result<ParsedArticle, ExtractError>;
}

/// Lightweight readability-like extractor:
/// - pulls `<title>` text, falling back to `og:title`
/// - returns `<article>` content if present, otherwise `<body>`
/// - renders a plain-text version of the selected content
#[derive(Debug, Default)]
pub struct ReadabilityExtractor;

impl ContentExtractor for ReadabilityExtractor {
    fn extract(&self, url: &Url, html: &str) -> Result<ParsedArticle, ExtractError> {
        debug!(url = %url, bytes = html.len(), "extracting saved document");

        let doc = Html::parse_document(html);

        let title = select_text(&doc, "title")
            .or_else(|| select_attr(&doc, r#"meta[property="og:title"]"#, "content"));

        let (content_html, text) = article_content(&doc);

        if text.trim().is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        Ok(ParsedArticle {
            title,
            content_html,
            text,
        })
    }
}

/// Inner HTML and collected text of `<article>`, falling back to `<body>`
fn article_content(doc: &Html) -> (String, String) {
    for selector in ["article", "body"] {
        if let Ok(sel) = Selector::parse(selector)
            && let Some(node) = doc.select(&sel).next()
        {
            let text = node
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            return (node.inner_html(), text);
        }
    }
    (doc.root_element().html(), String::new())
}

fn select_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let node = doc.select(&sel).next()?;
    let text = node.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn select_attr(doc: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let node = doc.select(&sel).next()?;
    let value = node.value().attr(attr)?.trim().to_string();
    (!value.is_empty()).then_some(value)
}
