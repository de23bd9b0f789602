use chrono::Utc;
use feed_rs::model::FeedType;
use feed_rs::parser;
use html_escape::decode_html_entities;
use tracing::{debug, warn};

use crate::app::{FeedreaderError, Result};
use crate::domain::{Entry, FeedDoc, FeedFormat};
use crate::http::DocType;

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse a document body as RSS 2.0 or Atom.
    ///
    /// `declared` is what the server claimed; a disagreement with the
    /// detected format is only reported.
    pub fn normalize(&self, body: &[u8], declared: DocType, url: &str) -> Result<FeedDoc> {
        let feed = parser::parse(body).map_err(|e| {
            FeedreaderError::Feed(format!("Unable to parse document from '{}'! ({})", url, e))
        })?;

        let format = match feed.feed_type {
            FeedType::RSS2 => FeedFormat::Rss2,
            FeedType::Atom => FeedFormat::Atom,
            other => {
                return Err(FeedreaderError::Feed(format!(
                    "Unsupported feed format {:?} of '{}'! Only RSS 2.0 and Atom are supported.",
                    other, url
                )))
            }
        };

        let mismatch = matches!(
            (declared, format),
            (DocType::Rss, FeedFormat::Atom) | (DocType::Atom, FeedFormat::Rss2)
        );
        if mismatch {
            warn!(
                "Document from '{}' was declared as {:?} but contains {:?}!",
                url, declared, format
            );
        }

        let mut doc = FeedDoc::new(format);
        doc.title = feed.title.map(|t| decode_html_entities(&t.content).to_string());
        doc.entries = feed
            .entries
            .into_iter()
            .map(|entry| {
                let date = match format {
                    FeedFormat::Atom => entry.updated.or(entry.published),
                    FeedFormat::Rss2 => entry.published.or(entry.updated),
                };
                Entry {
                    title: entry.title.map(|t| decode_html_entities(&t.content).to_string()),
                    author: entry
                        .authors
                        .first()
                        .map(|a| decode_html_entities(&a.name).to_string()),
                    link: entry.links.first().map(|l| l.href.clone()),
                    updated: date.map(|dt| dt.with_timezone(&Utc)),
                }
            })
            .collect();

        debug!(url, ?format, entries = doc.entries.len(), "feed normalized");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test &amp;amp; Feed</title>
    <description>A test feed</description>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <author>jane@example.com (Jane)</author>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    </item>
    <item>
      <link>https://example.com/item2</link>
      <guid>item-2</guid>
      <description>No title here</description>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <id>urn:test</id>
  <updated>2024-01-02T00:00:00Z</updated>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <author><name>John</name></author>
    <updated>2024-01-01T10:00:00Z</updated>
  </entry>
</feed>"#;

    const RSS1_SAMPLE: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="http://example.com/">
    <title>Old</title>
    <link>http://example.com/</link>
    <description>RSS 1.0</description>
  </channel>
  <item rdf:about="http://example.com/1">
    <title>One</title>
    <link>http://example.com/1</link>
  </item>
</rdf:RDF>"#;

    #[test]
    fn test_parse_rss() {
        let doc = Normalizer::new()
            .normalize(RSS_SAMPLE.as_bytes(), DocType::Rss, "https://example.com/feed.xml")
            .unwrap();

        assert_eq!(doc.format, FeedFormat::Rss2);
        assert_eq!(doc.display_title(), "Test & Feed");
        assert_eq!(doc.entries.len(), 2);
        assert_eq!(doc.entries[0].title, Some("Test Item 1".into()));
        assert_eq!(doc.entries[0].link, Some("https://example.com/item1".into()));
        assert!(doc.entries[0].author.is_some());
        assert!(doc.entries[0].updated.is_some());
        assert_eq!(doc.entries[1].display_title(), "(Untitled)");
    }

    #[test]
    fn test_parse_atom() {
        let doc = Normalizer::new()
            .normalize(ATOM_SAMPLE.as_bytes(), DocType::Xml, "https://example.com/feed.atom")
            .unwrap();

        assert_eq!(doc.format, FeedFormat::Atom);
        assert_eq!(doc.title, Some("Atom Test Feed".into()));
        assert_eq!(doc.entries.len(), 1);
        assert_eq!(doc.entries[0].author, Some("John".into()));
        assert_eq!(
            doc.entries[0].updated.map(|d| d.to_rfc3339()),
            Some("2024-01-01T10:00:00+00:00".into())
        );
    }

    #[test]
    fn test_declared_type_mismatch_is_not_an_error() {
        let doc = Normalizer::new()
            .normalize(ATOM_SAMPLE.as_bytes(), DocType::Rss, "https://example.com/")
            .unwrap();
        assert_eq!(doc.format, FeedFormat::Atom);
    }

    #[test]
    fn test_rss1_is_rejected() {
        let err = Normalizer::new()
            .normalize(RSS1_SAMPLE.as_bytes(), DocType::Xml, "https://example.com/")
            .unwrap_err();
        assert!(matches!(err, FeedreaderError::Feed(_)));
    }

    #[test]
    fn test_malformed_document() {
        let err = Normalizer::new()
            .normalize(b"<html><body>nope</body></html>", DocType::Xml, "https://example.com/")
            .unwrap_err();
        assert!(matches!(err, FeedreaderError::Feed(_)));
    }
}
