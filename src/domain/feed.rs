use chrono::{DateTime, Utc};

use super::entry::Entry;

/// Syndication format a document was parsed as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss2,
    Atom,
}

impl FeedFormat {
    /// Render a timestamp the way the format itself carries dates.
    pub fn format_date(&self, date: &DateTime<Utc>) -> String {
        match self {
            FeedFormat::Rss2 => date.to_rfc2822(),
            FeedFormat::Atom => date.to_rfc3339(),
        }
    }
}

/// One parsed feed document.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedDoc {
    pub title: Option<String>,
    pub format: FeedFormat,
    pub entries: Vec<Entry>,
}

impl FeedDoc {
    pub fn new(format: FeedFormat) -> Self {
        Self {
            title: None,
            format,
            entries: Vec::new(),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("unknown")
    }
}
