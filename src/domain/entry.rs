use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    pub title: Option<String>,
    pub author: Option<String>,
    pub link: Option<String>,
    pub updated: Option<DateTime<Utc>>,
}

impl Entry {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(Untitled)")
    }
}
