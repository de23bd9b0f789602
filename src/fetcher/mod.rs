pub mod buffer;
pub mod file;
pub mod http_fetcher;
pub mod tls;

use async_trait::async_trait;

use crate::app::{FeedreaderError, Result};
use crate::config::Settings;
use crate::url::{ParsedUrl, SourceType};

pub use buffer::{ResponseBuffer, Span};
pub use http_fetcher::HttpFetcher;

/// Loads the raw bytes behind a URL into a response buffer.
#[async_trait]
pub trait Fetcher {
    async fn load(&self, url: &ParsedUrl, buf: &mut ResponseBuffer) -> Result<()>;
}

/// Default fetcher: dispatches on the source type of the URL.
pub struct Loader {
    http: HttpFetcher,
}

impl Loader {
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: HttpFetcher::new(settings),
        }
    }
}

#[async_trait]
impl Fetcher for Loader {
    async fn load(&self, url: &ParsedUrl, buf: &mut ResponseBuffer) -> Result<()> {
        match url.source {
            SourceType::File => file::load_file(url, buf).await,
            SourceType::Http => self.http.load_http(url, buf).await,
            SourceType::Https => self.http.load_https(url, buf).await,
            SourceType::Unknown => Err(FeedreaderError::Url(format!(
                "Unsupported type of source ('{}')!",
                url
            ))),
        }
    }
}
