use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::app::{FeedreaderError, Result};
use crate::fetcher::buffer::ResponseBuffer;
use crate::url::{percent_decode, ParsedUrl};

/// Read the file a `file://` URL points to into `buf`.
pub async fn load_file(url: &ParsedUrl, buf: &mut ResponseBuffer) -> Result<()> {
    let path = percent_decode(url.path());

    let mut file = File::open(&path).await.map_err(|e| {
        FeedreaderError::File(format!("Unable to open file on path '{}'! ({})", path, e))
    })?;

    loop {
        let n = file.read(buf.spare_mut()).await.map_err(|e| {
            FeedreaderError::File(format!("Unable to read file on path '{}'! ({})", path, e))
        })?;
        if n == 0 {
            break;
        }
        buf.advance(n);
    }

    debug!(path = %path, bytes = buf.len(), "file loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::DEFAULT_SCHEME;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_file_larger_than_buffer() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content = "<rss version=\"2.0\"></rss>".repeat(10);
        file.write_all(content.as_bytes()).unwrap();

        let raw = format!("file://{}", file.path().display());
        let url = ParsedUrl::parse(&raw, DEFAULT_SCHEME).unwrap();
        let mut buf = ResponseBuffer::with_capacity(16);

        load_file(&url, &mut buf).await.unwrap();
        assert_eq!(buf.as_bytes(), content.as_bytes());
        assert!(buf.capacity() > buf.len());
    }

    #[tokio::test]
    async fn test_missing_file_is_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let raw = format!("file://{}/missing.xml", dir.path().display());
        let url = ParsedUrl::parse(&raw, DEFAULT_SCHEME).unwrap();
        let mut buf = ResponseBuffer::new();

        let err = load_file(&url, &mut buf).await.unwrap_err();
        assert!(matches!(err, FeedreaderError::File(_)));
    }
}
