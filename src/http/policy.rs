use tracing::warn;

use crate::app::{FeedreaderError, Result};
use crate::domain::{QueueEntry, UrlQueue};
use crate::http::response::{DocType, HttpResponse};
use crate::url::{resolve_location, ParsedUrl};

/// Longest chain of redirects followed from one input URL.
pub const MAX_REDIRECTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The body is the document to parse.
    Proceed,
    /// A follow-up entry was spliced after the current one.
    Redirect,
}

/// Decide what to do with a parsed response for the entry at `current`.
/// Failures come back as `Http` errors.
pub fn check_response(
    resp: &HttpResponse,
    buf: &[u8],
    queue: &mut UrlQueue,
    current: usize,
    url: &ParsedUrl,
    check_mime: bool,
) -> Result<Decision> {
    let code = resp.status_code(buf);

    match code {
        200..=299 => {
            if check_mime && resp.doc_type == DocType::Other {
                let declared = resp
                    .content_type
                    .map(|span| span.text(buf).into_owned())
                    .unwrap_or_default();
                return Err(FeedreaderError::Http(format!(
                    "Unsupported MIME type '{}' of '{}'!",
                    declared, url
                )));
            }
            Ok(Decision::Proceed)
        }
        300..=399 => {
            let depth = queue.get(current).map_or(0, |entry| entry.redirect_depth);
            if depth >= MAX_REDIRECTS {
                return Err(FeedreaderError::Http(format!(
                    "Maximum number of redirections ({}) was exceeded!",
                    MAX_REDIRECTS
                )));
            }

            let location = resp
                .location
                .filter(|span| !span.is_empty())
                .map(|span| span.text(buf))
                .ok_or_else(|| {
                    FeedreaderError::Http(format!(
                        "Got redirect (code {}) from '{}' without a Location header!",
                        code, url
                    ))
                })?;

            let target = resolve_location(url, &location);
            warn!(
                "Got {} (code {}) from '{}'! Redirecting to '{}'.",
                resp.phrase.text(buf),
                code,
                url,
                target
            );

            queue.insert_after(current, QueueEntry::redirect(target, depth + 1));
            Ok(Decision::Redirect)
        }
        _ => Err(FeedreaderError::Http(format!(
            "Got {} (code {}) from '{}'!",
            resp.phrase.text(buf),
            code,
            url
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parse_response;
    use crate::url::DEFAULT_SCHEME;

    fn url(raw: &str) -> ParsedUrl {
        ParsedUrl::parse(raw, DEFAULT_SCHEME).unwrap()
    }

    const MOVED: &[u8] = b"HTTP/1.1 301 Moved\r\nLocation: /new\r\n\r\n";

    #[test]
    fn test_ok_proceeds() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<rss/>";
        let resp = parse_response(raw, "x").unwrap();
        let mut queue = UrlQueue::single("https://example.com/");

        let decision =
            check_response(&resp, raw, &mut queue, 0, &url("https://example.com/"), false);
        assert_eq!(decision, Ok(Decision::Proceed));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_mime_check_rejects_html() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html/>";
        let resp = parse_response(raw, "x").unwrap();
        let mut queue = UrlQueue::single("https://example.com/");

        let err = check_response(&resp, raw, &mut queue, 0, &url("https://example.com/"), true)
            .unwrap_err();
        assert!(matches!(err, FeedreaderError::Http(_)));
    }

    #[test]
    fn test_redirect_is_spliced_after_current() {
        let resp = parse_response(MOVED, "x").unwrap();
        let mut queue = UrlQueue::from_feedfile("http://a.example/old\nhttp://b.example/\n");

        let decision = check_response(
            &resp,
            MOVED,
            &mut queue,
            0,
            &url("http://a.example/old"),
            false,
        );

        assert_eq!(decision, Ok(Decision::Redirect));
        let spliced = queue.get(1).unwrap();
        assert_eq!(spliced.url, "http://a.example/new");
        assert_eq!(spliced.redirect_depth, 1);
        assert_eq!(queue.get(2).unwrap().url, "http://b.example/");
    }

    #[test]
    fn test_sixth_redirect_fails_without_splice() {
        let resp = parse_response(MOVED, "x").unwrap();
        let base = url("https://example.com/start");
        let mut queue = UrlQueue::single("https://example.com/start");

        for current in 0..5 {
            let decision = check_response(&resp, MOVED, &mut queue, current, &base, false);
            assert_eq!(decision, Ok(Decision::Redirect));
            assert_eq!(queue.get(current + 1).unwrap().redirect_depth, current as u32 + 1);
        }
        assert_eq!(queue.len(), 6);

        let err = check_response(&resp, MOVED, &mut queue, 5, &base, false).unwrap_err();
        assert!(matches!(err, FeedreaderError::Http(_)));
        assert_eq!(queue.len(), 6);
    }

    #[test]
    fn test_redirect_without_location() {
        let raw = b"HTTP/1.1 302 Found\r\n\r\n";
        let resp = parse_response(raw, "x").unwrap();
        let mut queue = UrlQueue::single("https://example.com/");

        let err = check_response(&resp, raw, &mut queue, 0, &url("https://example.com/"), false)
            .unwrap_err();
        assert!(matches!(err, FeedreaderError::Http(_)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_blank_location_counts_as_missing() {
        let raw = b"HTTP/1.1 301 Moved\r\nLocation:   \r\n\r\n";
        let resp = parse_response(raw, "x").unwrap();
        let mut queue = UrlQueue::single("https://example.com/");

        let err = check_response(&resp, raw, &mut queue, 0, &url("https://example.com/"), false)
            .unwrap_err();
        assert_eq!(err.exit_code(), 8);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_client_error_names_code_and_phrase() {
        let raw = b"HTTP/1.1 404 Not Found\r\n\r\n";
        let resp = parse_response(raw, "x").unwrap();
        let mut queue = UrlQueue::single("https://example.com/");

        let err = check_response(&resp, raw, &mut queue, 0, &url("https://example.com/"), false)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "HTTP error: Got Not Found (code 404) from 'https://example.com/'!"
        );
    }
}
