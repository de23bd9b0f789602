use tracing::debug;

use crate::app::{FeedreaderError, Result};
use crate::fetcher::Span;

const HEADER_END: &[u8] = b"\r\n\r\n";

/// Declared kind of a document, taken from its `Content-Type`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocType {
    Rss,
    Atom,
    #[default]
    Xml,
    Other,
}

impl DocType {
    /// Classify a `Content-Type` value. Parameters such as `charset` are
    /// ignored; a missing header means generic XML.
    pub fn from_content_type(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return DocType::Xml;
        };
        let media = value.split(';').next().unwrap_or("").trim();

        if media.eq_ignore_ascii_case("application/rss+xml") {
            DocType::Rss
        } else if media.eq_ignore_ascii_case("application/atom+xml") {
            DocType::Atom
        } else if media.eq_ignore_ascii_case("application/xml")
            || media.eq_ignore_ascii_case("text/xml")
        {
            DocType::Xml
        } else {
            DocType::Other
        }
    }
}

/// Parsed response head. Every field is a span into the response buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub version: Span,
    pub status: Span,
    pub phrase: Span,
    pub location: Option<Span>,
    pub content_type: Option<Span>,
    pub content_length: Option<Span>,
    pub body_start: usize,
    pub doc_type: DocType,
}

impl HttpResponse {
    /// Numeric status code; the parser guarantees three digits.
    pub fn status_code(&self, buf: &[u8]) -> u16 {
        self.status
            .bytes(buf)
            .iter()
            .fold(0u16, |code, d| code * 10 + u16::from(d - b'0'))
    }

    pub fn body<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        buf.get(self.body_start..).unwrap_or(&[])
    }

    pub fn content_length_value(&self, buf: &[u8]) -> Option<usize> {
        self.content_length
            .and_then(|span| span.text(buf).trim().parse().ok())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Split `line` (located at `offset` in the buffer) on runs of whitespace,
/// yielding at most `limit` spans. The last span takes the rest of the line.
fn split_fields(line: &[u8], offset: usize, limit: usize) -> Vec<Span> {
    let mut fields = Vec::with_capacity(limit);
    let mut i = 0;

    while i < line.len() && fields.len() < limit {
        while i < line.len() && is_ows(line[i]) {
            i += 1;
        }
        if i == line.len() {
            break;
        }
        let start = i;
        if fields.len() + 1 == limit {
            let mut end = line.len();
            while end > start && is_ows(line[end - 1]) {
                end -= 1;
            }
            fields.push(Span::new(offset + start, end - start));
            break;
        }
        while i < line.len() && !is_ows(line[i]) {
            i += 1;
        }
        fields.push(Span::new(offset + start, i - start));
    }

    fields
}

/// Span of the value of `line` if it starts with `name` (case-insensitive),
/// with surrounding whitespace trimmed.
fn header_value(line: &[u8], offset: usize, name: &[u8]) -> Option<Span> {
    if line.len() < name.len() || !line[..name.len()].eq_ignore_ascii_case(name) {
        return None;
    }

    let mut start = name.len();
    let mut end = line.len();
    while start < end && is_ows(line[start]) {
        start += 1;
    }
    while end > start && is_ows(line[end - 1]) {
        end -= 1;
    }
    Some(Span::new(offset + start, end - start))
}

/// Parse the status line and the headers of interest out of `buf`.
pub fn parse_response(buf: &[u8], url: &str) -> Result<HttpResponse> {
    let head_end = find(buf, HEADER_END).ok_or_else(|| {
        FeedreaderError::Http(format!("Headers of response from '{}' not found!", url))
    })?;
    let head = &buf[..head_end];

    let mut response = HttpResponse {
        body_start: head_end + HEADER_END.len(),
        ..Default::default()
    };

    // the status line is always the first element, even for an empty head
    let mut offset = 0;
    for (index, line) in head.split(|b| *b == b'\n').enumerate() {
        let line_start = offset;
        offset += line.len() + 1;
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if index == 0 {
            parse_status_line(line, line_start, &mut response, buf, url)?;
            continue;
        }

        if let Some(span) = header_value(line, line_start, b"Location:") {
            response.location = Some(span);
        } else if let Some(span) = header_value(line, line_start, b"Content-Type:") {
            response.content_type = Some(span);
        } else if let Some(span) = header_value(line, line_start, b"Content-Length:") {
            response.content_length = Some(span);
        }
    }

    let content_type = response.content_type.map(|span| span.text(buf));
    response.doc_type = DocType::from_content_type(content_type.as_deref());

    debug!(
        status = %response.status.text(buf),
        phrase = %response.phrase.text(buf),
        location = ?response.location.map(|s| s.text(buf)),
        content_type = ?content_type,
        body_start = response.body_start,
        "parsed response head"
    );

    Ok(response)
}

fn parse_status_line(
    line: &[u8],
    offset: usize,
    response: &mut HttpResponse,
    buf: &[u8],
    url: &str,
) -> Result<()> {
    let fields = split_fields(line, offset, 3);
    let bad_status = || {
        FeedreaderError::Http(format!(
            "Bad format of status line '{}' in response from '{}'!",
            String::from_utf8_lossy(line),
            url
        ))
    };

    let [version, status, phrase] = fields[..] else {
        return Err(bad_status());
    };

    let code = status.bytes(buf);
    if code.len() != 3 || !code.iter().all(u8::is_ascii_digit) {
        return Err(bad_status());
    }

    response.version = version;
    response.status = status;
    response.phrase = phrase;
    Ok(())
}
