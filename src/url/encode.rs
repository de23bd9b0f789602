//! Percent-encoding helpers for the path/query/fragment part of a URL.

use std::borrow::Cow;

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

fn is_sub_delim(c: char) -> bool {
    matches!(c, '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '=')
}

fn is_hex_pair(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0].is_ascii_hexdigit() && bytes[1].is_ascii_hexdigit()
}

/// Byte offset at which the path/query/fragment part of `raw` begins, i.e.
/// the first `/`, `?` or `#` after the optional `scheme://` and authority.
fn tail_start(raw: &str) -> Option<usize> {
    let authority_start = match raw.find("://") {
        Some(idx)
            if idx > 0
                && raw[..idx]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-')) =>
        {
            idx + 3
        }
        _ => 0,
    };

    raw[authority_start..]
        .find(['/', '?', '#'])
        .map(|pos| authority_start + pos)
}

/// Percent-encode every character of the path/query/fragment part of `raw`
/// that the URL grammar does not allow there. The scheme and authority are
/// left untouched.
pub fn encode_tail(raw: &str) -> Cow<'_, str> {
    match tail_start(raw) {
        Some(start) => encode_from(raw, start),
        None => Cow::Borrowed(raw),
    }
}

/// Same as [`encode_tail`] for a reference that has no scheme or authority
/// (e.g. a relative `Location` value).
pub fn encode_reference(reference: &str) -> Cow<'_, str> {
    encode_from(reference, 0)
}

fn encode_from(raw: &str, start: usize) -> Cow<'_, str> {
    let tail = &raw[start..];
    let mut in_fragment = false;
    let mut out: Option<String> = None;

    for (idx, c) in tail.char_indices() {
        let allowed = match c {
            '%' => is_hex_pair(&tail.as_bytes()[idx + 1..]),
            '#' if !in_fragment => {
                in_fragment = true;
                true
            }
            '#' => false,
            ':' | '@' | '/' | '?' => true,
            c => is_unreserved(c) || is_sub_delim(c),
        };

        if allowed {
            if let Some(buf) = out.as_mut() {
                buf.push(c);
            }
            continue;
        }

        let buf = out.get_or_insert_with(|| {
            let mut s = String::with_capacity(raw.len() + 8);
            s.push_str(&raw[..start + idx]);
            s
        });
        // all bytes of one code point are encoded together
        let mut utf8 = [0u8; 4];
        for byte in c.encode_utf8(&mut utf8).bytes() {
            buf.push_str(&format!("%{:02X}", byte));
        }
    }

    match out {
        Some(s) => Cow::Owned(s),
        None => Cow::Borrowed(raw),
    }
}

/// Decode `%XX` sequences; malformed sequences are kept literally.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && is_hex_pair(&bytes[i + 1..]) {
            let hex = &input[i + 1..i + 3];
            if let Ok(byte) = u8::from_str_radix(hex, 16) {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}
