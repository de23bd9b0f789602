//! Resolution of `Location` values against the URL that was requested.

use super::encode::encode_reference;
use super::{grammar, Component, ParsedUrl};

/// True when `s` is a bare path reference (path-absolute, path-noscheme or
/// path-rootless, optionally followed by a query and a fragment) with no
/// scheme and no `//` authority.
pub fn is_path_only(s: &str) -> bool {
    !s.starts_with("//")
        && grammar::match_at_start(Component::Scheme, s).is_none()
        && grammar::is_path_reference(s)
}

/// Compute the URL a redirect points to.
///
/// - a Location with a scheme replaces the whole URL
/// - `//host/...` keeps only the scheme of `base`
/// - `/path` keeps the scheme and authority of `base`
/// - `?query` / `#fragment` keep the path of `base`
/// - a relative path replaces the last segment of the base path
///
/// Dot segments are removed from the resulting path in every case but the
/// last: anything else is returned unchanged and parsed as a fresh URL later.
pub fn resolve_location(base: &ParsedUrl, location: &str) -> String {
    let location = location.trim();

    if grammar::match_at_start(Component::Scheme, location).is_some() {
        return remove_dots_after_authority(location);
    }

    let origin = format!("{}{}", base.scheme(), base.authority());

    if let Some(rest) = location.strip_prefix("//") {
        return remove_dots_after_authority(&format!("{}{}", base.scheme(), rest));
    }

    let location = encode_reference(location);

    if location.starts_with('?') {
        return format!("{}{}{}", origin, base.path(), location);
    }

    if location.starts_with('#') {
        return format!(
            "{}{}{}{}",
            origin,
            base.path(),
            base.query().unwrap_or(""),
            location
        );
    }

    if !is_path_only(&location) {
        return location.into_owned();
    }

    let (path, suffix) = match location.find(['?', '#']) {
        Some(idx) => location.split_at(idx),
        None => (&location[..], ""),
    };

    let merged = if path.starts_with('/') {
        path.to_string()
    } else {
        let base_path = base.path();
        let dir = match base_path.rfind('/') {
            Some(idx) => &base_path[..=idx],
            None => "/",
        };
        format!("{}{}", dir, path)
    };

    format!("{}{}{}", origin, remove_dot_segments(&merged), suffix)
}

/// Apply dot-segment removal to the path of a `scheme://authority/path`
/// string, leaving the query and fragment alone.
fn remove_dots_after_authority(url: &str) -> String {
    let Some(authority_start) = url.find("//").map(|i| i + 2) else {
        return url.to_string();
    };
    let rest = &url[authority_start..];
    let Some(path_start) = rest.find(['/', '?', '#']) else {
        return url.to_string();
    };
    let tail = &rest[path_start..];
    if !tail.starts_with('/') {
        return url.to_string();
    }

    let (path, suffix) = match tail.find(['?', '#']) {
        Some(idx) => tail.split_at(idx),
        None => (tail, ""),
    };
    format!(
        "{}{}{}",
        &url[..authority_start + path_start],
        remove_dot_segments(path),
        suffix
    )
}

/// Remove `.` and `..` segments from an absolute path (RFC 3986, 5.2.4).
pub fn remove_dot_segments(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    let mut trailing_slash = false;

    for segment in path.trim_start_matches('/').split('/') {
        trailing_slash = false;
        match segment {
            "." => trailing_slash = true,
            ".." => {
                stack.pop();
                trailing_slash = true;
            }
            s => stack.push(s),
        }
    }

    let mut out = String::from("/");
    out.push_str(&stack.join("/"));
    if trailing_slash && !stack.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::DEFAULT_SCHEME;

    fn base(raw: &str) -> ParsedUrl {
        ParsedUrl::parse(raw, DEFAULT_SCHEME).unwrap()
    }

    #[test]
    fn test_relative_parent_reference() {
        let base = base("https://example.com/a/b?x=1");
        assert_eq!(resolve_location(&base, "../c"), "https://example.com/c");
    }

    #[test]
    fn test_relative_sibling_reference() {
        let base = base("https://example.com/feeds/old.xml");
        assert_eq!(
            resolve_location(&base, "new.xml?v=2"),
            "https://example.com/feeds/new.xml?v=2"
        );
    }

    #[test]
    fn test_absolute_path_replaces_path_and_query() {
        let base = base("http://example.com:8080/a/b?x=1");
        assert_eq!(resolve_location(&base, "/new"), "http://example.com:8080/new");
    }

    #[test]
    fn test_absolute_url_with_new_host() {
        let base = base("https://example.com/a/b");
        assert_eq!(
            resolve_location(&base, "http://other.org/feed.xml"),
            "http://other.org/feed.xml"
        );
    }

    #[test]
    fn test_network_path_with_new_host_and_relative_segments() {
        let base = base("https://example.com/a/b");
        assert_eq!(
            resolve_location(&base, "//mirror.example.net/x/../rss.xml"),
            "https://mirror.example.net/rss.xml"
        );
        let target = ParsedUrl::parse(
            &resolve_location(&base, "//mirror.example.net/x/rss.xml"),
            DEFAULT_SCHEME,
        )
        .unwrap();
        assert_eq!(target.host(), Some("mirror.example.net"));
        assert_eq!(target.path(), "/x/rss.xml");
    }

    #[test]
    fn test_absolute_url_dot_segments_are_removed() {
        let base = base("https://example.com/a/b");
        assert_eq!(
            resolve_location(&base, "http://other.org/a/./b/../c?x=../y#f"),
            "http://other.org/a/c?x=../y#f"
        );
        assert_eq!(
            resolve_location(&base, "http://other.org:8080?q"),
            "http://other.org:8080?q"
        );

        let target = ParsedUrl::parse(
            &resolve_location(&base, "//mirror.example.net/x/../rss.xml"),
            DEFAULT_SCHEME,
        )
        .unwrap();
        assert_eq!(target.request_target(), "/rss.xml");
    }

    #[test]
    fn test_query_and_fragment_only() {
        let base = base("https://example.com/list?page=1");
        assert_eq!(resolve_location(&base, "?page=2"), "https://example.com/list?page=2");
        assert_eq!(
            resolve_location(&base, "#latest"),
            "https://example.com/list?page=1#latest"
        );
    }

    #[test]
    fn test_relative_location_is_encoded() {
        let base = base("https://example.com/a/");
        assert_eq!(resolve_location(&base, "ž.xml"), "https://example.com/a/%C5%BE.xml");
    }

    #[test]
    fn test_is_path_only() {
        assert!(is_path_only("/new"));
        assert!(is_path_only("../c"));
        assert!(is_path_only("feed.xml"));
        assert!(!is_path_only("https://example.com/"));
        assert!(!is_path_only("//example.com/feed"));
        assert!(!is_path_only(""));
    }

    #[test]
    fn test_remove_dot_segments() {
        assert_eq!(remove_dot_segments("/a/b/../c"), "/a/c");
        assert_eq!(remove_dot_segments("/a/../../c"), "/c");
        assert_eq!(remove_dot_segments("/a/./b/."), "/a/b/");
        assert_eq!(remove_dot_segments("/a/b/.."), "/a/");
        assert_eq!(remove_dot_segments("/.."), "/");
        assert_eq!(remove_dot_segments("/plain"), "/plain");
    }
}
