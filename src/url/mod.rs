//! URL parsing.
//!
//! A permissive RFC 3986 parser: the input is tokenized into seven optional
//! components by matching each grammar production exactly where the previous
//! one ended, then the result is validated and normalized.
//!
//! ```text
//! scheme   userinfo  host        port  path       query  fragment
//! https:// user@     example.com :8443 /feeds/rss ?x=1   #top
//! ```

mod encode;
mod grammar;
mod resolve;

use std::fmt;

use tracing::{debug, warn};

use crate::app::{FeedreaderError, Result};

pub use encode::{encode_reference, encode_tail, percent_decode};
pub use resolve::{is_path_only, remove_dot_segments, resolve_location};

/// Scheme assumed for URLs written without one.
pub const DEFAULT_SCHEME: &str = "https://";

/// Grammar components in matching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Scheme,
    Userinfo,
    Host,
    Port,
    Path,
    Query,
    Fragment,
}

impl Component {
    pub const ALL: [Component; 7] = [
        Component::Scheme,
        Component::Userinfo,
        Component::Host,
        Component::Port,
        Component::Path,
        Component::Query,
        Component::Fragment,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceType {
    File,
    Http,
    Https,
    #[default]
    Unknown,
}

impl SourceType {
    /// Classify a scheme token such as `"https://"` (case-insensitive).
    pub fn from_scheme(scheme: &str) -> Self {
        if scheme.eq_ignore_ascii_case("file://") {
            SourceType::File
        } else if scheme.eq_ignore_ascii_case("https://") {
            SourceType::Https
        } else if scheme.eq_ignore_ascii_case("http://") {
            SourceType::Http
        } else {
            SourceType::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Ipv4,
    Ipv6,
    RegName,
}

/// Default port for a scheme token, `None` for schemes without one.
pub fn default_port(scheme: &str) -> Option<u16> {
    let name = scheme.trim_end_matches("://").to_ascii_lowercase();
    match name.as_str() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// A URL split into its components.
///
/// Matched text keeps its delimiters (`"https://"`, `"?x=1"`, `"#top"`)
/// except for the port, whose leading `:` is removed by normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: Option<String>,
    pub userinfo: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
    pub source: SourceType,
}

impl ParsedUrl {
    /// Parse `raw`, falling back to `default_scheme` when it has no scheme.
    pub fn parse(raw: &str, default_scheme: &str) -> Result<Self> {
        let prepared = encode_tail(raw);
        let input: &str = &prepared;

        let mut url = ParsedUrl::default();
        let mut cursor = 0;
        for component in Component::ALL {
            if let Some(len) = grammar::match_at_start(component, &input[cursor..]) {
                url.set(component, input[cursor..cursor + len].to_string());
                cursor += len;
            }
        }

        debug!(?url, consumed = cursor, total = input.len(), "parsed URL parts");

        if cursor != input.len() {
            return Err(FeedreaderError::Url(format!("Bad format of URL '{}'!", raw)));
        }

        url.resolve(raw, default_scheme)?;
        url.normalize(default_scheme)?;
        Ok(url)
    }

    fn set(&mut self, component: Component, value: String) {
        let slot = match component {
            Component::Scheme => &mut self.scheme,
            Component::Userinfo => &mut self.userinfo,
            Component::Host => &mut self.host,
            Component::Port => &mut self.port,
            Component::Path => &mut self.path,
            Component::Query => &mut self.query,
            Component::Fragment => &mut self.fragment,
        };
        *slot = Some(value);
    }

    /// Validate the raw match results and classify the source.
    fn resolve(&mut self, raw: &str, default_scheme: &str) -> Result<()> {
        match self.scheme.as_deref() {
            None => {
                warn!(
                    "Valid scheme part of URL '{}' was not found! It will be set to default ('{}')!",
                    raw, default_scheme
                );
                self.source = SourceType::from_scheme(default_scheme);
                if self.source == SourceType::Unknown {
                    return Err(FeedreaderError::Url(format!(
                        "Unsupported scheme '{}' of URL '{}'!",
                        default_scheme, raw
                    )));
                }
            }
            Some(scheme) => {
                self.source = SourceType::from_scheme(scheme);
                if self.source == SourceType::Unknown {
                    return Err(FeedreaderError::Url(format!(
                        "Unsupported scheme '{}' of URL '{}'!",
                        scheme, raw
                    )));
                }
            }
        }

        if self.source == SourceType::File {
            if self.path.is_none() {
                return Err(FeedreaderError::Url(format!("Bad format of URL '{}'!", raw)));
            }
            if let Some(host) = self.host.as_deref() {
                if !host.eq_ignore_ascii_case("localhost") {
                    warn!("Host '{}' of file URL '{}' is ignored!", host, raw);
                }
            }
        } else {
            if self.host.is_none() {
                return Err(FeedreaderError::Url(format!("Bad format of URL '{}'!", raw)));
            }
            if let Some(userinfo) = self.userinfo.as_deref() {
                warn!(
                    "Deprecated userinfo part '{}' was found in URL '{}'! It will be ignored!",
                    userinfo, raw
                );
            }
        }

        Ok(())
    }

    /// Fill in defaults for missing parts. Applying it twice changes nothing.
    pub fn normalize(&mut self, default_scheme: &str) -> Result<()> {
        let scheme = match self.scheme.as_deref() {
            Some(s) if !s.is_empty() => s.to_ascii_lowercase(),
            _ => default_scheme.to_ascii_lowercase(),
        };
        self.scheme = Some(scheme);

        if self.source == SourceType::File {
            return Ok(());
        }

        let port = self
            .port
            .as_deref()
            .map(|p| p.strip_prefix(':').unwrap_or(p))
            .unwrap_or("");
        let port = if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            default_port(self.scheme()).map(|p| p.to_string()).unwrap_or_default()
        } else {
            port.to_string()
        };
        if port.parse::<u16>().is_err() {
            return Err(FeedreaderError::Url(format!(
                "Port '{}' of host '{}' is out of range!",
                port,
                self.host().unwrap_or("")
            )));
        }
        self.port = Some(port);

        if self.path.as_deref().map_or(true, str::is_empty) {
            self.path = Some("/".to_string());
        }

        Ok(())
    }

    pub fn scheme(&self) -> &str {
        self.scheme.as_deref().unwrap_or("")
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Host as used for name resolution and SNI (IPv6 brackets removed).
    pub fn connect_host(&self) -> &str {
        let host = self.host.as_deref().unwrap_or("");
        host.strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host)
    }

    pub fn host_kind(&self) -> Option<HostKind> {
        let host = self.host.as_deref()?;
        Some(if grammar::is_ipv6_literal(host) {
            HostKind::Ipv6
        } else if grammar::is_ipv4_literal(host) {
            HostKind::Ipv4
        } else {
            HostKind::RegName
        })
    }

    pub fn port_number(&self) -> Option<u16> {
        self.port.as_deref().and_then(|p| p.parse().ok())
    }

    fn has_default_port(&self) -> bool {
        self.port_number() == default_port(self.scheme())
    }

    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or("/")
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// `host[:port]`, the port only when it differs from the scheme default.
    pub fn authority(&self) -> String {
        let host = self.host.as_deref().unwrap_or("");
        match self.port.as_deref() {
            Some(port) if !port.is_empty() && !self.has_default_port() => {
                format!("{}:{}", host, port)
            }
            _ => host.to_string(),
        }
    }

    /// Path plus query and fragment, as placed on the request line.
    pub fn request_target(&self) -> String {
        let mut target = self.path().to_string();
        target.push_str(self.query().unwrap_or(""));
        target.push_str(self.fragment().unwrap_or(""));
        target
    }
}

impl fmt::Display for ParsedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source == SourceType::File {
            return write!(f, "{}{}", self.scheme(), self.path());
        }
        write!(f, "{}{}{}", self.scheme(), self.authority(), self.request_target())
    }
}
