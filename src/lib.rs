//! Command-line reader for RSS 2.0 and Atom feeds.
//!
//! Sources are `http://`, `https://` or `file://` URLs. Network sources are
//! fetched with a small HTTP/1.1 client that follows up to five redirects;
//! the document is then parsed and its entries printed.

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod fetcher;
pub mod http;
pub mod normalizer;
pub mod url;

/// Prefix of every diagnostic line.
pub const PROGNAME: &str = "feedreader";
