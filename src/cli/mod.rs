pub mod commands;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser};

use crate::config::{Config, OutputOptions, Settings};

#[derive(Parser, Debug)]
#[command(name = "feedreader", version)]
#[command(about = "Print the entries of RSS 2.0 and Atom feeds", long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["url", "feedfile"])))]
pub struct Cli {
    /// URL of the feed (http://, https:// or file://)
    pub url: Option<String>,

    /// File with one feed URL per line
    #[arg(short = 'f', long = "feedfile", value_name = "FEEDFILE")]
    pub feedfile: Option<PathBuf>,

    /// PEM file with trusted CA certificates
    #[arg(short = 'c', long = "certfile", value_name = "CERTFILE")]
    pub certfile: Option<PathBuf>,

    /// Directory with trusted CA certificates
    #[arg(short = 'C', long = "certaddr", value_name = "CERTDIR")]
    pub certaddr: Option<PathBuf>,

    /// Show when each entry was last updated
    #[arg(short = 'T')]
    pub time: bool,

    /// Show the author of each entry
    #[arg(short = 'a')]
    pub author: bool,

    /// Show the URL of each entry
    #[arg(short = 'u')]
    pub entry_url: bool,

    /// Reject 2xx responses whose Content-Type is not a feed or XML type
    #[arg(long)]
    pub check_mime: bool,

    /// Per-operation network timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Configuration file (default: <config dir>/feedreader/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Merge command line flags over the configuration file values.
    pub fn settings(&self, config: Config) -> Settings {
        let mut settings = Settings::from(config);

        if let Some(file) = &self.certfile {
            settings.ca_file = Some(file.clone());
        }
        if let Some(dir) = &self.certaddr {
            settings.ca_dir = Some(dir.clone());
        }
        if let Some(ms) = self.timeout_ms {
            settings.timeout = Duration::from_millis(ms);
        }
        settings.check_mime |= self.check_mime;
        settings.output = OutputOptions {
            show_time: self.time,
            show_author: self.author,
            show_url: self.entry_url,
        };

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_argument() {
        let cli = Cli::try_parse_from(["feedreader", "-T", "-u", "https://example.com/feed"]).unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://example.com/feed"));
        assert!(cli.time && cli.entry_url && !cli.author);
    }

    #[test]
    fn test_url_and_feedfile_are_exclusive() {
        let result = Cli::try_parse_from(["feedreader", "https://example.com/", "-f", "feeds.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_source_is_required() {
        assert!(Cli::try_parse_from(["feedreader", "-a"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "feedreader",
            "-f",
            "feeds.txt",
            "-c",
            "/tmp/ca.pem",
            "--timeout-ms",
            "250",
            "--check-mime",
            "-a",
        ])
        .unwrap();

        let mut config = Config::default();
        config.tls.ca_dir = Some(PathBuf::from("/etc/ssl/certs"));
        let settings = cli.settings(config);

        assert_eq!(settings.ca_file, Some(PathBuf::from("/tmp/ca.pem")));
        assert_eq!(settings.ca_dir, Some(PathBuf::from("/etc/ssl/certs")));
        assert_eq!(settings.timeout, Duration::from_millis(250));
        assert!(settings.check_mime);
        assert!(settings.output.show_author);
        assert!(settings.output.any());
    }
}
