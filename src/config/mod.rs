//! Configuration management for feedreader.
//!
//! Defaults can be stored in `~/.config/feedreader/config.toml`. Every value
//! there may be overridden by a command-line flag; the merged result is a
//! [`Settings`] value handed to the rest of the program.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of milliseconds a single network operation may stay
/// unready before it is abandoned.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Main configuration struct, mirroring the TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkConfig,
    pub tls: TlsConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-operation timeout (connect, handshake, each write, each read)
    pub timeout_ms: u64,

    /// Value of the `User-Agent` request header
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// PEM file with trusted CA certificates
    pub ca_file: Option<PathBuf>,

    /// Directory with PEM files of trusted CA certificates
    pub ca_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Reject 2xx responses whose Content-Type is not an RSS/Atom/XML type
    pub check_mime: bool,
}

fn default_user_agent() -> String {
    format!("feedreader/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit path the file must exist. Without one the default
    /// location is tried and silently skipped when absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default_path = match Self::default_config_path() {
                    Ok(p) => p,
                    Err(_) => return Ok(Self::default()),
                };
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get the default config file path: `~/.config/feedreader/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedreader").join("config.toml"))
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Effective run settings after merging the config file with CLI flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub ca_file: Option<PathBuf>,
    pub ca_dir: Option<PathBuf>,
    pub timeout: Duration,
    pub user_agent: String,
    pub check_mime: bool,
    pub output: OutputOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::from(Config::default())
    }
}

impl From<Config> for Settings {
    fn from(config: Config) -> Self {
        Self {
            ca_file: config.tls.ca_file,
            ca_dir: config.tls.ca_dir,
            timeout: Duration::from_millis(config.network.timeout_ms),
            user_agent: config.network.user_agent,
            check_mime: config.http.check_mime,
            output: OutputOptions::default(),
        }
    }
}

/// Which optional entry fields are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub show_time: bool,
    pub show_author: bool,
    pub show_url: bool,
}

impl OutputOptions {
    pub fn any(&self) -> bool {
        self.show_time || self.show_author || self.show_url
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
