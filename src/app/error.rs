use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedreaderError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Error while opening file: {0}")]
    File(String),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Verification error: {0}")]
    Verification(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Feed source error: {0}")]
    Feed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FeedreaderError {
    /// Process exit status reported for this kind of failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => 1,
            Self::File(_) => 2,
            Self::Url(_) => 3,
            Self::Connection(_) => 4,
            Self::Communication(_) => 5,
            Self::Path(_) => 6,
            Self::Verification(_) => 7,
            Self::Http(_) => 8,
            Self::Feed(_) => 9,
            Self::Internal(_) => 10,
        }
    }
}

impl From<ConfigError> for FeedreaderError {
    fn from(e: ConfigError) -> Self {
        FeedreaderError::File(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedreaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            FeedreaderError::Usage(String::new()),
            FeedreaderError::File(String::new()),
            FeedreaderError::Url(String::new()),
            FeedreaderError::Connection(String::new()),
            FeedreaderError::Communication(String::new()),
            FeedreaderError::Path(String::new()),
            FeedreaderError::Verification(String::new()),
            FeedreaderError::Http(String::new()),
            FeedreaderError::Feed(String::new()),
            FeedreaderError::Internal(String::new()),
        ];
        let mut codes: Vec<u8> = errors.iter().map(|e| e.exit_code()).collect();
        codes.dedup();
        assert_eq!(codes, (1..=10).collect::<Vec<u8>>());
    }

    #[test]
    fn test_display_has_kind_header() {
        let err = FeedreaderError::Http("Got Not Found (code 404)".into());
        assert_eq!(err.to_string(), "HTTP error: Got Not Found (code 404)");
    }
}
