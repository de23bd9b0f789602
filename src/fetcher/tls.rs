//! Trust configuration for HTTPS connections.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};
use tracing::debug;

use crate::app::{FeedreaderError, Result};

/// Owns the TLS client configuration for one run.
///
/// The configuration is built on first use and then shared by every HTTPS
/// connection; it is released when the context is dropped.
pub struct TlsContext {
    ca_file: Option<PathBuf>,
    ca_dir: Option<PathBuf>,
    config: OnceCell<Arc<ClientConfig>>,
}

impl TlsContext {
    pub fn new(ca_file: Option<PathBuf>, ca_dir: Option<PathBuf>) -> Self {
        Self {
            ca_file,
            ca_dir,
            config: OnceCell::new(),
        }
    }

    /// Client configuration, building it on the first call. A failed build
    /// is not cached.
    pub fn client_config(&self) -> Result<Arc<ClientConfig>> {
        self.config
            .get_or_try_init(|| self.build().map(Arc::new))
            .cloned()
    }

    fn build(&self) -> Result<ClientConfig> {
        let roots = self.root_store()?;
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| FeedreaderError::Internal(format!("Unable to configure TLS! ({})", e)))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(config)
    }

    fn root_store(&self) -> Result<RootCertStore> {
        if self.ca_file.is_none() && self.ca_dir.is_none() {
            return Ok(RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            });
        }

        let mut store = RootCertStore::empty();

        if let Some(file) = &self.ca_file {
            let certs = read_certificates(file).map_err(|e| path_error(file, &e))?;
            let (added, ignored) = store.add_parsable_certificates(certs);
            debug!(path = %file.display(), added, ignored, "loaded CA file");
        }

        if let Some(dir) = &self.ca_dir {
            let entries = fs::read_dir(dir).map_err(|e| path_error(dir, &e))?;
            for entry in entries {
                let path = entry.map_err(|e| path_error(dir, &e))?.path();
                if !path.is_file() {
                    continue;
                }
                match read_certificates(&path) {
                    Ok(certs) => {
                        let (added, ignored) = store.add_parsable_certificates(certs);
                        debug!(path = %path.display(), added, ignored, "loaded CA directory entry");
                    }
                    Err(e) => debug!(path = %path.display(), error = %e, "skipping CA directory entry"),
                }
            }
        }

        if store.is_empty() {
            return Err(FeedreaderError::Path(
                "Unable to set paths to certificate files! Please check given paths!".into(),
            ));
        }

        Ok(store)
    }
}

fn read_certificates(path: &Path) -> io::Result<Vec<CertificateDer<'static>>> {
    CertificateDer::pem_file_iter(path)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

fn path_error(path: &Path, e: &io::Error) -> FeedreaderError {
    FeedreaderError::Path(format!(
        "Unable to load certificates from '{}'! Please check given paths! ({})",
        path.display(),
        e
    ))
}

/// Map a failed TLS handshake to the error taxonomy: a rejected peer
/// certificate is a verification failure, anything else a connection one.
pub fn classify_handshake_error(err: &io::Error, url: &str) -> FeedreaderError {
    let rejected_certificate = err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
        .is_some_and(|e| matches!(e, rustls::Error::InvalidCertificate(_)));

    if rejected_certificate {
        FeedreaderError::Verification(format!(
            "Unable to verify certificate of '{}'! ({})",
            url, err
        ))
    } else {
        FeedreaderError::Connection(format!("Cannot connect to the '{}'! ({})", url, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustls::CertificateError;
    use std::io::Write;

    #[test]
    fn test_default_roots() {
        let ctx = TlsContext::new(None, None);
        let first = ctx.client_config().unwrap();
        let second = ctx.client_config().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    const CA_PEM: &str = include_str!("testdata/ca.pem");
    const OTHER_CA_PEM: &str = include_str!("testdata/other_ca.pem");

    #[test]
    fn test_ca_file_and_dir_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        let ca_file = dir.path().join("ca.pem");
        fs::write(&ca_file, CA_PEM).unwrap();

        let ca_dir = dir.path().join("certs");
        fs::create_dir(&ca_dir).unwrap();
        fs::write(ca_dir.join("other.pem"), OTHER_CA_PEM).unwrap();
        fs::write(ca_dir.join("README"), "not a certificate").unwrap();

        let ctx = TlsContext::new(Some(ca_file), Some(ca_dir));
        assert_eq!(ctx.root_store().unwrap().len(), 2);
        assert!(ctx.client_config().is_ok());
    }

    #[test]
    fn test_ca_file_alone() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CA_PEM.as_bytes()).unwrap();

        let ctx = TlsContext::new(Some(file.path().to_path_buf()), None);
        assert_eq!(ctx.root_store().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_ca_file_is_path_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = TlsContext::new(Some(dir.path().join("missing.pem")), None);
        assert!(matches!(ctx.client_config(), Err(FeedreaderError::Path(_))));
    }

    #[test]
    fn test_missing_ca_dir_is_path_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = TlsContext::new(None, Some(dir.path().join("nope")));
        assert!(matches!(ctx.client_config(), Err(FeedreaderError::Path(_))));
    }

    #[test]
    fn test_dir_without_certificates_is_path_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("README")).unwrap();
        writeln!(file, "not a certificate").unwrap();

        let ctx = TlsContext::new(None, Some(dir.path().to_path_buf()));
        assert!(matches!(ctx.client_config(), Err(FeedreaderError::Path(_))));
    }

    #[test]
    fn test_classify_invalid_certificate() {
        let err = io::Error::new(
            io::ErrorKind::InvalidData,
            rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer),
        );
        assert!(matches!(
            classify_handshake_error(&err, "https://example.com/"),
            FeedreaderError::Verification(_)
        ));
    }

    #[test]
    fn test_classify_other_handshake_failure() {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        assert!(matches!(
            classify_handshake_error(&err, "https://example.com/"),
            FeedreaderError::Connection(_)
        ));
    }
}
