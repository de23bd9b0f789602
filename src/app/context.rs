use std::sync::Arc;

use crate::config::Settings;
use crate::fetcher::{Fetcher, Loader};
use crate::normalizer::Normalizer;

/// Everything one run needs: merged settings, the source loader and the
/// feed normalizer. Dropping it releases the TLS configuration.
pub struct AppContext {
    pub settings: Settings,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub normalizer: Normalizer,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(Loader::new(&settings));
        Self::with_fetcher(settings, fetcher)
    }

    pub fn with_fetcher(settings: Settings, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self {
            settings,
            fetcher,
            normalizer: Normalizer::new(),
        }
    }
}
