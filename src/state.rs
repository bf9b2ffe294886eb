//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::{DocumentLoader, Pipeline};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    loader: DocumentLoader,
}

impl AppState {
    /// Create the state with an empty reading session
    pub fn new(config: Config) -> Self {
        let loader = DocumentLoader::new(Pipeline::new(config.pipeline));
        Self {
            inner: Arc::new(AppStateInner { config, loader }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the document loader
    pub fn loader(&self) -> &DocumentLoader {
        &self.inner.loader
    }
}
