//! Application state for the RAG server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::pipeline::RagPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Question answering pipeline shared by every connection
    pipeline: Arc<RagPipeline>,
    /// Ready state, set once startup checks have run
    ready: RwLock<bool>,
}

impl AppState {
    /// Create new application state; not ready until [`AppState::set_ready`]
    pub fn new(config: RagConfig, pipeline: Arc<RagPipeline>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                ready: RwLock::new(false),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the pipeline
    pub fn pipeline(&self) -> &Arc<RagPipeline> {
        &self.inner.pipeline
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
