//! Application state for the chart server

use std::sync::Arc;

use crate::config::SynthConfig;
use crate::error::Result;
use crate::pipeline::{ChartPipeline, SynthesisProviders};

/// Shared application state
///
/// Holds only immutable, process-wide values; every request builds its own
/// pipeline run on top of them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: SynthConfig,
    /// Chart synthesis pipeline
    pipeline: ChartPipeline,
}

impl AppState {
    /// Create state with the default providers
    pub fn new(config: SynthConfig) -> Result<Self> {
        let providers = SynthesisProviders::from_config(&config)?;
        Self::with_providers(config, providers)
    }

    /// Create state with explicit providers
    pub fn with_providers(config: SynthConfig, providers: SynthesisProviders) -> Result<Self> {
        tracing::info!(
            "Initializing chart pipeline (chat: {}, embeddings: {})",
            config.llm.chat_model,
            config.llm.embed_model
        );
        let pipeline = ChartPipeline::new(&config, providers)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &SynthConfig {
        &self.inner.config
    }

    /// Get the synthesis pipeline
    pub fn pipeline(&self) -> &ChartPipeline {
        &self.inner.pipeline
    }
}
