//! Chat model provider trait

use async_trait::async_trait;
use crate::error::Result;

/// Trait for text generation from a single prompt
///
/// Implementations:
/// - `OpenAiChat`: any OpenAI-compatible `/chat/completions` endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModelProvider: Send + Sync {
    /// Generate the model's reply to `prompt`
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &'static str;

    /// Get the model being used
    fn model(&self) -> String;
}
