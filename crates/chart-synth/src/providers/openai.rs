//! OpenAI-compatible providers for chat completion and embeddings
//!
//! Wraps [`OpenAiClient`] to implement the provider traits.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::generation::OpenAiClient;

use super::embedding::EmbeddingProvider;
use super::llm::ChatModelProvider;

/// Embedding provider backed by `/embeddings`
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
    batch_size: usize,
}

impl OpenAiEmbedder {
    /// Create from a shared client
    pub fn from_client(client: Arc<OpenAiClient>, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client
            .embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::upstream("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            embeddings.extend(self.client.embed_batch(batch).await?);
        }
        Ok(embeddings)
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Chat provider backed by `/chat/completions`
pub struct OpenAiChat {
    client: Arc<OpenAiClient>,
}

impl OpenAiChat {
    /// Create from a shared client
    pub fn from_client(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatModelProvider for OpenAiChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.client.chat(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> String {
        self.client.chat_model().to_string()
    }
}

/// Combined provider that shares a single client for chat and embeddings
pub struct OpenAiProvider {
    embedder: OpenAiEmbedder,
    chat: OpenAiChat,
}

impl OpenAiProvider {
    /// Create a new combined provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Arc::new(OpenAiClient::new(config)?);
        Ok(Self {
            embedder: OpenAiEmbedder::from_client(Arc::clone(&client), config.embed_batch_size),
            chat: OpenAiChat::from_client(client),
        })
    }

    /// Split into separate providers
    pub fn split(self) -> (OpenAiEmbedder, OpenAiChat) {
        (self.embedder, self.chat)
    }
}
