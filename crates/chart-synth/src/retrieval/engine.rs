//! Retrieval-augmented answering over one uploaded document

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::generation::PromptBuilder;
use crate::ingestion::LoaderRegistry;
use crate::providers::{ChatModelProvider, EmbeddingProvider};
use crate::types::Document;

use super::index::IndexBuilder;
use super::memory::ConversationMemory;

/// Answers a question from the rows of an uploaded document
///
/// Nothing outlives the call: the index and the conversation memory are built
/// for each request and dropped with it.
pub struct RetrievalEngine {
    loaders: LoaderRegistry,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatModelProvider>,
    prompts: PromptBuilder,
    config: RetrievalConfig,
    embed_batch_size: usize,
}

impl RetrievalEngine {
    pub fn new(
        loaders: LoaderRegistry,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatModelProvider>,
        prompts: PromptBuilder,
        config: RetrievalConfig,
        embed_batch_size: usize,
    ) -> Self {
        Self {
            loaders,
            embedder,
            chat,
            prompts,
            config,
            embed_batch_size,
        }
    }

    /// Loaders this engine accepts documents for
    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    /// Generate the raw model answer for `question`, grounded in `document`
    pub async fn answer(&self, question: &str, document: &Document) -> Result<String> {
        // Unsupported formats fail before any upstream call
        let chunks = self.loaders.load(document)?;

        tracing::info!(
            "Indexing {} rows from {} ({})",
            chunks.len(),
            document.display_name(),
            document.essence()
        );

        let index = IndexBuilder::new(Arc::clone(&self.embedder), self.embed_batch_size)
            .build(chunks)
            .await?;
        tracing::debug!("Indexed {} rows as {}-dimensional vectors", index.len(), index.dimensions());

        let query = self.embedder.embed(question).await?;
        let results = index.search(&query, self.config.top_k, self.config.min_similarity)?;

        tracing::debug!(
            "Retrieved {} of {} rows (top similarity {:.3})",
            results.len(),
            index.len(),
            results.first().map(|r| r.similarity).unwrap_or(0.0)
        );

        let mut memory = ConversationMemory::new(self.config.memory_turns);
        let context = PromptBuilder::build_context(&results);
        let prompt = self
            .prompts
            .build_retrieval_prompt(question, &context, memory.turns());

        let answer = self.chat.complete(&prompt).await?;
        memory.record(question, answer.as_str());

        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::embedding::MockEmbeddingProvider;
    use crate::providers::llm::MockChatModelProvider;
    use crate::schema::ChartSchema;

    fn engine(
        embedder: MockEmbeddingProvider,
        chat: MockChatModelProvider,
        config: RetrievalConfig,
    ) -> RetrievalEngine {
        RetrievalEngine::new(
            LoaderRegistry::with_defaults(),
            Arc::new(embedder),
            Arc::new(chat),
            PromptBuilder::new(&ChartSchema::bundled().unwrap()),
            config,
            512,
        )
    }

    fn sales_csv() -> Document {
        Document::new("text/csv", "region,sales\nNorth,10\nSouth,7\nEast,3\n")
            .with_filename("sales.csv")
    }

    #[tokio::test]
    async fn test_answer_is_grounded_in_top_rows() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed_batch().times(1).returning(|texts| {
            Ok(texts
                .iter()
                .map(|t| if t.contains("North") { vec![1.0, 0.0] } else { vec![0.0, 1.0] })
                .collect())
        });
        embedder
            .expect_embed()
            .withf(|text: &str| text == "sales in the north")
            .times(1)
            .returning(|_| Ok(vec![1.0, 0.0]));

        let mut chat = MockChatModelProvider::new();
        chat.expect_complete()
            .withf(|prompt: &str| {
                let rows = prompt.split("DOCUMENT ROWS:").nth(1).unwrap_or("");
                rows.starts_with("\n[1] row 1, line 2\nregion: North")
                    && !prompt.contains("CHAT HISTORY")
                    && !rows.contains("[2]")
            })
            .times(1)
            .returning(|_| Ok("```json\n{}\n```".to_string()));

        let config = RetrievalConfig {
            top_k: 1,
            ..RetrievalConfig::default()
        };
        let answer = engine(embedder, chat, config)
            .answer("sales in the north", &sales_csv())
            .await
            .unwrap();
        assert!(answer.contains("```json"));
    }

    #[tokio::test]
    async fn test_unsupported_format_makes_no_calls() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed_batch().times(0);
        embedder.expect_embed().times(0);
        let mut chat = MockChatModelProvider::new();
        chat.expect_complete().times(0);

        let err = engine(embedder, chat, RetrievalConfig::default())
            .answer("chart it", &Document::new("application/pdf", "%PDF-1.4"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_chat() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed_batch()
            .returning(|_| Err(Error::upstream("HTTP 503")));
        let mut chat = MockChatModelProvider::new();
        chat.expect_complete().times(0);

        let err = engine(embedder, chat, RetrievalConfig::default())
            .answer("chart it", &sales_csv())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
