//! In-memory embedding index built per request

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

use super::SearchResult;

/// Chunks with their embeddings, searched by brute-force cosine similarity
#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    entries: Vec<(Chunk, Vec<f32>)>,
    dimensions: usize,
}

impl EmbeddingIndex {
    /// Pair chunks with their vectors; every vector must share one dimension
    pub fn new(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::upstream(format!(
                "Expected {} embeddings, received {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions || v.is_empty()) {
            return Err(Error::upstream(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                dimensions,
                bad.len()
            )));
        }

        Ok(Self {
            entries: chunks.into_iter().zip(vectors).collect(),
            dimensions,
        })
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector dimension (0 when empty)
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Most similar chunks first, at most `top_k`, dropping any below `min_similarity`
    ///
    /// Ties keep document order.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        min_similarity: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        if !self.is_empty() && query.len() != self.dimensions {
            return Err(Error::upstream(format!(
                "Query embedding has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut results: Vec<SearchResult> = self
            .entries
            .iter()
            .map(|(chunk, vector)| SearchResult {
                chunk: chunk.clone(),
                similarity: cosine_similarity(query, vector),
            })
            .filter(|r| min_similarity.map_or(true, |min| r.similarity >= min))
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(top_k);

        Ok(results)
    }
}

/// Cosine similarity of two vectors; zero vectors score 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Embeds chunks in sequential batches and builds an [`EmbeddingIndex`]
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed every chunk and index it
    pub async fn build(&self, chunks: Vec<Chunk>) -> Result<EmbeddingIndex> {
        let mut vectors = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embedded = self.embedder.embed_batch(&texts).await?;

            if embedded.len() != texts.len() {
                return Err(Error::upstream(format!(
                    "Expected {} embeddings, received {}",
                    texts.len(),
                    embedded.len()
                )));
            }
            vectors.extend(embedded);
        }

        tracing::debug!("Embedded {} chunks", chunks.len());
        EmbeddingIndex::new(chunks, vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::embedding::MockEmbeddingProvider;

    fn chunk(id: usize, content: &str) -> Chunk {
        Chunk {
            id,
            content: content.to_string(),
            line: Some(id as u64 + 2),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_and_truncates() {
        let index = EmbeddingIndex::new(
            vec![chunk(0, "a"), chunk(1, "b"), chunk(2, "c")],
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        )
        .unwrap();

        let results = index.search(&[1.0, 0.0], 2, None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.id, 1);
        assert_eq!(results[1].chunk.id, 2);

        let filtered = index.search(&[1.0, 0.0], 10, Some(0.5)).unwrap();
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|r| r.similarity >= 0.5));
    }

    #[test]
    fn test_ties_keep_document_order() {
        let index = EmbeddingIndex::new(
            vec![chunk(0, "a"), chunk(1, "b")],
            vec![vec![1.0], vec![1.0]],
        )
        .unwrap();

        let ids: Vec<usize> = index
            .search(&[1.0], 10, None)
            .unwrap()
            .iter()
            .map(|r| r.chunk.id)
            .collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn test_dimension_mismatches_are_upstream() {
        let err = EmbeddingIndex::new(
            vec![chunk(0, "a"), chunk(1, "b")],
            vec![vec![1.0, 0.0], vec![1.0]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));

        let index = EmbeddingIndex::new(vec![chunk(0, "a")], vec![vec![1.0, 0.0]]).unwrap();
        assert!(matches!(index.search(&[1.0], 1, None), Err(Error::Upstream(_))));
    }

    #[tokio::test]
    async fn test_builder_embeds_in_batches() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed_batch()
            .times(3)
            .returning(|texts| Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect()));

        let chunks: Vec<Chunk> = (0..5).map(|i| chunk(i, "row")).collect();
        let index = IndexBuilder::new(Arc::new(embedder), 2)
            .build(chunks)
            .await
            .unwrap();

        assert_eq!(index.len(), 5);
        assert_eq!(index.dimensions(), 2);
    }

    #[tokio::test]
    async fn test_builder_rejects_short_batches() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed_batch()
            .times(1)
            .returning(|_| Ok(vec![vec![1.0]]));

        let err = IndexBuilder::new(Arc::new(embedder), 10)
            .build(vec![chunk(0, "a"), chunk(1, "b")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
