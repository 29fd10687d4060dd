//! Document-grounded answering: embedding index, similarity search and memory

pub mod engine;
pub mod index;
pub mod memory;

pub use engine::RetrievalEngine;
pub use index::{cosine_similarity, EmbeddingIndex, IndexBuilder};
pub use memory::{ConversationMemory, Turn};

use crate::types::Chunk;

/// Search result with chunk and similarity
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query (-1.0..=1.0, higher is better)
    pub similarity: f32,
}
