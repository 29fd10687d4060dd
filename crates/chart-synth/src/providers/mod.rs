//! Provider abstractions for chat completion and embeddings
//!
//! The pipeline only talks to these traits, so the OpenAI-compatible backend
//! can be swapped for another service or for mocks in tests.

pub mod embedding;
pub mod llm;
pub mod openai;

pub use embedding::EmbeddingProvider;
pub use llm::ChatModelProvider;
pub use openai::{OpenAiChat, OpenAiEmbedder, OpenAiProvider};
