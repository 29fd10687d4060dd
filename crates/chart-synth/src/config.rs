//! Configuration for the chart synthesis service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SynthConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Chat/embedding endpoint configuration
    pub llm: LlmConfig,
    /// Document retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Raster rendering configuration
    pub render: RenderConfig,
    /// HTML snippet configuration
    pub snippet: SnippetConfig,
    /// Chart schema file overriding the bundled one
    pub schema_path: Option<PathBuf>,
}

impl SynthConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }

    /// Apply `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `PORT` from the environment
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key.trim().to_string());
            }
        }

        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            if !url.trim().is_empty() {
                self.llm.base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        if let Ok(port) = std::env::var("PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 1MB)
    pub max_upload_size: usize,
    /// Directory of static frontend assets, served with an index.html fallback
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4500,
            enable_cors: true,
            max_upload_size: 1024 * 1024, // 1MB
            static_dir: None,
        }
    }
}

/// OpenAI-compatible endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL (without trailing slash)
    pub base_url: String,
    /// Bearer API key, usually taken from `OPENAI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Chat completion model
    pub chat_model: String,
    /// Embedding model
    pub embed_model: String,
    /// Texts per embedding request
    pub embed_batch_size: usize,
    /// HTTP timeout in seconds; unset means requests are never cut short
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            chat_model: "gpt-3.5-turbo-16k".to_string(),
            embed_model: "text-embedding-ada-002".to_string(),
            embed_batch_size: 512,
            timeout_secs: None,
        }
    }
}

/// Retrieval configuration for the document path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum chunks handed to the model as context
    pub top_k: usize,
    /// Minimum cosine similarity for a chunk to be included (none = everything)
    pub min_similarity: Option<f32>,
    /// Turns kept in the per-request conversation memory
    pub memory_turns: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 100,
            min_similarity: None,
            memory_turns: 1,
        }
    }
}

/// Raster rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Largest accepted canvas edge in pixels
    pub max_dimension: u32,
    /// TrueType/OpenType font for titles, ticks and legend labels,
    /// replacing the bundled DejaVu Sans
    pub font_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_dimension: 4096,
            font_path: None,
        }
    }
}

/// Embeddable HTML snippet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Script URL of the charting library
    pub chart_js_src: String,
    /// DOM id of the generated canvas
    pub canvas_id: String,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            chart_js_src: "https://cdn.jsdelivr.net/npm/chart.js".to_string(),
            canvas_id: "myChart".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SynthConfig::default();
        assert_eq!(config.server.port, 4500);
        assert_eq!(config.server.max_upload_size, 1024 * 1024);
        assert_eq!(config.retrieval.top_k, 100);
        assert!(config.retrieval.min_similarity.is_none());
        assert!(config.llm.timeout_secs.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SynthConfig::from_toml(
            r#"
            [retrieval]
            top_k = 20
            min_similarity = 0.25

            [llm]
            chat_model = "gpt-4o-mini"
            "#,
        )
        .unwrap();

        assert_eq!(config.retrieval.top_k, 20);
        assert_eq!(config.retrieval.min_similarity, Some(0.25));
        assert_eq!(config.retrieval.memory_turns, 1);
        assert_eq!(config.llm.chat_model, "gpt-4o-mini");
        assert_eq!(config.llm.embed_model, "text-embedding-ada-002");
        assert_eq!(config.server.port, 4500);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = SynthConfig::from_toml("[server]\nport = \"not a port\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
