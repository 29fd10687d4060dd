//! Client for OpenAI-compatible chat completion and embedding endpoints

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

/// Sampling temperature for chart generation
const CHAT_TEMPERATURE: f32 = 0.0;

/// OpenAI-compatible API client
///
/// Each call is a single attempt; a failed call surfaces as [`Error::Upstream`].
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let mut builder = Client::builder().pool_max_idle_per_host(5);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Chat model name
    pub fn chat_model(&self) -> &str {
        &self.config.chat_model
    }

    fn post(&self, endpoint: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let request = self.client.post(url);
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Check if the endpoint answers
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        let mut request = self.client.get(&url);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Send a single-message chat completion and return the reply text
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.chat_model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: CHAT_TEMPERATURE,
        };

        let response = self
            .post("chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("Chat request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(format!(
                "Chat completion failed: HTTP {}: {}",
                status,
                truncate(&body, 300)
            )));
        }

        let result: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("Failed to parse chat response: {}", e)))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::upstream("Chat response contained no message"))
    }

    /// Embed a batch of texts, returning vectors in input order
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: &self.config.embed_model,
            input: texts,
        };

        let response = self
            .post("embeddings")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(format!(
                "Embedding failed: HTTP {}: {}",
                status,
                truncate(&body, 300)
            )));
        }

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::upstream(format!("Failed to parse embedding response: {}", e)))?;

        order_embeddings(result.data, texts.len())
    }
}

/// Sort embeddings by their `index` and check one came back per input
fn order_embeddings(mut data: Vec<EmbedData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(Error::upstream(format!(
            "Expected {} embeddings, received {}",
            expected,
            data.len()
        )));
    }

    data.sort_by_key(|d| d.index);
    if data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(Error::upstream("Embedding response indices are not contiguous"));
    }

    Ok(data.into_iter().map(|d| d.embedding).collect())
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-3.5-turbo-16k",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: CHAT_TEMPERATURE,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-3.5-turbo-16k");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["temperature"], 0.0);
    }

    #[test]
    fn test_chat_response_parsing() {
        let raw = r#"{"id": "x", "choices": [{"index": 0, "message": {"role": "assistant", "content": "{}"}, "finish_reason": "stop"}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{}"));
    }

    #[test]
    fn test_embeddings_are_ordered_by_index() {
        let data = vec![
            EmbedData {
                index: 1,
                embedding: vec![1.0],
            },
            EmbedData {
                index: 0,
                embedding: vec![0.0],
            },
        ];

        let ordered = order_embeddings(data, 2).unwrap();
        assert_eq!(ordered, vec![vec![0.0], vec![1.0]]);
    }

    #[test]
    fn test_embedding_count_mismatch_is_upstream() {
        let data = vec![EmbedData {
            index: 0,
            embedding: vec![0.0],
        }];
        assert!(matches!(order_embeddings(data, 2), Err(Error::Upstream(_))));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upstream_error() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: Some(2),
            ..LlmConfig::default()
        };
        let client = OpenAiClient::new(&config).unwrap();

        let err = client.chat("hello").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
        assert!(client.embed_batch(&[]).await.unwrap().is_empty());
    }
}
