//! Chart synthesis pipeline
//!
//! One call to [`ChartPipeline::synthesize`] runs a whole request:
//!
//! - no document: prompt -> chat model -> output parser
//! - tabular document: loader -> embedding index -> retrieval -> chat model -> output parser
//!
//! and then always renders the validated spec and formats the HTML snippet.
//! The pipeline keeps no per-request state, so one instance serves every
//! request concurrently.

use std::sync::Arc;

use crate::config::SynthConfig;
use crate::error::{Error, Result};
use crate::generation::{OutputParser, PromptBuilder};
use crate::ingestion::LoaderRegistry;
use crate::providers::{ChatModelProvider, EmbeddingProvider, OpenAiProvider};
use crate::rendering::{ChartRenderer, PlottersRenderer, SnippetGenerator};
use crate::retrieval::RetrievalEngine;
use crate::schema::ChartSchema;
use crate::types::{ChartSpec, Document, SynthesisOutput};

/// External collaborators of the pipeline
///
/// Passed in explicitly so tests can substitute fakes for every network or
/// rendering dependency.
#[derive(Clone)]
pub struct SynthesisProviders {
    pub chat: Arc<dyn ChatModelProvider>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub renderer: Arc<dyn ChartRenderer>,
}

impl SynthesisProviders {
    /// OpenAI-compatible chat and embeddings plus the plotters renderer
    pub fn from_config(config: &SynthConfig) -> Result<Self> {
        let (embedder, chat) = OpenAiProvider::new(&config.llm)?.split();
        Ok(Self {
            chat: Arc::new(chat),
            embedder: Arc::new(embedder),
            renderer: Arc::new(PlottersRenderer::new(&config.render)?),
        })
    }
}

/// Reachability of the chat and embedding services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamHealth {
    pub chat: bool,
    pub embeddings: bool,
}

/// Natural language to validated chart, image and HTML
pub struct ChartPipeline {
    schema: Arc<ChartSchema>,
    prompts: PromptBuilder,
    parser: OutputParser,
    retrieval: RetrievalEngine,
    chat: Arc<dyn ChatModelProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    renderer: Arc<dyn ChartRenderer>,
    snippets: SnippetGenerator,
}

impl ChartPipeline {
    /// Build a pipeline from configuration and explicit providers
    pub fn new(config: &SynthConfig, providers: SynthesisProviders) -> Result<Self> {
        let schema = match &config.schema_path {
            Some(path) => ChartSchema::from_file(path)?,
            None => ChartSchema::bundled()?,
        };
        tracing::info!("Chart schema {} v{} loaded", schema.name, schema.version);
        tracing::info!(
            "Providers: chat {} ({}), embeddings {}, renderer {}",
            providers.chat.name(),
            providers.chat.model(),
            providers.embedder.name(),
            providers.renderer.name()
        );

        let schema = Arc::new(schema);
        let prompts = PromptBuilder::new(&schema);
        let retrieval = RetrievalEngine::new(
            LoaderRegistry::with_defaults(),
            Arc::clone(&providers.embedder),
            Arc::clone(&providers.chat),
            prompts.clone(),
            config.retrieval.clone(),
            config.llm.embed_batch_size,
        );

        Ok(Self {
            parser: OutputParser::new(Arc::clone(&schema)),
            schema,
            prompts,
            retrieval,
            chat: providers.chat,
            embedder: providers.embedder,
            renderer: providers.renderer,
            snippets: SnippetGenerator::new(&config.snippet),
        })
    }

    /// Build a pipeline with the default providers
    pub fn from_config(config: &SynthConfig) -> Result<Self> {
        Self::new(config, SynthesisProviders::from_config(config)?)
    }

    /// Schema generated output is validated against
    pub fn schema(&self) -> &ChartSchema {
        &self.schema
    }

    /// Media types accepted on the document path
    pub fn supported_media_types(&self) -> Vec<String> {
        self.retrieval.loaders().media_types()
    }

    /// Probe the chat and embedding services
    ///
    /// A provider that errors counts as unreachable.
    pub async fn upstream_health(&self) -> UpstreamHealth {
        let chat = self.chat.health_check().await.unwrap_or(false);
        let embeddings = self.embedder.health_check().await.unwrap_or(false);
        UpstreamHealth { chat, embeddings }
    }

    /// Run one request end to end
    pub async fn synthesize(&self, question: &str, document: Option<Document>) -> Result<SynthesisOutput> {
        let spec = self.generate_spec(question, document.as_ref()).await?;
        self.render(spec).await
    }

    /// Generate and validate a chart spec without rendering it
    pub async fn generate_spec(&self, question: &str, document: Option<&Document>) -> Result<ChartSpec> {
        let raw = match document {
            None => {
                tracing::info!("Generating chart from question only");
                self.chat.complete(&self.prompts.compose(question)).await?
            }
            Some(document) => {
                tracing::info!(
                    "Generating chart grounded in {} ({})",
                    document.display_name(),
                    document.essence()
                );
                self.retrieval.answer(question, document).await?
            }
        };

        let spec = self.parser.parse(&raw)?;
        tracing::info!(
            "Validated {} chart with {} labels and {} datasets",
            spec.chart_type,
            spec.data.labels.len(),
            spec.data.datasets.len()
        );

        Ok(spec)
    }

    /// Render a validated spec and format its HTML snippet
    pub async fn render(&self, spec: ChartSpec) -> Result<SynthesisOutput> {
        let configuration = spec.configuration();
        let canvas = spec.canvas();

        let renderer = Arc::clone(&self.renderer);
        let (spec, image) = tokio::task::spawn_blocking(move || {
            let image = renderer.render(&spec);
            (spec, image)
        })
        .await
        .map_err(|e| Error::internal(format!("Render task failed: {}", e)))?;
        let image_data_url = image?;

        let embeddable_html = self.snippets.generate(&configuration, &canvas)?;

        Ok(SynthesisOutput {
            image_data_url,
            embeddable_html,
            spec,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::embedding::MockEmbeddingProvider;
    use crate::providers::llm::MockChatModelProvider;
    use crate::rendering::MockChartRenderer;
    use crate::types::ChartType;

    const TOTALS: &str = r##"```json
{
  "chartType": "bar",
  "data": {
    "labels": ["A", "B", "C"],
    "datasets": [{
      "label": "Totals",
      "data": [1, 2, 3],
      "borderColor": "#36A2EB",
      "backgroundColor": ["#36A2EB"],
      "borderWidth": 1,
      "borderRadius": 0
    }]
  }
}
```"##;

    fn silent_embedder() -> MockEmbeddingProvider {
        let mut embedder = MockEmbeddingProvider::new();
        embedder.expect_embed_batch().times(0);
        embedder.expect_embed().times(0);
        embedder
    }

    fn renderer(times: usize) -> MockChartRenderer {
        let mut renderer = MockChartRenderer::new();
        renderer
            .expect_render()
            .times(times)
            .returning(|_| Ok("data:image/png;base64,AAAA".to_string()));
        renderer.expect_name().return_const("mock");
        renderer
    }

    fn pipeline(
        mut chat: MockChatModelProvider,
        mut embedder: MockEmbeddingProvider,
        renderer: Arc<dyn ChartRenderer>,
    ) -> ChartPipeline {
        chat.expect_name().return_const("mock");
        chat.expect_model().returning(|| "mock-chat".to_string());
        embedder.expect_name().return_const("mock");
        ChartPipeline::new(
            &SynthConfig::default(),
            SynthesisProviders {
                chat: Arc::new(chat),
                embedder: Arc::new(embedder),
                renderer,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_question_only_path() {
        let mut chat = MockChatModelProvider::new();
        chat.expect_complete()
            .withf(|prompt: &str| {
                prompt.starts_with("Answer the user's question as best as possible.")
                    && prompt.ends_with("bar chart of A=1, B=2, C=3")
            })
            .times(1)
            .returning(|_| Ok(TOTALS.to_string()));

        let output = pipeline(chat, silent_embedder(), Arc::new(renderer(1)))
            .synthesize("bar chart of A=1, B=2, C=3", None)
            .await
            .unwrap();

        assert_eq!(output.spec.chart_type, ChartType::Bar);
        assert_eq!(output.spec.data.labels, vec!["A", "B", "C"]);
        assert_eq!(output.image_data_url, "data:image/png;base64,AAAA");
        assert!(output.embeddable_html.contains("new Chart(ctx, {"));
        assert!(output.embeddable_html.contains(r#"height="400" width="400""#));
    }

    #[tokio::test]
    async fn test_unsupported_document_never_reaches_the_model() {
        let mut chat = MockChatModelProvider::new();
        chat.expect_complete().times(0);

        let err = pipeline(chat, silent_embedder(), Arc::new(renderer(0)))
            .synthesize("chart it", Some(Document::new("application/pdf", "%PDF-1.4")))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_missing_chart_type_is_never_rendered() {
        let mut chat = MockChatModelProvider::new();
        chat.expect_complete()
            .times(1)
            .returning(|_| Ok(TOTALS.replace("\"chartType\": \"bar\",", "")));

        let err = pipeline(chat, silent_embedder(), Arc::new(renderer(0)))
            .synthesize("bar chart", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SchemaValidation(_)));
    }

    #[tokio::test]
    async fn test_document_path_embeds_then_asks_once() {
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_embed_batch()
            .times(1)
            .returning(|texts| Ok(texts.iter().map(|_| vec![0.5, 0.5]).collect()));
        embedder
            .expect_embed()
            .times(1)
            .returning(|_| Ok(vec![0.5, 0.5]));

        let mut chat = MockChatModelProvider::new();
        chat.expect_complete()
            .withf(|prompt: &str| prompt.contains("DOCUMENT ROWS:") && prompt.contains("region: North"))
            .times(1)
            .returning(|_| Ok(TOTALS.to_string()));

        let csv = Document::new("text/csv; charset=utf-8", "region,sales\nNorth,10\nSouth,7\n");
        let output = pipeline(chat, embedder, Arc::new(renderer(1)))
            .synthesize("sales by region", Some(csv))
            .await
            .unwrap();

        assert_eq!(output.spec.data.datasets[0].label, "Totals");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_distinct() {
        let mut chat = MockChatModelProvider::new();
        chat.expect_complete()
            .times(1)
            .returning(|_| Err(Error::upstream("HTTP 429")));

        let err = pipeline(chat, silent_embedder(), Arc::new(renderer(0)))
            .synthesize("bar chart", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_scatter_numbers_are_render_errors() {
        let mut chat = MockChatModelProvider::new();
        chat.expect_complete()
            .times(1)
            .returning(|_| Ok(TOTALS.replace("\"bar\"", "\"scatter\"")));

        let err = pipeline(chat, silent_embedder(), Arc::new(PlottersRenderer::without_text(4096)))
            .synthesize("scatter plot", None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Render(_)));
    }

    #[tokio::test]
    async fn test_real_renderer_output_is_a_png_data_url() {
        let mut chat = MockChatModelProvider::new();
        chat.expect_complete()
            .times(2)
            .returning(|_| Ok(TOTALS.to_string()));

        let pipeline = pipeline(chat, silent_embedder(), Arc::new(PlottersRenderer::without_text(4096)));
        let first = pipeline.synthesize("totals", None).await.unwrap();
        let second = pipeline.synthesize("totals", None).await.unwrap();

        assert!(first.image_data_url.starts_with("data:image/png;base64,"));
        assert_eq!(first.image_data_url, second.image_data_url);
        assert_eq!(first.embeddable_html, second.embeddable_html);
    }

    #[tokio::test]
    async fn test_upstream_health_probes_both_services() {
        let mut chat = MockChatModelProvider::new();
        chat.expect_health_check().times(1).returning(|| Ok(true));
        let mut embedder = MockEmbeddingProvider::new();
        embedder
            .expect_health_check()
            .times(1)
            .returning(|| Err(Error::upstream("connection refused")));

        let health = pipeline(chat, embedder, Arc::new(renderer(0)))
            .upstream_health()
            .await;

        assert_eq!(
            health,
            UpstreamHealth {
                chat: true,
                embeddings: false
            }
        );
    }

    #[test]
    fn test_supported_media_types() {
        let pipeline = pipeline(
            MockChatModelProvider::new(),
            MockEmbeddingProvider::new(),
            Arc::new(renderer(0)),
        );
        assert_eq!(
            pipeline.supported_media_types(),
            vec!["text/csv", "text/tab-separated-values"]
        );
        assert_eq!(pipeline.schema().name, "ChartSpec");
    }
}
