//! Pipeline and HTTP response types

use serde::{Deserialize, Serialize};

use super::chart::ChartSpec;

/// Result of one synthesis request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisOutput {
    /// Rendered chart as a `data:image/png;base64,...` URL
    pub image_data_url: String,
    /// Pretty-printed HTML fragment drawing the same chart in a browser
    pub embeddable_html: String,
    /// The validated spec both outputs were produced from
    pub spec: ChartSpec,
}

/// Body of `POST /api/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Chart image data URL
    pub chart: String,
    /// The prompt as submitted
    pub prompt: String,
    /// Embeddable HTML snippet
    pub code: String,
}

impl GenerateResponse {
    /// Build the HTTP body from a pipeline result
    pub fn from_output(prompt: String, output: SynthesisOutput) -> Self {
        Self {
            chart: output.image_data_url,
            prompt,
            code: output.embeddable_html,
        }
    }
}
