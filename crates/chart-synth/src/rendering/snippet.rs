//! Embeddable HTML snippet for a chart

use crate::config::SnippetConfig;
use crate::error::Result;
use crate::types::{CanvasOptions, ChartConfiguration};

/// Formats a chart configuration as a self-contained HTML fragment
///
/// The fragment loads the charting library from `chart_js_src` and draws the
/// same configuration the raster renderer received.
#[derive(Debug, Clone)]
pub struct SnippetGenerator {
    chart_js_src: String,
    canvas_id: String,
}

impl SnippetGenerator {
    pub fn new(config: &SnippetConfig) -> Self {
        Self {
            chart_js_src: config.chart_js_src.clone(),
            canvas_id: config.canvas_id.clone(),
        }
    }

    /// Build the pretty-printed HTML fragment
    pub fn generate(&self, configuration: &ChartConfiguration, canvas: &CanvasOptions) -> Result<String> {
        let json = serde_json::to_string_pretty(configuration)?;
        // Keep the JSON from closing the surrounding <script>
        let json = indent(&json.replace("</", "<\\/"), "    ");
        let id = escape_attr(&self.canvas_id);

        Ok(format!(
            r#"<div>
  <canvas id="{id}" height="{height}" width="{width}" style="background-color:{background}"></canvas>
</div>

<script src="{src}"></script>

<script>
  const ctx = document.getElementById('{script_id}');
  new Chart(ctx, {json});
</script>
"#,
            id = id,
            height = canvas.height,
            width = canvas.width,
            background = escape_attr(&canvas.background_colour),
            src = escape_attr(&self.chart_js_src),
            script_id = self.canvas_id.replace('\\', "\\\\").replace('\'', "\\'"),
            json = json.trim_start(),
        ))
    }
}

/// Indent every line after the first
fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
