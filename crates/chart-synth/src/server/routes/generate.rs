//! Chart generation endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::document::media_type_essence;
use crate::types::{Document, GenerateResponse};

const OCTET_STREAM: &str = "application/octet-stream";

/// POST /api/generate - Generate a chart from a prompt and optional document
pub async fn generate_chart(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<GenerateResponse>> {
    let mut prompt = None;
    let mut document = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "prompt" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::BadRequest(format!("Failed to read prompt: {}", e)))?;
                prompt = Some(text);
            }
            "file" => {
                let filename = field.file_name().map(|s| s.to_string());
                let declared = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| Error::BadRequest(format!("Failed to read file: {}", e)))?;

                // Browsers send an empty, unnamed part for an untouched file input
                if data.is_empty() && filename.as_deref().unwrap_or("").is_empty() {
                    continue;
                }

                let media_type = resolve_media_type(declared.as_deref(), filename.as_deref());
                tracing::info!(
                    "Received file: {} ({}, {} bytes)",
                    filename.as_deref().unwrap_or("<unnamed>"),
                    media_type,
                    data.len()
                );

                let mut doc = Document::new(media_type, data);
                if let Some(filename) = filename {
                    doc = doc.with_filename(filename);
                }
                document = Some(doc);
            }
            other => {
                tracing::debug!("Ignoring multipart field '{}'", other);
            }
        }
    }

    let prompt = prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::BadRequest("Missing 'prompt' field".to_string()))?;

    let output = state.pipeline().synthesize(&prompt, document).await?;

    Ok(Json(GenerateResponse::from_output(prompt, output)))
}

/// Declared content type, or a guess from the filename when the client sent
/// none or a generic one
fn resolve_media_type(declared: Option<&str>, filename: Option<&str>) -> String {
    if let Some(declared) = declared {
        let essence = media_type_essence(declared);
        if !essence.is_empty() && essence != OCTET_STREAM {
            return declared.to_string();
        }
    }

    filename
        .and_then(|name| mime_guess::from_path(name).first_raw())
        .unwrap_or(OCTET_STREAM)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_wins() {
        assert_eq!(
            resolve_media_type(Some("text/csv; charset=utf-8"), Some("data.txt")),
            "text/csv; charset=utf-8"
        );
    }

    #[test]
    fn test_generic_type_falls_back_to_filename() {
        assert_eq!(resolve_media_type(Some(OCTET_STREAM), Some("sales.csv")), "text/csv");
        assert_eq!(resolve_media_type(None, Some("sales.tsv")), "text/tab-separated-values");
        assert_eq!(resolve_media_type(None, Some("report.pdf")), "application/pdf");
        assert_eq!(resolve_media_type(None, None), OCTET_STREAM);
    }
}
