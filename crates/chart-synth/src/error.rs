//! Error types for the chart synthesis pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for chart synthesis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Chart synthesis errors
///
/// The first four variants are the pipeline's own failure kinds. They are kept
/// distinct all the way to the transport so callers can tell a bad upload from
/// a bad model answer or an upstream outage.
#[derive(Debug, Error)]
pub enum Error {
    /// Document media type has no registered loader
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Generated text does not parse into a valid chart spec
    #[error("Chart spec validation failed: {0}")]
    SchemaValidation(String),

    /// Chat or embedding service call failed
    #[error("Upstream service error: {0}")]
    Upstream(String),

    /// Valid-per-schema spec could not be rendered
    #[error("Render error: {0}")]
    Render(String),

    /// Document bytes could not be read as the declared format
    #[error("Failed to parse {media_type} document: {message}")]
    DocumentParse { media_type: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed client request (transport layer)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unsupported format error
    pub fn unsupported_format(media_type: impl Into<String>) -> Self {
        Self::UnsupportedFormat(media_type.into())
    }

    /// Create a schema validation error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaValidation(message.into())
    }

    /// Create an upstream service error
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Create a render error
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Create a document parse error
    pub fn document_parse(media_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DocumentParse {
            media_type: media_type.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::SchemaValidation(_) => "schema_validation",
            Error::Upstream(_) => "upstream_error",
            Error::Render(_) => "render_error",
            Error::DocumentParse { .. } => "parse_error",
            Error::Config(_) => "config_error",
            Error::BadRequest(_) => "bad_request",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status the transport reports for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::SchemaValidation(_) | Error::Render(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::DocumentParse { .. } | Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::warn!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_kinds_map_to_distinct_statuses() {
        assert_eq!(
            Error::unsupported_format("application/pdf").status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            Error::schema("missing chartType").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(Error::upstream("quota").status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(Error::render("radar").kind(), "render_error");
    }

    #[test]
    fn test_serialization_failures_are_server_errors() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.kind(), "json_error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_document_parse_message() {
        let err = Error::document_parse("text/csv", "unequal row lengths");
        assert_eq!(
            err.to_string(),
            "Failed to parse text/csv document: unequal row lengths"
        );
    }
}
