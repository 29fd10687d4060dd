//! Uploaded document and chunk types

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Media type for comma-separated values
pub const TEXT_CSV: &str = "text/csv";
/// Media type for tab-separated values
pub const TEXT_TSV: &str = "text/tab-separated-values";

/// An uploaded document, alive for one request
#[derive(Debug, Clone)]
pub struct Document {
    /// Declared media type as received (e.g. `text/csv; charset=utf-8`)
    pub media_type: String,
    /// Raw document bytes
    pub bytes: Bytes,
    /// Original filename, when the client sent one
    pub filename: Option<String>,
}

impl Document {
    /// Create a document from a media type and its bytes
    pub fn new(media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
            filename: None,
        }
    }

    /// Attach the original filename
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Media type without parameters, lowercased
    pub fn essence(&self) -> String {
        media_type_essence(&self.media_type)
    }

    /// Name used in log lines
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("<upload>")
    }
}

/// Strip parameters and normalize case: `Text/CSV; charset=utf-8` -> `text/csv`
pub fn media_type_essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// One logical record of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the record in the document (0-based)
    pub id: usize,
    /// Text handed to the embedding model and the prompt
    pub content: String,
    /// 1-based line where the record starts
    pub line: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_essence() {
        assert_eq!(media_type_essence("Text/CSV; charset=utf-8"), "text/csv");
        assert_eq!(media_type_essence("  application/pdf "), "application/pdf");
        assert_eq!(media_type_essence(""), "");
    }

    #[test]
    fn test_document_essence() {
        let doc = Document::new("text/csv;header=present", "a,b\n1,2\n").with_filename("x.csv");
        assert_eq!(doc.essence(), TEXT_CSV);
        assert_eq!(doc.display_name(), "x.csv");
    }
}
