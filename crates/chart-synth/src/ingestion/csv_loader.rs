//! Delimited-text loader: one chunk per record

use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

use super::loader::DocumentLoader;

/// Loads CSV-like documents
///
/// Each record becomes one chunk whose content pairs every value with its
/// column header, one `header: value` line per column.
#[derive(Debug, Clone, Copy)]
pub struct CsvLoader {
    delimiter: u8,
}

impl CsvLoader {
    /// Create a loader for a field delimiter
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl DocumentLoader for CsvLoader {
    fn load(&self, document: &Document) -> Result<Vec<Chunk>> {
        let media_type = document.essence();
        let parse_error = |message: String| Error::document_parse(media_type.clone(), message);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(document.bytes.as_ref());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| parse_error(format!("failed to read header row: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(parse_error("document has no header row".to_string()));
        }

        let mut chunks = Vec::new();
        for (id, result) in reader.records().enumerate() {
            let record = result.map_err(|e| parse_error(format!("record {}: {}", id + 1, e)))?;

            let content = headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| format!("{}: {}", header, value.trim()))
                .collect::<Vec<_>>()
                .join("\n");

            chunks.push(Chunk {
                id,
                content,
                line: record.position().map(|p| p.line()),
            });
        }

        if chunks.is_empty() {
            return Err(parse_error("document contains no records".to_string()));
        }

        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::{TEXT_CSV, TEXT_TSV};

    #[test]
    fn test_one_chunk_per_record() {
        let doc = Document::new(TEXT_CSV, "region,sales\nNorth,10\nSouth,7\n");
        let chunks = CsvLoader::default().load(&doc).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, 0);
        assert_eq!(chunks[0].content, "region: North\nsales: 10");
        assert_eq!(chunks[0].line, Some(2));
        assert_eq!(chunks[1].content, "region: South\nsales: 7");
        assert_eq!(chunks[1].line, Some(3));
    }

    #[test]
    fn test_quoted_fields() {
        let doc = Document::new(TEXT_CSV, "name,notes\n\"Smith, J\",\"multi\nline\"\nLee,x\n");
        let chunks = CsvLoader::default().load(&doc).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "name: Smith, J\nnotes: multi\nline");
        assert_eq!(chunks[1].line, Some(4));
    }

    #[test]
    fn test_tab_separated() {
        let doc = Document::new(TEXT_TSV, "a\tb\n1\t2\n");
        let chunks = CsvLoader::new(b'\t').load(&doc).unwrap();
        assert_eq!(chunks[0].content, "a: 1\nb: 2");
    }

    #[test]
    fn test_ragged_rows_are_parse_errors() {
        let doc = Document::new(TEXT_CSV, "a,b\n1,2\n3\n");
        let err = CsvLoader::default().load(&doc).unwrap_err();

        match err {
            Error::DocumentParse { media_type, .. } => assert_eq!(media_type, TEXT_CSV),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_documents_are_parse_errors() {
        for body in ["", "a,b\n"] {
            let doc = Document::new(TEXT_CSV, body);
            assert!(matches!(
                CsvLoader::default().load(&doc),
                Err(Error::DocumentParse { .. })
            ));
        }
    }
}
