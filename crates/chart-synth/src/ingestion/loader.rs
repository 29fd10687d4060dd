//! Loader trait and media-type registry

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::document::{media_type_essence, TEXT_CSV, TEXT_TSV};
use crate::types::{Chunk, Document};

use super::csv_loader::CsvLoader;

/// Splits a document of one format into chunks
pub trait DocumentLoader: Send + Sync {
    /// Parse the document into ordered chunks
    fn load(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Loaders keyed by media type essence (`text/csv`, ...)
#[derive(Clone, Default)]
pub struct LoaderRegistry {
    loaders: HashMap<String, Arc<dyn DocumentLoader>>,
}

impl LoaderRegistry {
    /// Registry with no loaders
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the CSV and TSV loaders
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TEXT_CSV, Arc::new(CsvLoader::new(b',')));
        registry.register(TEXT_TSV, Arc::new(CsvLoader::new(b'\t')));
        registry
    }

    /// Register (or replace) the loader for a media type
    pub fn register(&mut self, media_type: &str, loader: Arc<dyn DocumentLoader>) {
        self.loaders.insert(media_type_essence(media_type), loader);
    }

    /// Registered media types, sorted
    pub fn media_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.loaders.keys().cloned().collect();
        types.sort();
        types
    }

    /// Loader for a media type, or `UnsupportedFormat`
    pub fn get(&self, media_type: &str) -> Result<Arc<dyn DocumentLoader>> {
        self.loaders
            .get(&media_type_essence(media_type))
            .cloned()
            .ok_or_else(|| Error::unsupported_format(media_type.trim()))
    }

    /// Find the loader for a document and run it
    pub fn load(&self, document: &Document) -> Result<Vec<Chunk>> {
        let loader = self.get(&document.media_type)?;
        let chunks = loader.load(document)?;

        tracing::debug!(
            "Loaded {} chunks from {} ({})",
            chunks.len(),
            document.display_name(),
            document.essence()
        );

        Ok(chunks)
    }
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("media_types", &self.media_types())
            .finish()
    }
}
