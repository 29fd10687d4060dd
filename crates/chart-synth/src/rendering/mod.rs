//! Chart output: raster image and embeddable HTML

pub mod colour;
pub mod raster;
pub mod snippet;

pub use raster::PlottersRenderer;
pub use snippet::SnippetGenerator;

use crate::error::Result;
use crate::types::ChartSpec;

/// Rasterizes a validated chart spec
///
/// Rendering is synchronous and CPU bound; async callers should move it off
/// the runtime threads.
#[cfg_attr(test, mockall::automock)]
pub trait ChartRenderer: Send + Sync {
    /// Render `spec` and return the image as a `data:` URL
    fn render(&self, spec: &ChartSpec) -> Result<String>;

    /// Get renderer name for logging
    fn name(&self) -> &'static str;
}
