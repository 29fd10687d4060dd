//! Core data types for chart synthesis

pub mod chart;
pub mod document;
pub mod response;

pub use chart::{
    AxisScale, CanvasOptions, ChartConfiguration, ChartData, ChartOptions, ChartSpec, ChartType,
    Dataset, IndexAxis, Legend, LegendPosition, Plugins, Scales, Title,
};
pub use document::{Chunk, Document};
pub use response::{GenerateResponse, SynthesisOutput};
