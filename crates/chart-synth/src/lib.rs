//! chart-synth: natural-language chart generation
//!
//! Turns a question, optionally grounded in an uploaded CSV document, into a
//! schema-validated Chart.js definition, a rendered PNG data URL and an
//! embeddable HTML snippet. Model output is never trusted: it is parsed and
//! checked against a data-driven chart schema before anything is rendered.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod rendering;
pub mod retrieval;
pub mod schema;
pub mod server;
pub mod types;

pub use config::SynthConfig;
pub use error::{Error, Result};
pub use pipeline::{ChartPipeline, SynthesisProviders};
pub use schema::ChartSchema;
pub use types::{
    document::{Chunk, Document},
    chart::{ChartSpec, ChartType},
    response::{GenerateResponse, SynthesisOutput},
};
