//! Document loading: uploaded bytes to embeddable chunks

mod csv_loader;
mod loader;

pub use csv_loader::CsvLoader;
pub use loader::{DocumentLoader, LoaderRegistry};
