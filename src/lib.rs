pub mod catalog;
pub mod checkpoint;
pub mod fetch;
pub mod images;
pub mod normalize;
pub mod parse;
pub mod pipeline;
pub mod source;
pub mod tcg;
pub mod tracing;

pub mod util {
    pub mod env;
}

pub use catalog::db::Db;
pub use pipeline::{IngestOptions, RunSummary, SeriesIngestor};
pub use tcg::Tcg;
