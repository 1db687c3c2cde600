pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod models;
pub mod pipeline;
pub mod record;
pub mod throttle;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::ScrapeConfig;
pub use error::AppError;
pub use graph::{GenreGraph, GraphAggregator};
pub use models::{GenreId, GenreRecord, GenreStub, RelationCategory, RelationEdge, Relations};
pub use pipeline::{PipelineEvent, PipelineReporter, ScrapeService, TracingPipelineReporter};
pub use record::{Extraction, MissingSection, assemble};
pub use traits::{Fetcher, RelationExtractor};
