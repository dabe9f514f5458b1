pub mod document;
pub mod error;
pub mod extract;
pub mod network;
pub mod record;
pub mod sink;
pub mod timeline;

pub use document::Document;
pub use error::{Error, Result};
pub use extract::{
    CaseOutput, CasePipeline, CaseReport, CaseSummary, DateNormalizer, Deduplicator, KeyPolicy,
};
pub use network::{DirFetcher, FetchError, FetchResult, Fetcher, HttpFetcher};
pub use record::{fields, Record, Stream};
pub use sink::{CsvSink, RecordSink, SinkError, SinkResult};
pub use timeline::{business_days_between, merge, Gap, Timeline, TimelineEntry};
