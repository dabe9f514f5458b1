mod cursor;
mod dates;
mod dedupe;
mod linked;
mod pipeline;
pub mod schema;
mod table;

pub use cursor::{Anchor, Cursor, Section};
pub use dates::{DateNormalizer, KNOWN_FORMATS};
pub use dedupe::{content_hash, Deduplicator, KeyPolicy};
pub use linked::{
    find_reference, LinkedError, LinkedReport, LinkedResolver, LinkedResult, MAX_LINK_DEPTH,
    NOTE_DELIMITER, NO_REFERENCE,
};
pub use pipeline::{CaseOutput, CasePipeline, CaseReport, CaseSummary, Degradation};
pub use table::{
    extract_rows, RowClass, RowOutcome, SkipReason, TableExtraction, TableSchema,
};
