use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use crate::extract::CaseSummary;
use crate::record::fields;
use crate::timeline::Timeline;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Flattened output columns, one row per timeline entry.
pub const COLUMNS: &[&str] = &[
    "case_number",
    "case_title",
    "stream",
    "sender",
    "subject",
    "date",
    "gap",
    "body",
];

/// Persists a case's timeline as flattened key-value rows.
pub trait RecordSink {
    fn write_case(&mut self, case: &CaseSummary, timeline: &Timeline) -> SinkResult<()>;
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Delimited output for spreadsheet tools. Record content routinely
/// carries non-ASCII text, so the file opens with a UTF-8 byte-order
/// mark; without it common spreadsheet imports mis-decode the bytes.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvSink<BufWriter<File>> {
    pub fn create(path: &Path) -> SinkResult<Self> {
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(UTF8_BOM)?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
        })
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writer(mut inner: W) -> SinkResult<Self> {
        inner.write_all(UTF8_BOM)?;
        Ok(Self {
            writer: csv::Writer::from_writer(inner),
        })
    }

    pub fn into_inner(self) -> SinkResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(std::io::Error::other(e.to_string())))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_case(&mut self, case: &CaseSummary, timeline: &Timeline) -> SinkResult<()> {
        self.writer.write_record(COLUMNS)?;

        for entry in timeline.iter() {
            let record = &entry.record;
            let gap = entry.gap.to_string();

            self.writer.write_record([
                case.number.as_str(),
                case.title.as_str(),
                record.stream.as_str(),
                record.field_or_empty(fields::SENDER),
                record.field_or_empty(fields::SUBJECT),
                record.field_or_empty(fields::DATE),
                gap.as_str(),
                record.field_or_empty(fields::BODY),
            ])?;
        }

        self.writer.flush()?;
        Ok(())
    }
}
