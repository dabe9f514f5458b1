use regex::Regex;
use thiserror::Error;

use super::cursor::Cursor;
use super::dates::DateNormalizer;
use super::schema;
use super::table::labeled_text;
use crate::document::Document;
use crate::network::{FetchError, Fetcher};
use crate::record::{fields, Record, Stream};

#[derive(Debug, Error)]
pub enum LinkedError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

pub type LinkedResult<T> = Result<T, LinkedError>;

/// Sentinel field value meaning "no cross-reference".
pub const NO_REFERENCE: &str = "none";

/// Each note in the log opens with this token.
pub const NOTE_DELIMITER: &str = "Appended by:";

/// Linked reports could reference each other; resolution stops after
/// one hop so a reference cycle cannot recurse unboundedly.
pub const MAX_LINK_DEPTH: usize = 1;

/// Cross-reference identifier from a record's reference field, or
/// `None` when the field is absent, blank, the sentinel, or not shaped
/// like an identifier.
#[must_use]
pub fn find_reference(record: &Record) -> Option<&str> {
    let value = record.field(fields::REFERENCE)?.trim();

    if value.is_empty() || value.eq_ignore_ascii_case(NO_REFERENCE) {
        return None;
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(value)
}

/// A resolved linked report: its description plus the segmented notes
/// log, every note tagged `linked-note`.
#[derive(Debug, Clone, Default)]
pub struct LinkedReport {
    pub reference: String,
    pub description: Option<String>,
    pub notes: Vec<Record>,
}

impl LinkedReport {
    #[must_use]
    pub fn empty(reference: String) -> Self {
        Self {
            reference,
            ..Self::default()
        }
    }
}

/// Fetches a cross-referenced report and runs the extraction pipeline
/// against its section schema.
pub struct LinkedResolver<'a> {
    fetcher: &'a dyn Fetcher,
    dates: &'a DateNormalizer,
    note_header: Option<Regex>,
}

impl<'a> LinkedResolver<'a> {
    #[must_use]
    pub fn new(fetcher: &'a dyn Fetcher, dates: &'a DateNormalizer) -> Self {
        Self {
            fetcher,
            dates,
            note_header: Regex::new(r"by:\s*(?P<sender>.+?)\s+On:\s*(?P<date>[^=\n]+)").ok(),
        }
    }

    /// Resolve one reference at the given recursion depth. Depth at or
    /// past [`MAX_LINK_DEPTH`] yields an empty report rather than
    /// another fetch.
    pub async fn resolve(&self, reference: &str, depth: usize) -> LinkedResult<LinkedReport> {
        if depth >= MAX_LINK_DEPTH {
            tracing::warn!(reference, depth, "link depth cap reached, not resolving");
            return Ok(LinkedReport::empty(reference.to_string()));
        }

        let document = self.fetcher.fetch(reference).await?;
        Ok(self.extract(&document))
    }

    fn extract(&self, document: &Document) -> LinkedReport {
        let mut cursor = Cursor::new(&document.content);

        let description = schema::linked_description()
            .locate(&mut cursor)
            .map(|section| labeled_text(section.body, "DESCRIPTION"));

        let notes = match schema::linked_notes().locate(&mut cursor) {
            Some(section) => self.segment_notes(&labeled_text(section.body, "NOTES")),
            None => {
                tracing::warn!(id = %document.id, "linked report has no notes log");
                Vec::new()
            }
        };

        LinkedReport {
            reference: document.id.clone(),
            description,
            notes,
        }
    }

    /// Split the notes log on the repeating delimiter: one record per
    /// delimiter occurrence, a leading record when content precedes the
    /// first delimiter, and a final record for the unterminated segment
    /// after the last one.
    fn segment_notes(&self, log: &str) -> Vec<Record> {
        let mut notes = Vec::new();
        let mut segments = log.split(NOTE_DELIMITER);

        if let Some(preamble) = segments.next() {
            let preamble = preamble.trim();
            if !preamble.is_empty() {
                notes.push(self.note_record(preamble.to_string()));
            }
        }

        for segment in segments {
            notes.push(self.note_record(format!("{NOTE_DELIMITER}{}", segment.trim_end())));
        }

        notes
    }

    fn note_record(&self, body: String) -> Record {
        let mut record = Record::new(Stream::LinkedNote);

        if let Some(captures) = self
            .note_header
            .as_ref()
            .and_then(|header| header.captures(&body))
        {
            if let Some(sender) = captures.name("sender") {
                record.set_field(fields::SENDER, sender.as_str().trim());
            }
            if let Some(date) = captures.name("date") {
                let date = date.as_str().trim();
                record.set_field(fields::DATE, date);
                record.timestamp = self.dates.parse(date);
            }
        }

        record.set_field(fields::BODY, body);
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StaticFetcher {
        documents: HashMap<String, String>,
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, id: &str) -> Result<Document, FetchError> {
            self.documents
                .get(id)
                .map(|content| Document::new(id.to_string(), content.clone()))
                .ok_or_else(|| FetchError::NotFound(id.to_string()))
        }
    }

    const LINKED_REPORT: &str = "\
        <html>DESCRIPTION\n<pre>Editor crashes when saving large files.</pre>\n\
        NOTES\nTriaged to the storage team.\n\
        Appended by: grace On: 30/07/2024 11:00 ====\nReproduced on 4.2.\n\
        Appended by: henry On: 31/07/2024 09:30 ====\nFix merged.\n\
        AUDIT TRAIL\nignored</html>";

    fn resolver_fixture() -> StaticFetcher {
        StaticFetcher {
            documents: HashMap::from([("12345".to_string(), LINKED_REPORT.to_string())]),
        }
    }

    #[test]
    fn test_find_reference_rules() {
        let with = |value: &str| Record::new(Stream::Case).with_field(fields::REFERENCE, value);

        assert_eq!(find_reference(&with("12345")), Some("12345"));
        assert_eq!(find_reference(&with("  12345  ")), Some("12345"));
        assert_eq!(find_reference(&with("")), None);
        assert_eq!(find_reference(&with("none")), None);
        assert_eq!(find_reference(&with("None")), None);
        assert_eq!(find_reference(&with("TICKET-9")), None);
        assert_eq!(find_reference(&Record::new(Stream::Case)), None);
    }

    #[tokio::test]
    async fn test_resolve_segments_notes() {
        let fetcher = resolver_fixture();
        let dates = DateNormalizer::new();
        let resolver = LinkedResolver::new(&fetcher, &dates);

        let report = resolver.resolve("12345", 0).await.unwrap();

        // two delimiter occurrences plus the leading segment
        assert_eq!(report.notes.len(), 3);
        assert!(report.notes.iter().all(|n| n.stream == Stream::LinkedNote));

        assert_eq!(report.notes[0].field(fields::SENDER), None);
        assert!(!report.notes[0].is_dated());

        assert_eq!(report.notes[1].field(fields::SENDER), Some("grace"));
        assert!(report.notes[1].is_dated());
        assert!(report.notes[1]
            .field_or_empty(fields::BODY)
            .contains("Reproduced on 4.2."));

        assert_eq!(report.notes[2].field(fields::SENDER), Some("henry"));
        assert!(report.notes[2].is_dated());
    }

    #[tokio::test]
    async fn test_resolve_extracts_description() {
        let fetcher = resolver_fixture();
        let dates = DateNormalizer::new();
        let resolver = LinkedResolver::new(&fetcher, &dates);

        let report = resolver.resolve("12345", 0).await.unwrap();

        assert_eq!(
            report.description.as_deref(),
            Some("Editor crashes when saving large files.")
        );
    }

    #[tokio::test]
    async fn test_depth_cap_stops_resolution() {
        let fetcher = resolver_fixture();
        let dates = DateNormalizer::new();
        let resolver = LinkedResolver::new(&fetcher, &dates);

        let report = resolver.resolve("12345", MAX_LINK_DEPTH).await.unwrap();

        assert!(report.notes.is_empty());
        assert!(report.description.is_none());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_an_error() {
        let fetcher = StaticFetcher {
            documents: HashMap::new(),
        };
        let dates = DateNormalizer::new();
        let resolver = LinkedResolver::new(&fetcher, &dates);

        assert!(resolver.resolve("99999", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_notes_section_degrades_to_empty() {
        let fetcher = StaticFetcher {
            documents: HashMap::from([(
                "777".to_string(),
                "<html>DESCRIPTION only, log truncated</html>".to_string(),
            )]),
        };
        let dates = DateNormalizer::new();
        let resolver = LinkedResolver::new(&fetcher, &dates);

        let report = resolver.resolve("777", 0).await.unwrap();

        assert!(report.notes.is_empty());
    }
}
