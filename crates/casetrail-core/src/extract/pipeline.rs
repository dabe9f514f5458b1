use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::cursor::Cursor;
use super::dates::DateNormalizer;
use super::dedupe::{Deduplicator, KeyPolicy};
use super::linked::{find_reference, LinkedResolver};
use super::schema::{self, SectionSpec};
use super::table::{extract_rows, labeled_text, TableSchema};
use crate::document::Document;
use crate::network::{Fetcher, FetchResult};
use crate::record::{fields, Record, Stream};
use crate::timeline::{merge, Timeline};

/// Case metadata joined onto every exported row.
#[derive(Debug, Clone, Serialize)]
pub struct CaseSummary {
    pub number: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// A stage that degraded instead of failing the run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Degradation {
    SectionMissing { section: String },
    MalformedRows { section: String, count: usize },
    LinkedResolution { reason: String },
}

impl std::fmt::Display for Degradation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SectionMissing { section } => write!(f, "section '{section}' not found"),
            Self::MalformedRows { section, count } => {
                write!(f, "{count} malformed row(s) in '{section}'")
            }
            Self::LinkedResolution { reason } => write!(f, "linked resolution failed: {reason}"),
        }
    }
}

/// Per-run observability record: what was extracted, what was dropped,
/// and which stages degraded.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: Uuid,
    pub case_id: String,
    pub emails: usize,
    pub comments: usize,
    pub case_notes: usize,
    pub linked_notes: usize,
    pub duplicates_dropped: usize,
    pub malformed_rows: usize,
    pub undated: usize,
    pub degradations: Vec<Degradation>,
    pub produced_at: DateTime<Utc>,
}

impl CaseReport {
    #[must_use]
    fn new(case_id: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            case_id,
            emails: 0,
            comments: 0,
            case_notes: 0,
            linked_notes: 0,
            duplicates_dropped: 0,
            malformed_rows: 0,
            undated: 0,
            degradations: Vec::new(),
            produced_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.degradations.is_empty()
    }

    #[must_use]
    pub fn total_records(&self) -> usize {
        self.emails + self.comments + self.case_notes + self.linked_notes
    }
}

/// Everything one run produces. Sections and raw records are gone by
/// the time this exists; the timeline is the artifact handed onward.
#[derive(Debug)]
pub struct CaseOutput {
    pub case: CaseSummary,
    pub timeline: Timeline,
    pub report: CaseReport,
}

/// The extraction-and-merge engine for one case document.
///
/// Synchronous and single-threaded per document: every stage is a pure
/// transform over already-fetched text. The one suspension point is the
/// linked-reference fetch. No state is shared across documents, so
/// independent cases can run in parallel without locking.
pub struct CasePipeline {
    dates: DateNormalizer,
    dedupe_policy: KeyPolicy,
}

impl CasePipeline {
    #[must_use]
    pub fn new() -> Self {
        Self {
            dates: DateNormalizer::new(),
            dedupe_policy: KeyPolicy::BodyOnly,
        }
    }

    #[must_use]
    pub fn with_dedupe_policy(mut self, policy: KeyPolicy) -> Self {
        self.dedupe_policy = policy;
        self
    }

    #[must_use]
    pub fn with_dates(mut self, dates: DateNormalizer) -> Self {
        self.dates = dates;
        self
    }

    /// Fetch a case export and run the pipeline over it. Only the fetch
    /// can fail; extraction itself always degrades instead.
    pub async fn process(&self, fetcher: &dyn Fetcher, id: &str) -> FetchResult<CaseOutput> {
        let document = fetcher.fetch(id).await?;
        Ok(self.run(&document, fetcher).await)
    }

    /// Run the full pipeline over an already-fetched document.
    pub async fn run(&self, document: &Document, fetcher: &dyn Fetcher) -> CaseOutput {
        let mut report = CaseReport::new(document.id.clone());
        let mut cursor = Cursor::new(&document.content);

        let case_record = self.extract_case_record(&mut cursor, document, &mut report);

        // One deduplicator per run, threaded through every stream.
        let mut dedupe = Deduplicator::new(self.dedupe_policy);

        let emails = self.extract_table(
            &mut cursor,
            &mut report,
            &mut dedupe,
            &schema::emails(),
            &schema::email_table(),
        );
        let case_notes = self.extract_table(
            &mut cursor,
            &mut report,
            &mut dedupe,
            &schema::case_notes(),
            &schema::comment_table(Stream::CaseNote),
        );
        let comments = self.extract_table(
            &mut cursor,
            &mut report,
            &mut dedupe,
            &schema::comments(),
            &schema::comment_table(Stream::Comment),
        );

        let reference = find_reference(&case_record).map(ToString::to_string);
        let linked_notes = match &reference {
            Some(id) => {
                let resolver = LinkedResolver::new(fetcher, &self.dates);
                match resolver.resolve(id, 0).await {
                    Ok(linked) => dedupe.dedupe(linked.notes),
                    Err(error) => {
                        tracing::warn!(reference = %id, %error, "linked resolution degraded");
                        report.degradations.push(Degradation::LinkedResolution {
                            reason: error.to_string(),
                        });
                        Vec::new()
                    }
                }
            }
            None => Vec::new(),
        };

        report.emails = emails.len();
        report.case_notes = case_notes.len();
        report.comments = comments.len();
        report.linked_notes = linked_notes.len();
        report.duplicates_dropped = dedupe.dropped();

        let timeline = merge(vec![emails, case_notes, comments, linked_notes]);
        report.undated = timeline.undated();

        tracing::debug!(
            case = %document.id,
            records = report.total_records(),
            entries = timeline.len(),
            "pipeline run complete"
        );

        CaseOutput {
            case: CaseSummary {
                number: case_record
                    .field(fields::NAME)
                    .filter(|number| !number.is_empty())
                    .unwrap_or(&document.id)
                    .to_string(),
                title: case_record.field_or_empty(fields::SUBJECT).to_string(),
                description: case_record.field_or_empty(fields::BODY).to_string(),
                reference,
            },
            timeline,
            report,
        }
    }

    /// Case head: number, title, description, and the cross-reference
    /// cell, folded into a single metadata record.
    fn extract_case_record(
        &self,
        cursor: &mut Cursor<'_>,
        document: &Document,
        report: &mut CaseReport,
    ) -> Record {
        let mut record = Record::new(Stream::Case);

        match schema::case_number().locate(cursor) {
            Some(section) => {
                if let Some(number) = nth_element_text(section.body, "span", 1) {
                    record.set_field(fields::NAME, number);
                }
            }
            None => note_missing(report, &schema::case_number()),
        }

        match schema::case_title().locate(cursor) {
            Some(section) => {
                if let Some(title) = nth_element_text(section.body, "span", 1) {
                    record.set_field(fields::SUBJECT, title);
                }
            }
            None => note_missing(report, &schema::case_title()),
        }

        match schema::description().locate(cursor) {
            Some(section) => {
                record.set_field(fields::BODY, labeled_text(section.body, "Description"));
            }
            None => note_missing(report, &schema::description()),
        }

        match schema::reference().locate(cursor) {
            Some(section) => {
                if let Some(cell) = nth_element_text(section.body, "td", 0) {
                    record.set_field(fields::REFERENCE, cell);
                }
            }
            None => note_missing(report, &schema::reference()),
        }

        tracing::debug!(case = %document.id, "case head extracted");
        record
    }

    fn extract_table(
        &self,
        cursor: &mut Cursor<'_>,
        report: &mut CaseReport,
        dedupe: &mut Deduplicator,
        spec: &SectionSpec,
        table: &TableSchema,
    ) -> Vec<Record> {
        let Some(section) = spec.locate(cursor) else {
            note_missing(report, spec);
            return Vec::new();
        };

        let extraction = extract_rows(&section, table, &self.dates);
        let malformed = extraction.malformed();
        if malformed > 0 {
            report.malformed_rows += malformed;
            report.degradations.push(Degradation::MalformedRows {
                section: spec.name.to_string(),
                count: malformed,
            });
        }

        dedupe.dedupe(extraction.into_records())
    }
}

fn note_missing(report: &mut CaseReport, spec: &SectionSpec) {
    tracing::debug!(section = spec.name, "section not found, empty stream");
    report.degradations.push(Degradation::SectionMissing {
        section: spec.name.to_string(),
    });
}

impl Default for CasePipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of the nth matching element inside a section slice.
fn nth_element_text(body: &str, tag: &str, index: usize) -> Option<String> {
    let selector = scraper::Selector::parse(tag).ok()?;
    let fragment = scraper::Html::parse_fragment(body);
    let element = fragment.select(&selector).nth(index)?;

    let text = element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    Some(text)
}
