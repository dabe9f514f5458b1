use scraper::{ElementRef, Html, Selector};

use super::cursor::Section;
use super::dates::DateNormalizer;
use crate::record::{Record, Stream};

/// Shape of one section's row data.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub stream: Stream,
    /// Field name per cell, in cell order. Empty means field names are
    /// taken from a detected header row.
    pub columns: &'static [&'static str],
    pub expected_cells: usize,
    /// Cell width markers that tag a genuine data row. Enforced only
    /// when the row actually carries width markup, so exports that
    /// dropped the attribute still extract on cell count alone.
    pub width_signature: Option<&'static [&'static str]>,
    /// Header row cell texts, matched case-insensitively.
    pub header_labels: Option<&'static [&'static str]>,
    /// Message bodies live in a following `td[colspan] > div` rather
    /// than an inline cell; attach them to the preceding data row.
    pub sibling_bodies: Option<&'static str>,
    /// Field parsed into the record timestamp.
    pub date_field: Option<&'static str>,
}

/// Row taxonomy decided by the classifier, one variant per shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Header,
    Data,
    Continuation,
    Separator,
}

/// Why a row produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Header,
    Separator,
    CellCountMismatch { expected: usize, found: usize },
    WidthMismatch,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Header => write!(f, "header row"),
            Self::Separator => write!(f, "separator row"),
            Self::CellCountMismatch { expected, found } => {
                write!(f, "expected {expected} cells, found {found}")
            }
            Self::WidthMismatch => write!(f, "cell widths do not match the data-row signature"),
        }
    }
}

/// Tagged result of one row-level attempt, so diagnostics survive the
/// lenient contract instead of vanishing into silent skips.
#[derive(Debug, Clone)]
pub enum RowOutcome {
    Accepted(Record),
    Skipped(SkipReason),
}

/// All row outcomes for one section, in document order.
#[derive(Debug, Default)]
pub struct TableExtraction {
    pub rows: Vec<RowOutcome>,
}

impl TableExtraction {
    /// Rows that failed the structural predicate; header and separator
    /// rows are expected and not counted here.
    #[must_use]
    pub fn malformed(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| {
                matches!(
                    row,
                    RowOutcome::Skipped(
                        SkipReason::CellCountMismatch { .. } | SkipReason::WidthMismatch
                    )
                )
            })
            .count()
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.rows
            .into_iter()
            .filter_map(|row| match row {
                RowOutcome::Accepted(record) => Some(record),
                RowOutcome::Skipped(_) => None,
            })
            .collect()
    }
}

struct Cell {
    text: String,
    width: Option<String>,
    colspan: bool,
}

/// Extract typed records from the row-like elements of a section slice.
///
/// Tolerant by design: rows that fail the structural predicate are
/// skipped with a reason, a missing header falls back to the schema's
/// column names, and date cells that match no known layout leave the
/// timestamp unset.
#[must_use]
pub fn extract_rows(
    section: &Section<'_>,
    schema: &TableSchema,
    dates: &DateNormalizer,
) -> TableExtraction {
    let Some(row_selector) = Selector::parse("tr").ok() else {
        return TableExtraction::default();
    };
    let Some(cell_selector) = Selector::parse("td").ok() else {
        return TableExtraction::default();
    };
    let Some(rule_selector) = Selector::parse("hr").ok() else {
        return TableExtraction::default();
    };

    let fragment = Html::parse_fragment(section.body);
    let mut extraction = TableExtraction::default();
    let mut header_fields: Option<Vec<String>> = None;
    let mut last_data_row: Option<usize> = None;

    for row in fragment.select(&row_selector) {
        let cells: Vec<Cell> = row
            .select(&cell_selector)
            .map(|td| Cell {
                text: collapsed_text(td),
                width: cell_width(td),
                colspan: td.value().attr("colspan").is_some(),
            })
            .collect();

        match classify(&row, &cells, schema, &rule_selector) {
            RowClass::Separator => extraction.rows.push(RowOutcome::Skipped(SkipReason::Separator)),
            RowClass::Header => {
                if schema.columns.is_empty() {
                    header_fields =
                        Some(cells.iter().map(|cell| field_name(&cell.text)).collect());
                }
                extraction.rows.push(RowOutcome::Skipped(SkipReason::Header));
            }
            RowClass::Continuation => {
                attach_body(&mut extraction, last_data_row, schema, &row);
            }
            RowClass::Data => {
                if cells.len() != schema.expected_cells {
                    extraction
                        .rows
                        .push(RowOutcome::Skipped(SkipReason::CellCountMismatch {
                            expected: schema.expected_cells,
                            found: cells.len(),
                        }));
                    continue;
                }
                if !width_guard_passes(&cells, schema) {
                    extraction
                        .rows
                        .push(RowOutcome::Skipped(SkipReason::WidthMismatch));
                    continue;
                }

                let record = build_record(&cells, schema, header_fields.as_deref(), dates);
                last_data_row = Some(extraction.rows.len());
                extraction.rows.push(RowOutcome::Accepted(record));
            }
        }
    }

    extraction
}

fn classify(
    row: &ElementRef<'_>,
    cells: &[Cell],
    schema: &TableSchema,
    rule_selector: &Selector,
) -> RowClass {
    if cells.is_empty()
        || row.select(rule_selector).next().is_some()
        || cells.iter().all(|cell| cell.text.is_empty() && !cell.colspan)
    {
        return RowClass::Separator;
    }

    if schema.sibling_bodies.is_some() && cells.len() == 1 && cells[0].colspan {
        return RowClass::Continuation;
    }

    if let Some(labels) = schema.header_labels {
        if cells.len() == labels.len()
            && cells
                .iter()
                .zip(labels)
                .all(|(cell, label)| cell.text.eq_ignore_ascii_case(label))
        {
            return RowClass::Header;
        }
    }

    RowClass::Data
}

/// Width guard: cell-count matching admits false positives when an
/// unrelated row shares the table width, so width markers are an
/// additional predicate whenever the markup carries them.
fn width_guard_passes(cells: &[Cell], schema: &TableSchema) -> bool {
    let Some(signature) = schema.width_signature else {
        return true;
    };
    if cells.iter().all(|cell| cell.width.is_none()) {
        return true;
    }

    cells.len() == signature.len()
        && cells
            .iter()
            .zip(signature)
            .all(|(cell, expected)| cell.width.as_deref() == Some(*expected))
}

fn build_record(
    cells: &[Cell],
    schema: &TableSchema,
    header_fields: Option<&[String]>,
    dates: &DateNormalizer,
) -> Record {
    let mut record = Record::new(schema.stream);

    for (index, cell) in cells.iter().enumerate() {
        let name = if schema.columns.is_empty() {
            header_fields
                .and_then(|names| names.get(index))
                .cloned()
                .unwrap_or_else(|| format!("column_{index}"))
        } else {
            schema.columns[index].to_string()
        };
        record.set_field(&name, cell.text.clone());
    }

    if let Some(date_field) = schema.date_field {
        let parsed = record.field(date_field).and_then(|text| dates.parse(text));
        record.timestamp = parsed;
    }

    record
}

/// Bounded lookahead: a continuation row carries the body for the
/// closest preceding data row that does not have one yet.
fn attach_body(
    extraction: &mut TableExtraction,
    last_data_row: Option<usize>,
    schema: &TableSchema,
    row: &ElementRef<'_>,
) {
    let Some(body_field) = schema.sibling_bodies else {
        return;
    };
    let Some(index) = last_data_row else {
        return;
    };
    let Some(RowOutcome::Accepted(record)) = extraction.rows.get_mut(index) else {
        return;
    };
    if record.field(body_field).is_some() {
        return;
    }

    let body = Selector::parse("div")
        .ok()
        .and_then(|divs| row.select(&divs).next().map(|div| collapsed_text(div)))
        .unwrap_or_else(|| collapsed_text(*row));

    record.set_field(body_field, body);
}

fn cell_width(td: ElementRef<'_>) -> Option<String> {
    if let Some(width) = td.value().attr("width") {
        return Some(width.trim().to_string());
    }

    td.value().attr("style").and_then(|style| {
        style.split(';').find_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            (property.trim() == "width").then(|| value.trim().to_string())
        })
    })
}

/// Element text with runs of whitespace collapsed to single spaces.
fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_name(label: &str) -> String {
    label.trim().to_lowercase().replace(char::is_whitespace, "_")
}

/// Visible text of an arbitrary markup fragment.
#[must_use]
pub(crate) fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Visible text of a section slice with its leading marker label
/// stripped.
#[must_use]
pub(crate) fn labeled_text(html: &str, label: &str) -> String {
    let text = plain_text(html);
    text.strip_prefix(label).map_or_else(
        || text.clone(),
        |rest| rest.trim_start_matches([':', ' ']).to_string(),
    )
}
