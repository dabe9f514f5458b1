//! Section and table layouts of case exports.
//!
//! Exports carry no stable schema, so sections are bounded by marker
//! text that has survived every observed layout revision. Specs are
//! listed here in the order the sections appear in a document; the
//! forward-only cursor depends on that order.

use super::cursor::{Anchor, Cursor, Section};
use super::table::TableSchema;
use crate::record::{fields, Stream};

/// A named section bounded by a start anchor and an optional end anchor.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub name: &'static str,
    pub start: Anchor,
    pub end: Option<Anchor>,
}

impl SectionSpec {
    pub fn locate<'a>(&self, cursor: &mut Cursor<'a>) -> Option<Section<'a>> {
        cursor.locate(self.name, &self.start, self.end.as_ref())
    }
}

#[must_use]
pub fn case_number() -> SectionSpec {
    SectionSpec {
        name: "case-number",
        start: Anchor::Element {
            tag: "span",
            text: "Case Number",
        },
        end: Some(Anchor::Element {
            tag: "span",
            text: "Case Title",
        }),
    }
}

#[must_use]
pub fn case_title() -> SectionSpec {
    SectionSpec {
        name: "case-title",
        start: Anchor::Element {
            tag: "span",
            text: "Case Title",
        },
        end: Some(Anchor::Text("Description")),
    }
}

#[must_use]
pub fn description() -> SectionSpec {
    SectionSpec {
        name: "description",
        start: Anchor::Text("Description"),
        end: Some(Anchor::Text("Severity")),
    }
}

#[must_use]
pub fn reference() -> SectionSpec {
    SectionSpec {
        name: "reference",
        start: Anchor::Text("Bug Reference"),
        end: Some(Anchor::Text("Emails")),
    }
}

#[must_use]
pub fn emails() -> SectionSpec {
    SectionSpec {
        name: "emails",
        start: Anchor::Text("Emails"),
        end: Some(Anchor::Text("Open Activities")),
    }
}

#[must_use]
pub fn case_notes() -> SectionSpec {
    SectionSpec {
        name: "case-notes",
        start: Anchor::Text("Case Comments"),
        end: Some(Anchor::Text("Case Feed")),
    }
}

#[must_use]
pub fn comments() -> SectionSpec {
    SectionSpec {
        name: "comments",
        start: Anchor::Text("Case Feed"),
        end: Some(Anchor::Text("Related Articles")),
    }
}

/// Linked-report description, ahead of the notes log.
#[must_use]
pub fn linked_description() -> SectionSpec {
    SectionSpec {
        name: "linked-description",
        start: Anchor::Text("DESCRIPTION"),
        end: Some(Anchor::Text("NOTES")),
    }
}

/// Append-only notes log of a linked report.
#[must_use]
pub fn linked_notes() -> SectionSpec {
    SectionSpec {
        name: "linked-notes",
        start: Anchor::Text("NOTES"),
        end: Some(Anchor::Text("AUDIT TRAIL")),
    }
}

pub const EMAIL_WIDTHS: &[&str] = &["10%", "10%", "40%", "30%", "10%"];

pub const EMAIL_HEADER_LABELS: &[&str] =
    &["Email Name", "Status", "Subject", "From Address", "Message Date"];

pub const COMMENT_HEADER_LABELS: &[&str] = &["Comment", "Author", "Created Date"];

#[must_use]
pub fn email_table() -> TableSchema {
    TableSchema {
        stream: Stream::Email,
        columns: &[
            fields::NAME,
            fields::STATUS,
            fields::SUBJECT,
            fields::SENDER,
            fields::DATE,
        ],
        expected_cells: 5,
        width_signature: Some(EMAIL_WIDTHS),
        header_labels: Some(EMAIL_HEADER_LABELS),
        sibling_bodies: Some(fields::BODY),
        date_field: Some(fields::DATE),
    }
}

/// Three-column comment tables; the feed and the internal notes share
/// the shape and differ only in stream tag.
#[must_use]
pub fn comment_table(stream: Stream) -> TableSchema {
    TableSchema {
        stream,
        columns: &[fields::BODY, fields::SENDER, fields::DATE],
        expected_cells: 3,
        width_signature: None,
        header_labels: Some(COMMENT_HEADER_LABELS),
        sibling_bodies: None,
        date_field: Some(fields::DATE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_sections_locate_in_document_order() {
        let doc = "<span>Case Number</span><span>1</span>\
                   <span>Case Title</span><span>t</span>\
                   <b>Description</b> text <b>Severity</b> S3 \
                   <b>Bug Reference</b><table><tr><td>99</td></tr></table>\
                   <b>Emails</b><table></table> Open Activities \
                   Case Comments <table></table> Case Feed <table></table> Related Articles";
        let mut cursor = Cursor::new(doc);

        for spec in [
            case_number(),
            case_title(),
            description(),
            reference(),
            emails(),
            case_notes(),
            comments(),
        ] {
            assert!(spec.locate(&mut cursor).is_some(), "missing: {}", spec.name);
        }
    }

    #[test]
    fn test_email_table_shape() {
        let schema = email_table();

        assert_eq!(schema.expected_cells, schema.columns.len());
        assert_eq!(
            schema.width_signature.map(<[_]>::len),
            Some(schema.expected_cells)
        );
    }
}
