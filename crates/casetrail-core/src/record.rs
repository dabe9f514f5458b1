use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Well-known record field names.
pub mod fields {
    pub const NAME: &str = "name";
    pub const STATUS: &str = "status";
    pub const SUBJECT: &str = "subject";
    pub const SENDER: &str = "sender";
    pub const DATE: &str = "date";
    pub const BODY: &str = "body";
    pub const REFERENCE: &str = "reference";
}

/// Which communication stream a record was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stream {
    Case,
    Email,
    Comment,
    CaseNote,
    LinkedNote,
}

impl Stream {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Case => "case",
            Self::Email => "email",
            Self::Comment => "comment",
            Self::CaseNote => "case-note",
            Self::LinkedNote => "linked-note",
        }
    }
}

impl std::fmt::Display for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stream {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "case" => Ok(Self::Case),
            "email" => Ok(Self::Email),
            "comment" => Ok(Self::Comment),
            "case-note" => Ok(Self::CaseNote),
            "linked-note" => Ok(Self::LinkedNote),
            _ => Err(crate::Error::InvalidStream(s.to_string())),
        }
    }
}

/// One extracted communication record: a field map tagged with its
/// source stream, dedup key material once deduplicated, and the parsed
/// timestamp (`None` means no known date pattern matched).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub stream: Stream,
    pub fields: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<NaiveDateTime>,
}

impl Record {
    #[must_use]
    pub fn new(stream: Stream) -> Self {
        Self {
            stream,
            fields: BTreeMap::new(),
            dedup_key: None,
            content_hash: None,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_string(), value.into());
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn field_or_empty(&self, name: &str) -> &str {
        self.field(name).unwrap_or("")
    }

    #[must_use]
    pub fn is_dated(&self) -> bool {
        self.timestamp.is_some()
    }
}
