use std::cmp::Ordering;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::record::Record;

/// Elapsed-time annotation carried by each timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gap {
    /// First entry of the timeline.
    Initial,
    /// Business days between the previous entry's calendar date and
    /// this one's.
    BusinessDays(i64),
    /// This entry or its predecessor carries no parsed timestamp.
    Unknown,
}

impl std::fmt::Display for Gap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initial => f.write_str("initial"),
            Self::BusinessDays(days) => write!(f, "{days}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub record: Record,
    pub gap: Gap,
}

/// The merged, time-ordered view of one case's communication records.
/// The only artifact handed to a sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
}

impl Timeline {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimelineEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn undated(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.record.is_dated())
            .count()
    }
}

/// Merge record streams into one chronologically ordered, gap-annotated
/// timeline.
///
/// Undated records are never dropped: they sort after every dated
/// record, keeping their input order, and carry the `unknown` gap. The
/// sort is stable, so equal timestamps also keep input order.
#[must_use]
pub fn merge(streams: Vec<Vec<Record>>) -> Timeline {
    let mut records: Vec<Record> = streams.into_iter().flatten().collect();

    records.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let mut entries = Vec::with_capacity(records.len());
    let mut previous: Option<NaiveDateTime> = None;

    for (index, record) in records.into_iter().enumerate() {
        let gap = if index == 0 {
            Gap::Initial
        } else {
            match (previous, record.timestamp) {
                (Some(before), Some(after)) => {
                    Gap::BusinessDays(business_days_between(before.date(), after.date()))
                }
                _ => Gap::Unknown,
            }
        };

        previous = record.timestamp;
        entries.push(TimelineEntry { record, gap });
    }

    Timeline { entries }
}

/// Count of Monday through Friday days in `[start, end)`; negative when
/// the range is reversed. Holidays are not modeled.
#[must_use]
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    if end < start {
        return -business_days_between(end, start);
    }

    let total = (end - start).num_days();
    let weeks = total / 7;
    let mut count = weeks * 5;

    let mut day = start + Duration::days(weeks * 7);
    while day < end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        let Some(next) = day.succ_opt() else { break };
        day = next;
    }

    count
}
