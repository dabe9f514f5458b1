use std::collections::HashSet;

use crate::record::{fields, Record};

/// Which field subset participates in the dedup key.
///
/// Both policies occur in real exports: forwarded mails repeat a body
/// under fresh envelopes, while re-sent mails repeat the envelope too.
/// The choice is explicit, never incidental.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPolicy {
    /// Body text only.
    BodyOnly,
    /// Subject, sender, date, and body together.
    Envelope,
}

impl KeyPolicy {
    #[must_use]
    pub fn key_fields(self) -> &'static [&'static str] {
        match self {
            Self::BodyOnly => &[fields::BODY],
            Self::Envelope => &[fields::SUBJECT, fields::SENDER, fields::DATE, fields::BODY],
        }
    }
}

impl std::str::FromStr for KeyPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "body" => Ok(Self::BodyOnly),
            "envelope" => Ok(Self::Envelope),
            _ => Err(crate::Error::InvalidKeyPolicy(s.to_string())),
        }
    }
}

/// Suppresses repeated records within one pipeline run.
///
/// Constructed per run and passed along the call chain; the seen-set
/// never outlives the run and is never shared across documents.
#[derive(Debug)]
pub struct Deduplicator {
    key_fields: Vec<String>,
    seen: HashSet<String>,
    dropped: usize,
}

impl Deduplicator {
    #[must_use]
    pub fn new(policy: KeyPolicy) -> Self {
        Self::with_key_fields(policy.key_fields().iter().map(ToString::to_string).collect())
    }

    #[must_use]
    pub fn with_key_fields(key_fields: Vec<String>) -> Self {
        Self {
            key_fields,
            seen: HashSet::new(),
            dropped: 0,
        }
    }

    /// Records dropped as duplicates so far in this run.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Admit a record if its key has not been seen in this run. The
    /// first occurrence is stamped with its key material and hash and
    /// kept; later ones report `false`.
    pub fn admit(&mut self, record: &mut Record) -> bool {
        let material = self
            .key_fields
            .iter()
            .map(|field| record.field_or_empty(field))
            .collect::<Vec<_>>()
            .join("\u{1f}");
        let digest = content_hash(&material);

        if self.seen.insert(digest.clone()) {
            record.dedup_key = Some(material);
            record.content_hash = Some(digest);
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    /// Stable, single-pass filter: first occurrence wins, order is
    /// preserved.
    pub fn dedupe(&mut self, records: Vec<Record>) -> Vec<Record> {
        let kept: Vec<Record> = records
            .into_iter()
            .filter_map(|mut record| self.admit(&mut record).then_some(record))
            .collect();

        tracing::debug!(kept = kept.len(), dropped = self.dropped, "deduplicated stream");
        kept
    }
}

/// 16-hex digest over the key material.
#[must_use]
pub fn content_hash(content: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}
