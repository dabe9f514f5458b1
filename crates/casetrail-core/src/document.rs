use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched case export: an opaque identifier plus raw markup.
///
/// Immutable once constructed; the pipeline only ever borrows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub fetched_at: DateTime<Utc>,
}

impl Document {
    #[must_use]
    pub fn new(id: String, content: String) -> Self {
        Self {
            id,
            content,
            fetched_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
