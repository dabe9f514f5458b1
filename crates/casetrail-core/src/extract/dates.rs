use chrono::NaiveDateTime;

/// Timestamp layouts observed across export versions, tried in order.
///
/// Order is the only disambiguation for ambiguous numeric dates: text
/// like `01/02/2024, 10:00:00` parses with the first layout that fully
/// matches, so month-first wins over day-first. Locale detection is out
/// of scope.
pub const KNOWN_FORMATS: &[&str] = &[
    "%m/%d/%Y, %H:%M:%S",
    "%d/%m/%Y, %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%d/%m %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%A, %d %B %Y at %I:%M %p",
    "%A, %d %B %Y at %H:%M",
    "%d %B %Y %H:%M:%S",
];

/// Converts free-text timestamps into canonical time values.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    formats: Vec<&'static str>,
}

impl DateNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            formats: KNOWN_FORMATS.to_vec(),
        }
    }

    #[must_use]
    pub fn with_formats(formats: Vec<&'static str>) -> Self {
        Self { formats }
    }

    /// Result of the first fully matching layout; `None` when nothing
    /// matches. Never panics and never errors.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        self.formats
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
