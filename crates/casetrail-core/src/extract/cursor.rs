/// A section boundary marker.
///
/// Matching on marker text rather than fixed offsets tolerates layout
/// drift across export versions; the cost is a possible false match when
/// the marker text appears inside record content, which forward-only
/// scanning keeps bounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// Plain substring match.
    Text(&'static str),
    /// An opening tag whose inner text equals `text` exactly,
    /// e.g. `Element { tag: "span", text: "Case Number" }`.
    Element {
        tag: &'static str,
        text: &'static str,
    },
}

impl Anchor {
    /// Byte range `(start, end)` of the first match at or after `from`.
    fn find_in(&self, haystack: &str, from: usize) -> Option<(usize, usize)> {
        match self {
            Self::Text(needle) => haystack[from..]
                .find(needle)
                .map(|i| (from + i, from + i + needle.len())),
            Self::Element { tag, text } => find_element(haystack, from, tag, text),
        }
    }
}

/// Locate `<tag ...>text<` starting the search at `from`. Returns the
/// range from the opening `<` to the end of the inner text.
fn find_element(haystack: &str, from: usize, tag: &str, text: &str) -> Option<(usize, usize)> {
    let open = format!("<{tag}");
    let mut pos = from;

    while let Some(found) = haystack[pos..].find(&open) {
        let tag_start = pos + found;
        let after_name = tag_start + open.len();
        pos = after_name;

        // `<b` must not match `<br>` or `<body>`
        match haystack[after_name..].chars().next() {
            Some(c) if c == '>' || c.is_whitespace() => {}
            _ => continue,
        }

        let Some(gt) = haystack[after_name..].find('>') else {
            return None;
        };
        let content_start = after_name + gt + 1;
        let Some(lt) = haystack[content_start..].find('<') else {
            return None;
        };
        let content = haystack[content_start..content_start + lt].trim();

        if content == text {
            return Some((tag_start, content_start + lt));
        }
    }

    None
}

/// A named, bounded slice of one document. Transient: produced during a
/// pipeline run and discarded once records are extracted.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub name: &'static str,
    pub body: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Forward-only scanner over one document's content.
///
/// Every `locate` starts at the position the previous one ended, so
/// sections come out in document order and never overlap or re-match
/// earlier content.
#[derive(Debug)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Find the section bounded by `start` and `end` at or after the
    /// current position.
    ///
    /// A missing start marker yields `None` without moving the cursor;
    /// callers treat that as an empty record stream. A missing end
    /// marker extends the slice to the end of the document, which
    /// tolerates truncated or unterminated exports.
    pub fn locate(
        &mut self,
        name: &'static str,
        start: &Anchor,
        end: Option<&Anchor>,
    ) -> Option<Section<'a>> {
        let (section_start, marker_end) = start.find_in(self.text, self.pos)?;

        let section_end = end
            .and_then(|anchor| anchor.find_in(self.text, marker_end))
            .map_or(self.text.len(), |(s, _)| s);

        self.pos = section_end;

        Some(Section {
            name,
            body: &self.text[section_start..section_end],
            start: section_start,
            end: section_end,
        })
    }
}
