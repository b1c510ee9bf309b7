//! Citation marker parsing and the expand/collapse toggle

use regex::Regex;
use std::sync::OnceLock;

use crate::types::Citation;

/// `[n]` with ASCII digits only
fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([0-9]+)\]").expect("Invalid regex"))
}

/// A `[n]` marker found in answer text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationRef {
    /// Parsed marker number; `None` when the digits overflow `u32`, so the
    /// marker never resolves to a citation
    pub number: Option<u32>,
    /// Marker exactly as it appeared, e.g. `[01]`
    pub raw: String,
}

/// Piece of a parsed answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, byte-for-byte
    Text(String),
    /// Citation marker
    Reference(CitationRef),
}

impl Segment {
    /// Text this segment was parsed from
    pub fn literal(&self) -> &str {
        match self {
            Segment::Text(text) => text,
            Segment::Reference(reference) => &reference.raw,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Segment::Reference(_))
    }

    /// Number of a resolvable marker
    pub fn reference_number(&self) -> Option<u32> {
        match self {
            Segment::Reference(reference) => reference.number,
            Segment::Text(_) => None,
        }
    }
}

/// Split an answer into literal text and citation references
///
/// Concatenating [`Segment::literal`] of the output gives back the input.
/// Every `[digits]` is a reference, including numbers too large for `u32`.
pub fn parse_answer(answer: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for cap in marker_pattern().captures_iter(answer) {
        let Some(whole) = cap.get(0) else { continue };
        let number = cap[1].parse::<u32>().ok();

        if whole.start() > cursor {
            segments.push(Segment::Text(answer[cursor..whole.start()].to_string()));
        }
        segments.push(Segment::Reference(CitationRef {
            number,
            raw: whole.as_str().to_string(),
        }));
        cursor = whole.end();
    }

    if cursor < answer.len() {
        segments.push(Segment::Text(answer[cursor..].to_string()));
    }

    segments
}

/// Find the citation a marker points at; `number` is the only join key
pub fn resolve(number: u32, citations: &[Citation]) -> Option<&Citation> {
    citations.iter().find(|c| c.number == number)
}

/// Which citation, if any, is expanded
///
/// One value is shared by the inline tags and the sources list, so at most
/// one citation is open at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: Option<u32>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State after clicking citation `number`
    pub fn toggled(self, number: u32) -> Self {
        if self.expanded == Some(number) {
            Self { expanded: None }
        } else {
            Self {
                expanded: Some(number),
            }
        }
    }

    pub fn expanded(&self) -> Option<u32> {
        self.expanded
    }

    pub fn is_expanded(&self, number: u32) -> bool {
        self.expanded == Some(number)
    }
}

/// Plain-text lines for the sources panel
pub fn source_lines(citations: &[Citation], state: ExpansionState) -> Vec<String> {
    let mut lines = Vec::new();

    for citation in citations {
        let open = state.is_expanded(citation.number);
        lines.push(format!(
            "{} [{}] {}",
            if open { "▾" } else { "▸" },
            citation.number,
            citation.title
        ));
        if open {
            lines.push(format!("    \"{}\"", citation.text));
            lines.push(format!(
                "    Source: {}  Score: {}",
                citation.source,
                citation.score_percent()
            ));
        }
    }

    lines
}
