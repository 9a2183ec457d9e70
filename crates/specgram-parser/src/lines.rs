//! Line scanning shared by the locator and the extractors.
//!
//! Every extractor works line by line over the raw document. [`scan`] splits
//! the text into [`Line`]s that remember their byte offsets and whether they
//! sit inside a fenced code block, and [`heading`] recognises ATX headings.

use winnow::{
    Parser as _,
    ascii::space1,
    combinator::{alt, eof, preceded},
    error::ModalResult,
    token::{rest, take_while},
};

use crate::span::Span;

/// One line of the document, without its line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line<'a> {
    /// Line content with `\n` and any trailing `\r` removed.
    pub text: &'a str,
    /// Byte offset of the first character of the line.
    pub start: usize,
    /// Byte offset one past the line terminator (or the document length).
    pub end: usize,
    /// `true` for fence delimiter lines and every line between them.
    pub in_fence: bool,
}

impl Line<'_> {
    /// Span of the visible line content.
    pub fn span(&self) -> Span {
        Span::new(self.start..self.start + self.text.len())
    }

    /// Returns `true` if the line is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Returns `true` if the line starts with whitespace.
    pub fn is_indented(&self) -> bool {
        self.text.starts_with([' ', '\t'])
    }
}

/// An ATX heading, e.g. `### User Story 1 - Browse (Priority: P1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Heading<'a> {
    pub level: usize,
    pub text: &'a str,
}

/// An open fence: the delimiter character and its run length.
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

/// Split a document into lines, tracking fenced code blocks.
///
/// Both backtick and tilde fences are recognised. A fence closes on a line
/// holding only a run of the same character at least as long as the opener.
pub(crate) fn scan(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut open_fence: Option<Fence> = None;
    let mut start = 0;

    for raw in text.split_inclusive('\n') {
        let end = start + raw.len();
        let content = raw.strip_suffix('\n').unwrap_or(raw);
        let content = content.strip_suffix('\r').unwrap_or(content);

        let delimiter = fence_delimiter(content);
        let in_fence = match (open_fence, delimiter) {
            (Some(open), Some(fence)) => {
                if fence.marker == open.marker
                    && fence.len >= open.len
                    && content.trim().len() == fence.len
                {
                    open_fence = None;
                }
                true
            }
            (Some(_), None) => true,
            (None, Some(fence)) => {
                open_fence = Some(fence);
                true
            }
            (None, None) => false,
        };

        lines.push(Line {
            text: content,
            start,
            end,
            in_fence,
        });
        start = end;
    }

    lines
}

/// Recognise a fence delimiter (three or more backticks or tildes).
fn fence_delimiter(line: &str) -> Option<Fence> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == marker).count();
    (len >= 3).then_some(Fence { marker, len })
}

/// Parse the `#`-run and the raw heading text.
fn atx_heading<'a>(input: &mut &'a str) -> ModalResult<(usize, &'a str)> {
    preceded(
        take_while(0..=3, ' '),
        (
            take_while(1..=6, '#'),
            alt((space1.void(), eof.void())),
            rest,
        ),
    )
    .map(|(hashes, (), text): (&str, (), &str)| (hashes.len(), text))
    .parse_next(input)
}

/// Recognise an ATX heading. Setext headings are not supported.
pub(crate) fn heading<'a>(line: &Line<'a>) -> Option<Heading<'a>> {
    if line.in_fence {
        return None;
    }
    let mut input = line.text;
    let (level, text) = atx_heading(&mut input).ok()?;
    Some(Heading {
        level,
        text: strip_closing_hashes(text.trim()),
    })
}

/// Remove an optional closing `#` sequence, e.g. `## Title ##`.
fn strip_closing_hashes(text: &str) -> &str {
    let without = text.trim_end_matches('#');
    if without.len() == text.len() {
        return text;
    }
    if without.is_empty() || without.ends_with([' ', '\t']) {
        without.trim_end()
    } else {
        text
    }
}
